pub mod postgres;
pub mod rows;

use crate::analytics::timeline::TimelineInputs;
use crate::domain::fixtures::SampleDataset;
use crate::domain::records::{AiLearningRecord, CompletedTrade, TradingHistoryRecord};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use postgres::PgStore;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub trades: u64,
    pub history: u64,
    pub ai_records: u64,
}

/// Read access to the hosted trading tables.
///
/// Implementations fetch rows only; every derived number is computed by
/// [`crate::analytics`] from what these return.
#[async_trait::async_trait]
pub trait TradeStore: Send + Sync {
    /// Completed trades, newest exit first, optionally only those exited at or after `since`.
    async fn completed_trades(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<CompletedTrade>>;

    /// Most recent completed trade for `symbol`, if any.
    async fn latest_completed_trade(&self, symbol: &str) -> anyhow::Result<Option<CompletedTrade>>;

    /// History rows in ascending timestamp order.
    async fn trading_history(
        &self,
        symbol: Option<&str>,
    ) -> anyhow::Result<Vec<TradingHistoryRecord>>;

    /// AI learning rows in ascending analysis date order.
    async fn ai_learning_records(
        &self,
        symbol: Option<&str>,
    ) -> anyhow::Result<Vec<AiLearningRecord>>;

    async fn insert_sample_dataset(&self, data: &SampleDataset) -> anyhow::Result<SeedSummary>;
}

/// All three tables, fetched together.
#[derive(Debug, Clone, Default)]
pub struct TradingData {
    pub trades: Vec<CompletedTrade>,
    pub history: Vec<TradingHistoryRecord>,
    pub ai_records: Vec<AiLearningRecord>,
}

/// Fetches every table concurrently; any single failure fails the whole load.
pub async fn load_trading_data(store: &dyn TradeStore) -> anyhow::Result<TradingData> {
    let (trades, history, ai_records) = tokio::try_join!(
        store.completed_trades(None),
        store.trading_history(None),
        store.ai_learning_records(None),
    )?;

    tracing::debug!(
        trades = trades.len(),
        history = history.len(),
        ai_records = ai_records.len(),
        "loaded trading data"
    );

    Ok(TradingData {
        trades,
        history,
        ai_records,
    })
}

/// Fetches the rows one symbol's timeline is built from.
pub async fn load_timeline_inputs(
    store: &dyn TradeStore,
    symbol: &str,
) -> anyhow::Result<TimelineInputs> {
    let (history, ai_records, completed) = tokio::try_join!(
        store.trading_history(Some(symbol)),
        store.ai_learning_records(Some(symbol)),
        store.latest_completed_trade(symbol),
    )?;

    Ok(TimelineInputs {
        history,
        ai_records,
        completed,
    })
}
