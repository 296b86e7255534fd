use crate::domain::fixtures::SampleDataset;
use crate::domain::records::{AiLearningRecord, CompletedTrade, TradingHistoryRecord};
use crate::storage::rows::{
    AiLearningRow, CompletedTradeRow, TradingHistoryRow, AI_LEARNING_COLUMNS,
    COMPLETED_TRADE_COLUMNS, TRADING_HISTORY_COLUMNS,
};
use crate::storage::{SeedSummary, TradeStore};
use anyhow::Context;
use chrono::{DateTime, Utc};

/// [`TradeStore`] over the hosted Postgres database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl TradeStore for PgStore {
    async fn completed_trades(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<CompletedTrade>> {
        let rows = sqlx::query_as::<_, CompletedTradeRow>(&format!(
            "SELECT {COMPLETED_TRADE_COLUMNS} \
             FROM completed_trades \
             WHERE ($1::timestamptz IS NULL OR exit_date >= $1) \
             ORDER BY exit_date DESC"
        ))
        .persistent(false)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .context("select completed_trades failed")?;

        Ok(rows.into_iter().map(CompletedTrade::from).collect())
    }

    async fn latest_completed_trade(&self, symbol: &str) -> anyhow::Result<Option<CompletedTrade>> {
        let row = sqlx::query_as::<_, CompletedTradeRow>(&format!(
            "SELECT {COMPLETED_TRADE_COLUMNS} \
             FROM completed_trades \
             WHERE symbol = $1 \
             ORDER BY exit_date DESC \
             LIMIT 1"
        ))
        .persistent(false)
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select latest completed_trades row failed (symbol={symbol})"))?;

        Ok(row.map(CompletedTrade::from))
    }

    async fn trading_history(
        &self,
        symbol: Option<&str>,
    ) -> anyhow::Result<Vec<TradingHistoryRecord>> {
        let rows = sqlx::query_as::<_, TradingHistoryRow>(&format!(
            "SELECT {TRADING_HISTORY_COLUMNS} \
             FROM trading_history \
             WHERE ($1::text IS NULL OR symbol = $1) \
             ORDER BY timestamp ASC"
        ))
        .persistent(false)
        .bind(symbol)
        .fetch_all(&self.pool)
        .await
        .context("select trading_history failed")?;

        Ok(rows.into_iter().map(TradingHistoryRecord::from).collect())
    }

    async fn ai_learning_records(
        &self,
        symbol: Option<&str>,
    ) -> anyhow::Result<Vec<AiLearningRecord>> {
        let rows = sqlx::query_as::<_, AiLearningRow>(&format!(
            "SELECT {AI_LEARNING_COLUMNS} \
             FROM ai_learning_data \
             WHERE ($1::text IS NULL OR symbol = $1) \
             ORDER BY analysis_date ASC"
        ))
        .persistent(false)
        .bind(symbol)
        .fetch_all(&self.pool)
        .await
        .context("select ai_learning_data failed")?;

        Ok(rows.into_iter().map(AiLearningRecord::from).collect())
    }

    async fn insert_sample_dataset(&self, data: &SampleDataset) -> anyhow::Result<SeedSummary> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;
        let mut summary = SeedSummary::default();

        for trade in &data.trades {
            summary.trades += insert_trade(&mut tx, trade).await?;
        }
        for record in &data.history {
            summary.history += insert_history(&mut tx, record).await?;
        }
        for record in &data.ai_records {
            summary.ai_records += insert_ai_record(&mut tx, record).await?;
        }

        tx.commit().await.context("commit transaction failed")?;
        tracing::info!(
            trades = summary.trades,
            history = summary.history,
            ai_records = summary.ai_records,
            "inserted sample dataset"
        );
        Ok(summary)
    }
}

async fn insert_trade(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trade: &CompletedTrade,
) -> anyhow::Result<u64> {
    let res = sqlx::query(&format!(
        "INSERT INTO completed_trades ({COMPLETED_TRADE_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
    ))
    .persistent(false)
    .bind(trade.id)
    .bind(&trade.symbol)
    .bind(trade.entry_price)
    .bind(trade.exit_price)
    .bind(trade.quantity)
    .bind(trade.realized_pnl)
    .bind(trade.profit_percentage)
    .bind(trade.win_loss.as_str())
    .bind(trade.entry_date)
    .bind(trade.exit_date)
    .bind(&trade.rsi_signal)
    .bind(&trade.macd_signal)
    .bind(trade.sentiment_score)
    .bind(trade.vix_level)
    .bind(trade.ai_confidence)
    .bind(&trade.market_regime)
    .execute(&mut **tx)
    .await
    .context("insert completed_trades failed")?;

    Ok(res.rows_affected())
}

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    record: &TradingHistoryRecord,
) -> anyhow::Result<u64> {
    let res = sqlx::query(&format!(
        "INSERT INTO trading_history ({TRADING_HISTORY_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
    ))
    .persistent(false)
    .bind(record.id)
    .bind(&record.symbol)
    .bind(record.action.as_str())
    .bind(record.timestamp)
    .bind(record.ai_confidence)
    .bind(record.technical_confidence)
    .bind(record.position_size)
    .bind(record.current_price)
    .bind(record.entry_price)
    .bind(record.unrealized_pnl)
    .bind(&record.ai_recommendation)
    .bind(&record.technical_recommendation)
    .bind(record.sentiment_score)
    .bind(&record.rsi_signal)
    .bind(&record.macd_signal)
    .bind(record.vix_level)
    .bind(record.composite_score)
    .bind(&record.market_regime)
    .execute(&mut **tx)
    .await
    .context("insert trading_history failed")?;

    Ok(res.rows_affected())
}

async fn insert_ai_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    record: &AiLearningRecord,
) -> anyhow::Result<u64> {
    let res = sqlx::query(&format!(
        "INSERT INTO ai_learning_data ({AI_LEARNING_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
    ))
    .persistent(false)
    .bind(record.id)
    .bind(&record.symbol)
    .bind(record.analysis_date)
    .bind(record.actual_outcome)
    .bind(record.rsi_accuracy)
    .bind(record.macd_accuracy)
    .bind(record.sentiment_accuracy)
    .bind(record.volume_accuracy)
    .bind(&record.market_regime)
    .bind(record.vix_level)
    .bind(record.ai_confidence)
    .bind(record.prediction_confidence)
    .bind(&record.predicted_direction)
    .execute(&mut **tx)
    .await
    .context("insert ai_learning_data failed")?;

    Ok(res.rows_affected())
}
