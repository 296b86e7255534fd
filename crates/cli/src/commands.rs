use chrono::{DateTime, Utc};
use serde::Serialize;

use tradeboard_core::analytics::daily_pnl::{bucket_daily_pnl, DailyPnlPoint};
use tradeboard_core::analytics::export::{
    export_records, ExportDataset, ExportFilter, ExportFormat, ExportedFile,
};
use tradeboard_core::analytics::metrics::{compute_metrics, TradeMetrics};
use tradeboard_core::analytics::timeline::{reconstruct_timeline, TradeTimeline};
use tradeboard_core::domain::fixtures::sample_dataset;
use tradeboard_core::storage::{load_timeline_inputs, SeedSummary, TradeStore};
use tradeboard_core::time::window::resolve_window_days;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub metrics: TradeMetrics,
    pub daily_pnl: Vec<DailyPnlPoint>,
}

pub async fn seed(store: &dyn TradeStore, now: DateTime<Utc>) -> anyhow::Result<SeedSummary> {
    store.insert_sample_dataset(&sample_dataset(now)).await
}

pub async fn metrics(
    store: &dyn TradeStore,
    days: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<MetricsReport> {
    let days = resolve_window_days(Some(days));
    let trades = store.completed_trades(None).await?;

    Ok(MetricsReport {
        metrics: compute_metrics(&trades),
        daily_pnl: bucket_daily_pnl(&trades, days, now.date_naive()),
    })
}

pub async fn timeline(
    store: &dyn TradeStore,
    symbol: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<TradeTimeline>> {
    let symbol = symbol.trim().to_ascii_uppercase();
    anyhow::ensure!(!symbol.is_empty(), "symbol must be non-empty");

    let inputs = load_timeline_inputs(store, &symbol).await?;
    let timeline = reconstruct_timeline(&symbol, inputs, now);
    if timeline.is_none() {
        tracing::warn!(%symbol, "no trading activity for symbol");
    }
    Ok(timeline)
}

pub async fn export(
    store: &dyn TradeStore,
    dataset: ExportDataset,
    filter: &ExportFilter,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> anyhow::Result<ExportedFile> {
    match dataset {
        ExportDataset::Trades => {
            export_records(&store.completed_trades(None).await?, filter, format, now)
        }
        ExportDataset::History => {
            export_records(&store.trading_history(None).await?, filter, format, now)
        }
        ExportDataset::AiLearning => {
            export_records(&store.ai_learning_records(None).await?, filter, format, now)
        }
    }
}
