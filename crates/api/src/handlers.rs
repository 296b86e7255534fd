use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use tradeboard_core::analytics::accuracy::{summarize_accuracy, AccuracySummary};
use tradeboard_core::analytics::daily_pnl::{bucket_daily_pnl, DailyPnlPoint};
use tradeboard_core::analytics::export::{
    export_records, ExportDataset, ExportFilter, ExportFormat, ExportRecord, ExportedFile,
};
use tradeboard_core::analytics::metrics::{compute_metrics, TradeMetrics};
use tradeboard_core::analytics::recent::{recent_trades, resolve_limit, RecentTrade};
use tradeboard_core::analytics::timeline::{reconstruct_timeline, TradeTimeline};
use tradeboard_core::analytics::verify::{verify_data, VerificationReport};
use tradeboard_core::domain::fixtures::sample_dataset;
use tradeboard_core::domain::records::{AiLearningRecord, CompletedTrade, TradingHistoryRecord};
use tradeboard_core::storage::{load_timeline_inputs, load_trading_data, SeedSummary, TradeStore};
use tradeboard_core::time::window::{resolve_window_days, DEFAULT_WINDOW_DAYS};

fn store(state: &AppState) -> Result<&dyn TradeStore, ApiError> {
    state.store.as_deref().ok_or(ApiError::Unavailable)
}

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

/// Filter fields are spelled out rather than flattened so numeric values
/// survive query-string decoding.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    format: Option<ExportFormat>,
    symbol: Option<String>,
    #[serde(alias = "dateFrom")]
    date_from: Option<NaiveDate>,
    #[serde(alias = "dateTo")]
    date_to: Option<NaiveDate>,
    #[serde(alias = "minAccuracy")]
    min_accuracy: Option<f64>,
    #[serde(alias = "marketRegime")]
    market_regime: Option<String>,
}

impl ExportQuery {
    fn filter(&self) -> ExportFilter {
        ExportFilter {
            symbol: self.symbol.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
            min_accuracy: self.min_accuracy,
            market_regime: self.market_regime.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    trades: Vec<CompletedTrade>,
    history: Vec<TradingHistoryRecord>,
    ai_data: Vec<AiLearningRecord>,
    metrics: TradeMetrics,
    symbols: Vec<String>,
    daily_pnl: Vec<DailyPnlPoint>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    success: bool,
    inserted: SeedSummary,
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// # GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let data = load_trading_data(store(&state)?).await?;
    let today = Utc::now().date_naive();

    let symbols: BTreeSet<&str> = data
        .trades
        .iter()
        .map(|t| t.symbol.as_str())
        .chain(data.history.iter().map(|h| h.symbol.as_str()))
        .collect();
    let symbols = symbols.into_iter().map(str::to_string).collect();

    let metrics = compute_metrics(&data.trades);
    let daily_pnl = bucket_daily_pnl(&data.trades, DEFAULT_WINDOW_DAYS, today);

    Ok(Json(DashboardResponse {
        trades: data.trades,
        history: data.history,
        ai_data: data.ai_records,
        metrics,
        symbols,
        daily_pnl,
    }))
}

/// # GET /api/daily-pnl?days=30
pub async fn get_daily_pnl(
    State(state): State<AppState>,
    query: Result<Query<DaysQuery>, QueryRejection>,
) -> Result<Json<Vec<DailyPnlPoint>>, ApiError> {
    let Query(query) = query?;
    let days = resolve_window_days(query.days);
    let today = Utc::now().date_naive();
    let since = (today - Duration::days(days as i64))
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc());

    let trades = store(&state)?.completed_trades(since).await?;
    tracing::debug!(days, trades = trades.len(), "bucketing daily pnl");

    Ok(Json(bucket_daily_pnl(&trades, days, today)))
}

/// # GET /api/trade-metrics
pub async fn get_trade_metrics(
    State(state): State<AppState>,
) -> Result<Json<TradeMetrics>, ApiError> {
    let trades = store(&state)?.completed_trades(None).await?;
    Ok(Json(compute_metrics(&trades)))
}

/// # GET /api/recent-trades?limit=10
pub async fn get_recent_trades(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<RecentTrade>>, ApiError> {
    let Query(query) = query?;
    let store = store(&state)?;
    let (trades, history) =
        tokio::try_join!(store.completed_trades(None), store.trading_history(None))?;

    Ok(Json(recent_trades(
        &trades,
        &history,
        resolve_limit(query.limit),
    )))
}

/// # GET /api/verify-data
pub async fn get_verify_data(
    State(state): State<AppState>,
) -> Result<Json<VerificationReport>, ApiError> {
    let data = load_trading_data(store(&state)?).await?;
    let report = verify_data(&data.trades, &data.history, &data.ai_records);

    if !report.duplicate_symbols.is_empty() || !report.inconsistent_outcomes.is_empty() {
        tracing::warn!(
            duplicate_symbols = report.duplicate_symbols.len(),
            inconsistent_outcomes = report.inconsistent_outcomes.len(),
            "data verification found anomalies"
        );
    }

    Ok(Json(report))
}

/// # POST /api/seed
/// Inserts the fixed demo dataset.
pub async fn post_seed(State(state): State<AppState>) -> Result<Json<SeedResponse>, ApiError> {
    let data = sample_dataset(Utc::now());
    let inserted = store(&state)?.insert_sample_dataset(&data).await?;
    Ok(Json(SeedResponse {
        success: true,
        inserted,
    }))
}

/// # GET /api/timeline/:symbol
/// Responds with `null` when the symbol has neither history nor a completed trade.
pub async fn get_timeline(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
) -> Result<Json<Option<TradeTimeline>>, ApiError> {
    let Path(symbol) = symbol?;
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::InvalidRequest("symbol must be non-empty".to_string()));
    }

    let inputs = load_timeline_inputs(store(&state)?, &symbol).await?;
    Ok(Json(reconstruct_timeline(&symbol, inputs, Utc::now())))
}

/// # GET /api/ai-accuracy
pub async fn get_ai_accuracy(
    State(state): State<AppState>,
) -> Result<Json<AccuracySummary>, ApiError> {
    let records = store(&state)?.ai_learning_records(None).await?;
    Ok(Json(summarize_accuracy(&records)))
}

/// # GET /api/export/:dataset?format=csv
pub async fn get_export(
    State(state): State<AppState>,
    dataset: Result<Path<String>, PathRejection>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path(dataset) = dataset?;
    let Query(query) = query?;
    let dataset: ExportDataset = dataset
        .parse()
        .map_err(|e: anyhow::Error| ApiError::InvalidRequest(e.to_string()))?;
    let store = store(&state)?;
    let filter = query.filter();
    let format = query.format.unwrap_or_default();

    let file = match dataset {
        ExportDataset::Trades => render(&store.completed_trades(None).await?, &filter, format)?,
        ExportDataset::History => render(&store.trading_history(None).await?, &filter, format)?,
        ExportDataset::AiLearning => {
            render(&store.ai_learning_records(None).await?, &filter, format)?
        }
    };

    tracing::info!(
        file_name = %file.file_name,
        records = file.record_count,
        "export generated"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.body,
    )
        .into_response())
}

fn render<R: ExportRecord>(
    records: &[R],
    filter: &ExportFilter,
    format: ExportFormat,
) -> anyhow::Result<ExportedFile> {
    export_records(records, filter, format, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tradeboard_core::domain::fixtures::SampleDataset;
    use tradeboard_core::storage::TradingData;

    #[derive(Default)]
    struct MemoryStore {
        data: TradingData,
        fail_history: bool,
        seeded: Mutex<Vec<usize>>,
    }

    #[async_trait::async_trait]
    impl TradeStore for MemoryStore {
        async fn completed_trades(
            &self,
            since: Option<chrono::DateTime<Utc>>,
        ) -> anyhow::Result<Vec<CompletedTrade>> {
            Ok(self
                .data
                .trades
                .iter()
                .filter(|t| since.map_or(true, |s| t.exit_date >= s))
                .cloned()
                .collect())
        }

        async fn latest_completed_trade(
            &self,
            symbol: &str,
        ) -> anyhow::Result<Option<CompletedTrade>> {
            Ok(self
                .data
                .trades
                .iter()
                .filter(|t| t.symbol == symbol)
                .max_by_key(|t| t.exit_date)
                .cloned())
        }

        async fn trading_history(
            &self,
            symbol: Option<&str>,
        ) -> anyhow::Result<Vec<TradingHistoryRecord>> {
            anyhow::ensure!(!self.fail_history, "select trading_history failed");
            Ok(self
                .data
                .history
                .iter()
                .filter(|h| symbol.map_or(true, |s| h.symbol == s))
                .cloned()
                .collect())
        }

        async fn ai_learning_records(
            &self,
            symbol: Option<&str>,
        ) -> anyhow::Result<Vec<AiLearningRecord>> {
            Ok(self
                .data
                .ai_records
                .iter()
                .filter(|r| symbol.map_or(true, |s| r.symbol == s))
                .cloned()
                .collect())
        }

        async fn insert_sample_dataset(&self, data: &SampleDataset) -> anyhow::Result<SeedSummary> {
            self.seeded.lock().unwrap().push(data.trades.len());
            Ok(SeedSummary {
                trades: data.trades.len() as u64,
                history: data.history.len() as u64,
                ai_records: data.ai_records.len() as u64,
            })
        }
    }

    fn state_with(store: MemoryStore) -> AppState {
        AppState {
            store: Some(Arc::new(store)),
        }
    }

    fn seeded_state() -> AppState {
        let sample = sample_dataset(Utc::now());
        state_with(MemoryStore {
            data: TradingData {
                trades: sample.trades,
                history: sample.history,
                ai_records: sample.ai_records,
            },
            ..Default::default()
        })
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn dashboard_combines_all_tables() {
        let Json(body) = get_dashboard(State(seeded_state())).await.unwrap();
        assert_eq!(body.metrics.total_trades, 4);
        assert_eq!(body.symbols, vec!["AAPL", "MSFT", "NVDA", "TSLA"]);
        assert_eq!(body.daily_pnl.len(), 31);
        assert_eq!(
            body.daily_pnl.last().unwrap().cumulative_pnl,
            body.metrics.total_pnl
        );
    }

    #[tokio::test]
    async fn any_failed_fetch_fails_the_request() {
        let state = state_with(MemoryStore {
            fail_history: true,
            ..Default::default()
        });
        let err = get_dashboard(State(state)).await.unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "select trading_history failed");
    }

    #[tokio::test]
    async fn degraded_mode_returns_error_body() {
        let state = AppState { store: None };
        let err = get_trade_metrics(State(state)).await.unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "database unavailable");
    }

    #[tokio::test]
    async fn empty_tables_give_zero_metrics() {
        let state = state_with(MemoryStore::default());
        let Json(metrics) = get_trade_metrics(State(state)).await.unwrap();
        assert_eq!(metrics, TradeMetrics::default());
    }

    #[tokio::test]
    async fn daily_pnl_defaults_to_thirty_days() {
        let Json(points) = get_daily_pnl(State(seeded_state()), Ok(Query(DaysQuery { days: None })))
            .await
            .unwrap();
        assert_eq!(points.len(), 31);
        assert_eq!(points.last().unwrap().date, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn recent_trades_are_newest_first() {
        let Json(rows) = get_recent_trades(
            State(seeded_state()),
            Ok(Query(LimitQuery { limit: Some(2) })),
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].date >= rows[1].date);
        assert_eq!(rows[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn timeline_for_unknown_symbol_is_null() {
        let Json(timeline) =
            get_timeline(State(seeded_state()), Ok(Path("zzzz".to_string()))).await.unwrap();
        assert!(timeline.is_none());
    }

    #[tokio::test]
    async fn timeline_upper_cases_symbol() {
        let Json(timeline) =
            get_timeline(State(seeded_state()), Ok(Path("msft".to_string()))).await.unwrap();
        let timeline = timeline.unwrap();
        assert_eq!(timeline.symbol, "MSFT");
        let v = serde_json::to_value(&timeline.summary).unwrap();
        assert_eq!(v["status"], "active");
    }

    #[tokio::test]
    async fn seed_reports_inserted_counts() {
        let Json(resp) = post_seed(State(state_with(MemoryStore::default()))).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.inserted.trades, 4);
    }

    #[tokio::test]
    async fn export_sets_download_headers() {
        let resp = get_export(
            State(seeded_state()),
            Ok(Path("ai-learning".to_string())),
            Ok(Query(ExportQuery {
                symbol: Some("aapl".to_string()),
                ..Default::default()
            })),
        )
        .await
        .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("ai_learning_data_"));

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        // Header plus the two AAPL analyses.
        assert_eq!(body.lines().count(), 3);
    }

    #[tokio::test]
    async fn export_of_empty_table_is_an_error() {
        let err = get_export(
            State(state_with(MemoryStore::default())),
            Ok(Path("trades".to_string())),
            Ok(Query(ExportQuery::default())),
        )
        .await
        .unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "no records to export");
    }

    #[tokio::test]
    async fn unknown_dataset_is_a_json_error() {
        let err = get_export(
            State(seeded_state()),
            Ok(Path("positions".to_string())),
            Ok(Query(ExportQuery::default())),
        )
        .await
        .unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "unknown export dataset: positions");
    }

    fn query_from<T: serde::de::DeserializeOwned>(
        uri: &str,
    ) -> Result<Query<T>, QueryRejection> {
        Query::try_from_uri(&uri.parse().unwrap())
    }

    #[tokio::test]
    async fn malformed_days_is_a_json_error() {
        let query = query_from::<DaysQuery>("/api/daily-pnl?days=abc");
        assert!(query.is_err());

        let err = get_daily_pnl(State(seeded_state()), query).await.unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Failed to deserialize query string"));
    }

    #[tokio::test]
    async fn malformed_limit_is_a_json_error() {
        let query = query_from::<LimitQuery>("/api/recent-trades?limit=x");
        let err = get_recent_trades(State(seeded_state()), query)
            .await
            .unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_export_params_are_json_errors() {
        for uri in [
            "/api/export/trades?format=xml",
            "/api/export/trades?minAccuracy=foo",
        ] {
            let query = query_from::<ExportQuery>(uri);
            let err = get_export(
                State(seeded_state()),
                Ok(Path("trades".to_string())),
                query,
            )
            .await
            .unwrap_err();
            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert!(body_json(resp).await["error"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn camel_case_export_params_are_accepted() {
        let query = query_from::<ExportQuery>(
            "/api/export/ai-learning?minAccuracy=50&dateFrom=2000-01-01&format=json",
        );
        let resp = get_export(
            State(seeded_state()),
            Ok(Path("ai-learning".to_string())),
            query,
        )
        .await
        .unwrap();
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    }
}
