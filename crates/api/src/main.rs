use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradeboard_core::config::Settings;
use tradeboard_core::storage::{PgStore, TradeStore};

mod error;
mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let store = match connect_store(&settings).await {
        Ok(store) => Some(store),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "database setup failed; starting API in degraded mode");
            None
        }
    };

    let state = AppState { store };
    let app = router(state).layer(cors_layer(&settings)?);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Option<Arc<dyn TradeStore>>,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/daily-pnl", get(handlers::get_daily_pnl))
        .route("/api/trade-metrics", get(handlers::get_trade_metrics))
        .route("/api/recent-trades", get(handlers::get_recent_trades))
        .route("/api/verify-data", get(handlers::get_verify_data))
        .route("/api/seed", post(handlers::post_seed))
        .route("/api/timeline/:symbol", get(handlers::get_timeline))
        .route("/api/ai-accuracy", get(handlers::get_ai_accuracy))
        .route("/api/export/:dataset", get(handlers::get_export))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn connect_store(settings: &Settings) -> anyhow::Result<Arc<dyn TradeStore>> {
    let pool = settings.connect_pool().await?;
    tradeboard_core::storage::migrate(&pool).await?;
    Ok(Arc::new(PgStore::new(pool)))
}

fn cors_layer(settings: &Settings) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    Ok(match settings.cors_allow_origin.as_deref() {
        Some(origin) => layer.allow_origin(HeaderValue::from_str(origin)?),
        None => layer.allow_origin(Any),
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
