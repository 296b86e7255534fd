use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradeboard_core::analytics::export::{ExportDataset, ExportFilter, ExportFormat};
use tradeboard_core::storage::{PgStore, TradeStore};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tradeboard_cli")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Insert the demo dataset into the database.
    Seed {
        /// Build the dataset and report its size without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print trade metrics and the daily P&L series as JSON.
    Metrics {
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Print the reconstructed timeline of one symbol as JSON.
    Timeline { symbol: String },

    /// Export a dataset (trades, history, ai-learning) to a file or stdout.
    Export {
        dataset: ExportDataset,

        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Output path. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        symbol: Option<String>,

        /// Inclusive lower date bound (YYYY-MM-DD).
        #[arg(long)]
        date_from: Option<NaiveDate>,

        /// Inclusive upper date bound (YYYY-MM-DD).
        #[arg(long)]
        date_to: Option<NaiveDate>,

        /// Minimum average indicator accuracy, in percent.
        #[arg(long)]
        min_accuracy: Option<f64>,

        #[arg(long)]
        market_regime: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tradeboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Command::Seed { dry_run: true } = args.command {
        let data = tradeboard_core::domain::fixtures::sample_dataset(Utc::now());
        tracing::info!(
            dry_run = true,
            trades = data.trades.len(),
            history = data.history.len(),
            ai_records = data.ai_records.len(),
            "sample dataset built"
        );
        return Ok(());
    }

    let pool = settings.connect_pool().await?;
    tradeboard_core::storage::migrate(&pool).await?;
    let store = PgStore::new(pool);

    let result = run(&store, args.command).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = ?err, "command failed");
    }
    result
}

async fn run(store: &dyn TradeStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Seed { .. } => {
            let summary = commands::seed(store, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Metrics { days } => {
            let report = commands::metrics(store, days, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Timeline { symbol } => {
            let timeline = commands::timeline(store, &symbol, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        }
        Command::Export {
            dataset,
            format,
            out,
            symbol,
            date_from,
            date_to,
            min_accuracy,
            market_regime,
        } => {
            let filter = ExportFilter {
                symbol,
                date_from,
                date_to,
                min_accuracy,
                market_regime,
            };
            let file = commands::export(store, dataset, &filter, format, Utc::now()).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &file.body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(
                        path = %path.display(),
                        records = file.record_count,
                        "export written"
                    );
                }
                None => print!("{}", file.body),
            }
        }
    }
    Ok(())
}

fn init_sentry(settings: &tradeboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
