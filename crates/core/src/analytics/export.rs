use crate::analytics::round2;
use crate::domain::records::{AiLearningRecord, CompletedTrade, TradingHistoryRecord};
use crate::time::window::utc_date;
use anyhow::{ensure, Context};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unsupported export format: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDataset {
    Trades,
    History,
    AiLearning,
}

impl FromStr for ExportDataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "trades" | "completed-trades" => Ok(Self::Trades),
            "history" | "trading-history" => Ok(Self::History),
            "ai-learning" | "ai-learning-data" => Ok(Self::AiLearning),
            other => anyhow::bail!("unknown export dataset: {other}"),
        }
    }
}

/// Optional predicates applied conjunctively before serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportFilter {
    /// Case-insensitive substring of the symbol.
    pub symbol: Option<String>,
    #[serde(alias = "dateFrom")]
    pub date_from: Option<NaiveDate>,
    #[serde(alias = "dateTo")]
    pub date_to: Option<NaiveDate>,
    /// Minimum average indicator accuracy, in percentage points.
    #[serde(alias = "minAccuracy")]
    pub min_accuracy: Option<f64>,
    #[serde(alias = "marketRegime")]
    pub market_regime: Option<String>,
}

impl ExportFilter {
    pub fn matches<R: ExportRecord>(&self, record: &R) -> bool {
        if let Some(needle) = self.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let haystack = record.symbol().to_ascii_lowercase();
            if !haystack.contains(&needle.to_ascii_lowercase()) {
                return false;
            }
        }

        let date = utc_date(record.export_date());
        if self.date_from.is_some_and(|from| date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| date > to) {
            return false;
        }

        if let Some(min) = self.min_accuracy {
            match record.average_accuracy() {
                Some(avg) if avg >= min => {}
                _ => return false,
            }
        }

        if let Some(regime) = self.market_regime.as_deref().filter(|s| !s.is_empty()) {
            if record.market_regime() != Some(regime) {
                return false;
            }
        }

        true
    }

    pub fn apply<'a, R: ExportRecord>(&self, records: &'a [R]) -> Vec<&'a R> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }
}

/// A record type that can be written to an export file.
pub trait ExportRecord: Serialize {
    /// Dataset name used in file names.
    const DATASET: &'static str;
    /// Column order of the CSV rendering.
    const COLUMNS: &'static [&'static str];

    fn csv_fields(&self) -> Vec<String>;
    fn symbol(&self) -> &str;
    /// Date the `date_from`/`date_to` bounds are compared against.
    fn export_date(&self) -> DateTime<Utc>;
    fn market_regime(&self) -> Option<&str>;

    fn average_accuracy(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
    pub record_count: usize,
}

#[derive(Debug, Serialize)]
struct JsonExport<'a, R: Serialize> {
    export_timestamp: DateTime<Utc>,
    record_count: usize,
    records: &'a [&'a R],
}

/// Filters `records` and renders the survivors in `format`.
///
/// Fails rather than producing an empty file, both when `records` is empty and
/// when the filter removes every row.
pub fn export_records<R: ExportRecord>(
    records: &[R],
    filter: &ExportFilter,
    format: ExportFormat,
    exported_at: DateTime<Utc>,
) -> anyhow::Result<ExportedFile> {
    ensure!(!records.is_empty(), "no records to export");

    let selected = filter.apply(records);
    ensure!(
        !selected.is_empty(),
        "no records match the export filter ({} candidates)",
        records.len()
    );

    let body = match format {
        ExportFormat::Csv => to_csv(&selected)?,
        ExportFormat::Json => to_json(&selected, exported_at)?,
    };

    Ok(ExportedFile {
        file_name: format!(
            "{}_{}.{}",
            R::DATASET,
            exported_at.format("%Y-%m-%d"),
            format.extension()
        ),
        content_type: format.content_type(),
        body,
        record_count: selected.len(),
    })
}

pub fn to_csv<R: ExportRecord>(records: &[&R]) -> anyhow::Result<String> {
    ensure!(!records.is_empty(), "no records to export");

    let mut out = csv_line(R::COLUMNS.iter().copied());
    for record in records {
        let fields = record.csv_fields();
        ensure!(
            fields.len() == R::COLUMNS.len(),
            "{} row has {} fields, expected {}",
            R::DATASET,
            fields.len(),
            R::COLUMNS.len()
        );
        out.push_str(&csv_line(fields.iter().map(String::as_str)));
    }
    Ok(out)
}

pub fn to_json<R: ExportRecord>(
    records: &[&R],
    exported_at: DateTime<Utc>,
) -> anyhow::Result<String> {
    ensure!(!records.is_empty(), "no records to export");

    let doc = JsonExport {
        export_timestamp: exported_at,
        record_count: records.len(),
        records,
    };
    serde_json::to_string_pretty(&doc).context("failed to serialize export document")
}

fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut line = fields
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_text(v: Option<&str>) -> String {
    v.unwrap_or_default().to_string()
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl ExportRecord for CompletedTrade {
    const DATASET: &'static str = "completed_trades";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "symbol",
        "entry_date",
        "exit_date",
        "entry_price",
        "exit_price",
        "quantity",
        "realized_pnl",
        "profit_percentage",
        "win_loss",
        "rsi_signal",
        "macd_signal",
        "sentiment_score",
        "vix_level",
        "ai_confidence",
        "market_regime",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.symbol.clone(),
            timestamp(self.entry_date),
            timestamp(self.exit_date),
            self.entry_price.to_string(),
            self.exit_price.to_string(),
            self.quantity.to_string(),
            self.realized_pnl.to_string(),
            self.profit_percentage.to_string(),
            self.win_loss.to_string(),
            opt_text(self.rsi_signal.as_deref()),
            opt_text(self.macd_signal.as_deref()),
            opt_num(self.sentiment_score),
            opt_num(self.vix_level),
            opt_num(self.ai_confidence),
            opt_text(self.market_regime.as_deref()),
        ]
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn export_date(&self) -> DateTime<Utc> {
        self.exit_date
    }

    fn market_regime(&self) -> Option<&str> {
        self.market_regime.as_deref()
    }
}

impl ExportRecord for TradingHistoryRecord {
    const DATASET: &'static str = "trading_history";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "symbol",
        "action",
        "timestamp",
        "position_size",
        "entry_price",
        "current_price",
        "unrealized_pnl",
        "ai_confidence",
        "technical_confidence",
        "ai_recommendation",
        "technical_recommendation",
        "sentiment_score",
        "rsi_signal",
        "macd_signal",
        "vix_level",
        "composite_score",
        "market_regime",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.symbol.clone(),
            self.action.as_str().to_string(),
            timestamp(self.timestamp),
            opt_num(self.position_size),
            opt_num(self.entry_price),
            opt_num(self.current_price),
            opt_num(self.unrealized_pnl),
            opt_num(self.ai_confidence),
            opt_num(self.technical_confidence),
            opt_text(self.ai_recommendation.as_deref()),
            opt_text(self.technical_recommendation.as_deref()),
            opt_num(self.sentiment_score),
            opt_text(self.rsi_signal.as_deref()),
            opt_text(self.macd_signal.as_deref()),
            opt_num(self.vix_level),
            opt_num(self.composite_score),
            opt_text(self.market_regime.as_deref()),
        ]
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn export_date(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn market_regime(&self) -> Option<&str> {
        self.market_regime.as_deref()
    }
}

impl ExportRecord for AiLearningRecord {
    const DATASET: &'static str = "ai_learning_data";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "symbol",
        "analysis_date",
        "actual_outcome",
        "rsi_accuracy",
        "macd_accuracy",
        "sentiment_accuracy",
        "volume_accuracy",
        "average_accuracy",
        "market_regime",
        "vix_level",
        "ai_confidence",
        "prediction_confidence",
        "predicted_direction",
    ];

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.symbol.clone(),
            timestamp(self.analysis_date),
            opt_num(self.actual_outcome),
            opt_num(self.rsi_accuracy),
            opt_num(self.macd_accuracy),
            opt_num(self.sentiment_accuracy),
            opt_num(self.volume_accuracy),
            opt_num(AiLearningRecord::average_accuracy(self).map(round2)),
            opt_text(self.market_regime.as_deref()),
            opt_num(self.vix_level),
            opt_num(self.ai_confidence),
            opt_num(self.prediction_confidence),
            opt_text(self.predicted_direction.as_deref()),
        ]
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn export_date(&self) -> DateTime<Utc> {
        self.analysis_date
    }

    fn market_regime(&self) -> Option<&str> {
        self.market_regime.as_deref()
    }

    fn average_accuracy(&self) -> Option<f64> {
        AiLearningRecord::average_accuracy(self)
    }
}
