use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WinLoss {
    Win,
    Loss,
}

impl WinLoss {
    /// Anything other than a case-insensitive `WIN` counts as a loss.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("win") {
            Self::Win
        } else {
            Self::Loss
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "WIN",
            Self::Loss => "LOSS",
        }
    }
}

impl fmt::Display for WinLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Check,
}

impl TradeAction {
    /// Unknown actions are treated as periodic checks.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Self::Buy,
            "sell" => Self::Sell,
            _ => Self::Check,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Check => "check",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTrade {
    pub id: Uuid,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub realized_pnl: f64,
    pub profit_percentage: f64,
    pub win_loss: WinLoss,
    pub entry_date: DateTime<Utc>,
    pub exit_date: DateTime<Utc>,
    pub rsi_signal: Option<String>,
    pub macd_signal: Option<String>,
    pub sentiment_score: Option<f64>,
    pub vix_level: Option<f64>,
    pub ai_confidence: Option<f64>,
    pub market_regime: Option<String>,
}

impl CompletedTrade {
    pub fn is_win(&self) -> bool {
        self.win_loss == WinLoss::Win
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingHistoryRecord {
    pub id: Uuid,
    pub symbol: String,
    pub action: TradeAction,
    pub timestamp: DateTime<Utc>,
    pub ai_confidence: Option<f64>,
    pub technical_confidence: Option<f64>,
    pub position_size: Option<f64>,
    pub current_price: Option<f64>,
    pub entry_price: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub ai_recommendation: Option<String>,
    pub technical_recommendation: Option<String>,
    pub sentiment_score: Option<f64>,
    pub rsi_signal: Option<String>,
    pub macd_signal: Option<String>,
    pub vix_level: Option<f64>,
    pub composite_score: Option<f64>,
    pub market_regime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiLearningRecord {
    pub id: Uuid,
    pub symbol: String,
    pub analysis_date: DateTime<Utc>,
    pub actual_outcome: Option<f64>,
    pub rsi_accuracy: Option<f64>,
    pub macd_accuracy: Option<f64>,
    pub sentiment_accuracy: Option<f64>,
    pub volume_accuracy: Option<f64>,
    pub market_regime: Option<String>,
    pub vix_level: Option<f64>,
    pub ai_confidence: Option<f64>,
    pub prediction_confidence: Option<f64>,
    pub predicted_direction: Option<String>,
}

impl AiLearningRecord {
    /// Indicator scores in a fixed order: RSI, MACD, sentiment, volume.
    pub fn indicator_scores(&self) -> [Option<f64>; 4] {
        [
            self.rsi_accuracy,
            self.macd_accuracy,
            self.sentiment_accuracy,
            self.volume_accuracy,
        ]
    }

    /// Mean of the indicator scores this record defines, in percentage points.
    /// `None` when the record carries no indicator scores at all.
    pub fn average_accuracy(&self) -> Option<f64> {
        let present: Vec<f64> = self.indicator_scores().into_iter().flatten().collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64 * 100.0)
    }
}
