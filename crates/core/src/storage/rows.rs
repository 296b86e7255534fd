use crate::domain::records::{
    AiLearningRecord, CompletedTrade, TradeAction, TradingHistoryRecord, WinLoss,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub(crate) const COMPLETED_TRADE_COLUMNS: &str = "id, symbol, entry_price, exit_price, quantity, \
     realized_pnl, profit_percentage, win_loss, entry_date, exit_date, rsi_signal, macd_signal, \
     sentiment_score, vix_level, ai_confidence, market_regime";

pub(crate) const TRADING_HISTORY_COLUMNS: &str = "id, symbol, action, timestamp, ai_confidence, \
     technical_confidence, position_size, current_price, entry_price, unrealized_pnl, \
     ai_recommendation, technical_recommendation, sentiment_score, rsi_signal, macd_signal, \
     vix_level, composite_score, market_regime";

pub(crate) const AI_LEARNING_COLUMNS: &str = "id, symbol, analysis_date, actual_outcome, \
     rsi_accuracy, macd_accuracy, sentiment_accuracy, volume_accuracy, market_regime, vix_level, \
     ai_confidence, prediction_confidence, predicted_direction";

#[derive(Debug, sqlx::FromRow)]
pub struct CompletedTradeRow {
    pub id: Uuid,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub realized_pnl: f64,
    pub profit_percentage: f64,
    pub win_loss: String,
    pub entry_date: DateTime<Utc>,
    pub exit_date: DateTime<Utc>,
    pub rsi_signal: Option<String>,
    pub macd_signal: Option<String>,
    pub sentiment_score: Option<f64>,
    pub vix_level: Option<f64>,
    pub ai_confidence: Option<f64>,
    pub market_regime: Option<String>,
}

impl From<CompletedTradeRow> for CompletedTrade {
    fn from(row: CompletedTradeRow) -> Self {
        Self {
            id: row.id,
            symbol: row.symbol,
            entry_price: row.entry_price,
            exit_price: row.exit_price,
            quantity: row.quantity,
            realized_pnl: row.realized_pnl,
            profit_percentage: row.profit_percentage,
            win_loss: WinLoss::parse_lenient(&row.win_loss),
            entry_date: row.entry_date,
            exit_date: row.exit_date,
            rsi_signal: row.rsi_signal,
            macd_signal: row.macd_signal,
            sentiment_score: row.sentiment_score,
            vix_level: row.vix_level,
            ai_confidence: row.ai_confidence,
            market_regime: row.market_regime,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct TradingHistoryRow {
    pub id: Uuid,
    pub symbol: String,
    pub action: String,
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

impl From<TradingHistoryRow> for TradingHistoryRecord {
    fn from(row: TradingHistoryRow) -> Self {
        Self {
            id: row.id,
            symbol: row.symbol,
            action: TradeAction::parse_lenient(&row.action),
            timestamp: row.timestamp,
            ai_confidence: row.ai_confidence,
            technical_confidence: row.technical_confidence,
            position_size: row.position_size,
            current_price: row.current_price,
            entry_price: row.entry_price,
            unrealized_pnl: row.unrealized_pnl,
            ai_recommendation: row.ai_recommendation,
            technical_recommendation: row.technical_recommendation,
            sentiment_score: row.sentiment_score,
            rsi_signal: row.rsi_signal,
            macd_signal: row.macd_signal,
            vix_level: row.vix_level,
            composite_score: row.composite_score,
            market_regime: row.market_regime,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AiLearningRow {
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

impl From<AiLearningRow> for AiLearningRecord {
    fn from(row: AiLearningRow) -> Self {
        Self {
            id: row.id,
            symbol: row.symbol,
            analysis_date: row.analysis_date,
            actual_outcome: row.actual_outcome,
            rsi_accuracy: row.rsi_accuracy,
            macd_accuracy: row.macd_accuracy,
            sentiment_accuracy: row.sentiment_accuracy,
            volume_accuracy: row.volume_accuracy,
            market_regime: row.market_regime,
            vix_level: row.vix_level,
            ai_confidence: row.ai_confidence,
            prediction_confidence: row.prediction_confidence,
            predicted_direction: row.predicted_direction,
        }
    }
}
