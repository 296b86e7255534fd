use crate::domain::records::{
    AiLearningRecord, CompletedTrade, TradeAction, TradingHistoryRecord, WinLoss,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Demo rows for the dashboard, dated relative to `now`.
#[derive(Debug, Clone, Default)]
pub struct SampleDataset {
    pub trades: Vec<CompletedTrade>,
    pub history: Vec<TradingHistoryRecord>,
    pub ai_records: Vec<AiLearningRecord>,
}

struct ClosedTrade {
    symbol: &'static str,
    entry_price: f64,
    exit_price: f64,
    quantity: f64,
    opened_days_ago: i64,
    held_days: i64,
    rsi: &'static str,
    macd: &'static str,
    sentiment: f64,
    vix: f64,
    confidence: f64,
    regime: &'static str,
}

const CLOSED: &[ClosedTrade] = &[
    ClosedTrade {
        symbol: "AAPL",
        entry_price: 182.40,
        exit_price: 191.15,
        quantity: 20.0,
        opened_days_ago: 21,
        held_days: 5,
        rsi: "oversold",
        macd: "bullish_cross",
        sentiment: 0.42,
        vix: 16.8,
        confidence: 0.81,
        regime: "bull",
    },
    ClosedTrade {
        symbol: "TSLA",
        entry_price: 248.90,
        exit_price: 236.10,
        quantity: 10.0,
        opened_days_ago: 14,
        held_days: 3,
        rsi: "overbought",
        macd: "bearish_cross",
        sentiment: -0.18,
        vix: 24.5,
        confidence: 0.58,
        regime: "volatile",
    },
    ClosedTrade {
        symbol: "NVDA",
        entry_price: 118.25,
        exit_price: 131.60,
        quantity: 30.0,
        opened_days_ago: 9,
        held_days: 6,
        rsi: "neutral",
        macd: "bullish",
        sentiment: 0.65,
        vix: 15.2,
        confidence: 0.88,
        regime: "bull",
    },
    ClosedTrade {
        symbol: "AAPL",
        entry_price: 193.00,
        exit_price: 189.70,
        quantity: 15.0,
        opened_days_ago: 4,
        held_days: 2,
        rsi: "neutral",
        macd: "bearish",
        sentiment: 0.05,
        vix: 31.4,
        confidence: 0.47,
        regime: "sideways",
    },
];

pub fn sample_dataset(now: DateTime<Utc>) -> SampleDataset {
    let mut out = SampleDataset::default();

    for seed in CLOSED {
        let entry_date = now - Duration::days(seed.opened_days_ago);
        let exit_date = entry_date + Duration::days(seed.held_days);
        let realized_pnl = (seed.exit_price - seed.entry_price) * seed.quantity;
        let profit_percentage = (seed.exit_price - seed.entry_price) / seed.entry_price * 100.0;

        out.trades.push(CompletedTrade {
            id: Uuid::new_v4(),
            symbol: seed.symbol.to_string(),
            entry_price: seed.entry_price,
            exit_price: seed.exit_price,
            quantity: seed.quantity,
            realized_pnl,
            profit_percentage,
            win_loss: if realized_pnl > 0.0 {
                WinLoss::Win
            } else {
                WinLoss::Loss
            },
            entry_date,
            exit_date,
            rsi_signal: Some(seed.rsi.to_string()),
            macd_signal: Some(seed.macd.to_string()),
            sentiment_score: Some(seed.sentiment),
            vix_level: Some(seed.vix),
            ai_confidence: Some(seed.confidence),
            market_regime: Some(seed.regime.to_string()),
        });

        // Entry and one mid-hold check; the exit is the completed trade itself.
        let mid = entry_date + Duration::hours(seed.held_days * 12);
        let mid_price = (seed.entry_price + seed.exit_price) / 2.0;
        out.history.push(history_row(seed, TradeAction::Buy, entry_date, seed.entry_price));
        out.history.push(history_row(seed, TradeAction::Check, mid, mid_price));

        out.ai_records.push(ai_row(seed, entry_date - Duration::hours(2), profit_percentage));
    }

    // Still-open position: history only.
    let opened = now - Duration::days(2);
    let entry = TradingHistoryRecord {
        id: Uuid::new_v4(),
        symbol: "MSFT".to_string(),
        action: TradeAction::Buy,
        timestamp: opened,
        ai_confidence: Some(0.74),
        technical_confidence: Some(0.66),
        position_size: Some(12.0),
        current_price: Some(415.30),
        entry_price: Some(415.30),
        unrealized_pnl: Some(0.0),
        ai_recommendation: Some("BUY".to_string()),
        technical_recommendation: Some("BUY".to_string()),
        sentiment_score: Some(0.31),
        rsi_signal: Some("neutral".to_string()),
        macd_signal: Some("bullish".to_string()),
        vix_level: Some(17.9),
        composite_score: Some(0.71),
        market_regime: Some("bull".to_string()),
    };
    let check = TradingHistoryRecord {
        id: Uuid::new_v4(),
        action: TradeAction::Check,
        timestamp: opened + Duration::days(1),
        current_price: Some(421.05),
        unrealized_pnl: Some((421.05 - 415.30) * 12.0),
        composite_score: Some(0.69),
        ..entry.clone()
    };
    out.history.push(entry);
    out.history.push(check);
    out.ai_records.push(AiLearningRecord {
        id: Uuid::new_v4(),
        symbol: "MSFT".to_string(),
        analysis_date: opened - Duration::hours(1),
        actual_outcome: None,
        rsi_accuracy: Some(0.64),
        macd_accuracy: None,
        sentiment_accuracy: Some(0.71),
        volume_accuracy: None,
        market_regime: Some("bull".to_string()),
        vix_level: Some(17.9),
        ai_confidence: Some(0.74),
        prediction_confidence: Some(0.69),
        predicted_direction: Some("up".to_string()),
    });

    out
}

fn history_row(
    seed: &ClosedTrade,
    action: TradeAction,
    timestamp: DateTime<Utc>,
    price: f64,
) -> TradingHistoryRecord {
    TradingHistoryRecord {
        id: Uuid::new_v4(),
        symbol: seed.symbol.to_string(),
        action,
        timestamp,
        ai_confidence: Some(seed.confidence),
        technical_confidence: Some((seed.confidence - 0.05).max(0.0)),
        position_size: Some(seed.quantity),
        current_price: Some(price),
        entry_price: Some(seed.entry_price),
        unrealized_pnl: Some((price - seed.entry_price) * seed.quantity),
        ai_recommendation: Some(if seed.sentiment > 0.1 { "BUY" } else { "HOLD" }.to_string()),
        technical_recommendation: Some(seed.macd.to_ascii_uppercase()),
        sentiment_score: Some(seed.sentiment),
        rsi_signal: Some(seed.rsi.to_string()),
        macd_signal: Some(seed.macd.to_string()),
        vix_level: Some(seed.vix),
        composite_score: Some(seed.confidence * 0.9),
        market_regime: Some(seed.regime.to_string()),
    }
}

fn ai_row(seed: &ClosedTrade, analysis_date: DateTime<Utc>, outcome: f64) -> AiLearningRecord {
    let hit = outcome > 0.0;
    AiLearningRecord {
        id: Uuid::new_v4(),
        symbol: seed.symbol.to_string(),
        analysis_date,
        actual_outcome: Some(outcome),
        rsi_accuracy: Some(if hit { 0.82 } else { 0.41 }),
        macd_accuracy: Some(if hit { 0.77 } else { 0.52 }),
        sentiment_accuracy: Some((0.5 + seed.sentiment / 2.0).clamp(0.0, 1.0)),
        volume_accuracy: if hit { Some(0.69) } else { None },
        market_regime: Some(seed.regime.to_string()),
        vix_level: Some(seed.vix),
        ai_confidence: Some(seed.confidence),
        prediction_confidence: Some((seed.confidence + 0.05).min(1.0)),
        predicted_direction: Some(if seed.sentiment >= 0.0 { "up" } else { "down" }.to_string()),
    }
}
