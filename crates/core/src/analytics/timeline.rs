use crate::analytics::round2;
use crate::domain::records::{
    AiLearningRecord, CompletedTrade, TradeAction, TradingHistoryRecord,
};
use crate::time::window::ceil_days_between;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const GENERIC_FACTOR: &str = "General market analysis";

/// How far before a position opens its AI analyses and buy row may sit.
pub const ENTRY_LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    Buy,
    Check,
    Sell,
    AiAnalysis,
}

impl TimelineEventKind {
    fn id_prefix(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Check => "check",
            Self::Sell => "sell",
            Self::AiAnalysis => "ai",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSource {
    pub table: &'static str,
    pub record_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResult {
    pub pnl: Option<f64>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TimelineEventKind,
    pub title: String,
    pub description: String,
    pub source: EventSource,
    pub decision_factors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EventResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSummary {
    pub symbol: String,
    pub status: PositionStatus,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_date: Option<DateTime<Utc>>,
    pub total_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_percentage: Option<f64>,
    pub total_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeTimeline {
    pub symbol: String,
    pub events: Vec<TimelineEvent>,
    pub summary: TimelineSummary,
}

/// Raw inputs for one symbol's timeline.
#[derive(Debug, Clone, Default)]
pub struct TimelineInputs {
    pub history: Vec<TradingHistoryRecord>,
    pub ai_records: Vec<AiLearningRecord>,
    pub completed: Option<CompletedTrade>,
}

/// Rebuilds the life of one position for `symbol` as one chronological event list.
///
/// Only the position the timeline describes is used: the one closed by
/// `completed`, or the open one when there is no trade or the symbol was bought
/// again after that trade's exit. History and AI rows of earlier positions are
/// dropped. Within the position the earliest history row is the buy and the rest
/// are checks.
///
/// Returns `None` when there is neither history nor a completed trade; AI records
/// alone do not make a timeline.
pub fn reconstruct_timeline(
    symbol: &str,
    inputs: TimelineInputs,
    now: DateTime<Utc>,
) -> Option<TradeTimeline> {
    let TimelineInputs {
        mut history,
        ai_records,
        completed,
    } = inputs;

    if history.is_empty() && completed.is_none() {
        return None;
    }

    history.sort_by_key(|r| r.timestamp);

    let window = locate_position(&history, completed.as_ref())?;
    let completed = completed.filter(|_| window.end.is_some());
    history.retain(|r| window.holds(r.timestamp));
    let ai_records: Vec<&AiLearningRecord> = ai_records
        .iter()
        .filter(|r| window.informs(r.analysis_date))
        .collect();

    let mut events = Vec::with_capacity(history.len() + ai_records.len() + 1);
    for (idx, record) in history.iter().enumerate() {
        events.push(if idx == 0 {
            buy_event(record)
        } else {
            check_event(record)
        });
    }
    events.extend(ai_records.into_iter().map(ai_event));
    if let Some(trade) = &completed {
        events.push(sell_event(trade));
    }

    // Stable: same-instant events keep history, ai, sell order.
    events.sort_by_key(|e| e.date);

    let start_date = events.first()?.date;
    let (status, end) = match &completed {
        Some(trade) => (PositionStatus::Completed, trade.exit_date),
        None => (PositionStatus::Active, now),
    };

    let summary = TimelineSummary {
        symbol: symbol.to_string(),
        status,
        start_date,
        sell_date: completed.as_ref().map(|t| t.exit_date),
        total_days: ceil_days_between(start_date, end),
        final_pnl: completed.as_ref().map(|t| round2(t.realized_pnl)),
        final_percentage: completed.as_ref().map(|t| round2(t.profit_percentage)),
        total_events: events.len(),
    };

    Some(TradeTimeline {
        symbol: symbol.to_string(),
        events,
        summary,
    })
}

/// Time bounds of the single position a timeline covers. `end` is `None` while open.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PositionWindow {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

impl PositionWindow {
    fn holds(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && self.end.map_or(true, |end| ts <= end)
    }

    /// AI analyses usually precede the buy they led to.
    fn informs(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start - entry_lookback() && self.end.map_or(true, |end| ts <= end)
    }
}

fn entry_lookback() -> Duration {
    Duration::hours(ENTRY_LOOKBACK_HOURS)
}

/// `history` must be sorted by timestamp.
fn locate_position(
    history: &[TradingHistoryRecord],
    completed: Option<&CompletedTrade>,
) -> Option<PositionWindow> {
    let last_buy_until = |limit: Option<DateTime<Utc>>| {
        history
            .iter()
            .rev()
            .filter(|r| r.action == TradeAction::Buy)
            .map(|r| r.timestamp)
            .find(|ts| limit.map_or(true, |limit| *ts <= limit))
    };
    let latest_buy = last_buy_until(None);

    match completed {
        Some(trade) if latest_buy.map_or(true, |ts| ts <= trade.exit_date) => {
            let start = last_buy_until(Some(trade.exit_date))
                .filter(|ts| *ts >= trade.entry_date - entry_lookback())
                .map_or(trade.entry_date, |ts| ts.min(trade.entry_date));
            Some(PositionWindow {
                start,
                end: Some(trade.exit_date),
            })
        }
        _ => {
            let start = latest_buy.or_else(|| history.first().map(|r| r.timestamp))?;
            Some(PositionWindow { start, end: None })
        }
    }
}

fn event_id(kind: TimelineEventKind, record_id: Uuid) -> String {
    format!("{}-{record_id}", kind.id_prefix())
}

fn buy_event(record: &TradingHistoryRecord) -> TimelineEvent {
    let price = record.entry_price.or(record.current_price);
    TimelineEvent {
        id: event_id(TimelineEventKind::Buy, record.id),
        date: record.timestamp,
        kind: TimelineEventKind::Buy,
        title: format!("Bought {}", record.symbol),
        description: format!(
            "Opened position of {} shares at {}",
            fmt_quantity(record.position_size),
            fmt_money(price),
        ),
        source: EventSource {
            table: "trading_history",
            record_id: record.id,
        },
        decision_factors: history_factors(record),
        confidence: record.ai_confidence,
        result: None,
    }
}

fn check_event(record: &TradingHistoryRecord) -> TimelineEvent {
    TimelineEvent {
        id: event_id(TimelineEventKind::Check, record.id),
        date: record.timestamp,
        kind: TimelineEventKind::Check,
        title: format!("Position check: {}", record.symbol),
        description: format!(
            "Price {} with unrealized P&L {}",
            fmt_money(record.current_price),
            fmt_money(record.unrealized_pnl),
        ),
        source: EventSource {
            table: "trading_history",
            record_id: record.id,
        },
        decision_factors: history_factors(record),
        confidence: record.ai_confidence,
        result: record.unrealized_pnl.map(|pnl| EventResult {
            pnl: Some(round2(pnl)),
            percentage: None,
        }),
    }
}

fn ai_event(record: &AiLearningRecord) -> TimelineEvent {
    let direction = record.predicted_direction.as_deref().unwrap_or("N/A");
    let regime = record.market_regime.as_deref().unwrap_or("N/A");
    TimelineEvent {
        id: event_id(TimelineEventKind::AiAnalysis, record.id),
        date: record.analysis_date,
        kind: TimelineEventKind::AiAnalysis,
        title: format!("AI analysis: {}", record.symbol),
        description: format!(
            "Predicted {direction} in {regime} regime; actual outcome {}",
            fmt_percent(record.actual_outcome),
        ),
        source: EventSource {
            table: "ai_learning_data",
            record_id: record.id,
        },
        decision_factors: ai_factors(record),
        confidence: record.ai_confidence.or(record.prediction_confidence),
        result: record.actual_outcome.map(|pct| EventResult {
            pnl: None,
            percentage: Some(round2(pct)),
        }),
    }
}

fn sell_event(trade: &CompletedTrade) -> TimelineEvent {
    TimelineEvent {
        id: event_id(TimelineEventKind::Sell, trade.id),
        date: trade.exit_date,
        kind: TimelineEventKind::Sell,
        title: format!("Sold {} ({})", trade.symbol, trade.win_loss),
        description: format!(
            "Closed {} shares at {} (entry {}), realized P&L {} ({})",
            fmt_quantity(Some(trade.quantity)),
            fmt_money(Some(trade.exit_price)),
            fmt_money(Some(trade.entry_price)),
            fmt_money(Some(trade.realized_pnl)),
            fmt_percent(Some(trade.profit_percentage)),
        ),
        source: EventSource {
            table: "completed_trades",
            record_id: trade.id,
        },
        decision_factors: trade_factors(trade),
        confidence: trade.ai_confidence,
        result: Some(EventResult {
            pnl: Some(round2(trade.realized_pnl)),
            percentage: Some(round2(trade.profit_percentage)),
        }),
    }
}

/// Signal fields shared by every record type that can explain a decision.
#[derive(Debug, Default)]
struct Signals<'a> {
    technical_recommendation: Option<&'a str>,
    sentiment_score: Option<f64>,
    rsi_signal: Option<&'a str>,
    macd_signal: Option<&'a str>,
    vix_level: Option<f64>,
    composite_score: Option<f64>,
}

impl Signals<'_> {
    fn into_factors(self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(rec) = self.technical_recommendation.filter(|s| !s.trim().is_empty()) {
            out.push(format!("Technical: {}", rec.trim()));
        }
        if let Some(score) = self.sentiment_score {
            out.push(format!("Sentiment: {}", sentiment_bucket(score)));
        }
        if let Some(rsi) = self.rsi_signal.filter(|s| !s.trim().is_empty()) {
            out.push(format!("RSI: {}", rsi.trim()));
        }
        if let Some(macd) = self.macd_signal.filter(|s| !s.trim().is_empty()) {
            out.push(format!("MACD: {}", macd.trim()));
        }
        if let Some(vix) = self.vix_level {
            out.push(format!("VIX: {} ({vix:.1})", vix_bucket(vix)));
        }
        if let Some(score) = self.composite_score {
            out.push(format!("Composite score: {score:.2}"));
        }
        if out.is_empty() {
            out.push(GENERIC_FACTOR.to_string());
        }
        out
    }
}

fn history_factors(record: &TradingHistoryRecord) -> Vec<String> {
    Signals {
        technical_recommendation: record.technical_recommendation.as_deref(),
        sentiment_score: record.sentiment_score,
        rsi_signal: record.rsi_signal.as_deref(),
        macd_signal: record.macd_signal.as_deref(),
        vix_level: record.vix_level,
        composite_score: record.composite_score,
    }
    .into_factors()
}

fn trade_factors(trade: &CompletedTrade) -> Vec<String> {
    Signals {
        sentiment_score: trade.sentiment_score,
        rsi_signal: trade.rsi_signal.as_deref(),
        macd_signal: trade.macd_signal.as_deref(),
        vix_level: trade.vix_level,
        ..Default::default()
    }
    .into_factors()
}

fn ai_factors(record: &AiLearningRecord) -> Vec<String> {
    let mut factors = Signals {
        vix_level: record.vix_level,
        ..Default::default()
    }
    .into_factors();
    if let Some(regime) = record.market_regime.as_deref().filter(|s| !s.trim().is_empty()) {
        if factors.len() == 1 && factors[0] == GENERIC_FACTOR {
            factors.clear();
        }
        factors.insert(0, format!("Market regime: {}", regime.trim()));
    }
    factors
}

pub fn sentiment_bucket(score: f64) -> &'static str {
    if score > 0.1 {
        "positive"
    } else if score < -0.1 {
        "negative"
    } else {
        "neutral"
    }
}

pub fn vix_bucket(vix: f64) -> &'static str {
    if vix < 20.0 {
        "low"
    } else if vix <= 30.0 {
        "medium"
    } else {
        "high"
    }
}

fn fmt_money(v: Option<f64>) -> String {
    match v {
        Some(v) if v < 0.0 => format!("-${:.2}", v.abs()),
        Some(v) => format!("${v:.2}"),
        None => "N/A".to_string(),
    }
}

fn fmt_percent(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}%"),
        None => "N/A".to_string(),
    }
}

fn fmt_quantity(v: Option<f64>) -> String {
    match v {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::accuracy::tests::ai_record;
    use crate::analytics::metrics::tests::trade;
    use crate::domain::records::TradeAction;
    use chrono::{Duration, TimeZone};

    fn history(symbol: &str, ts: DateTime<Utc>) -> TradingHistoryRecord {
        TradingHistoryRecord {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            action: TradeAction::Check,
            timestamp: ts,
            ai_confidence: Some(0.82),
            technical_confidence: None,
            position_size: Some(10.0),
            current_price: Some(182.5),
            entry_price: Some(180.0),
            unrealized_pnl: Some(25.0),
            ai_recommendation: None,
            technical_recommendation: None,
            sentiment_score: None,
            rsi_signal: None,
            macd_signal: None,
            vix_level: None,
            composite_score: None,
            market_regime: None,
        }
    }

    fn buy(symbol: &str, ts: DateTime<Utc>) -> TradingHistoryRecord {
        TradingHistoryRecord {
            action: TradeAction::Buy,
            ..history(symbol, ts)
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, day, 16, 0, 0).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 14, 30, 0).unwrap()
    }

    #[test]
    fn buy_then_sell_is_completed() {
        let buy = history("AAPL", t0());
        let sold = trade("AAPL", 120.0, 6.67, t0() + Duration::hours(50));
        let timeline = reconstruct_timeline(
            "AAPL",
            TimelineInputs {
                history: vec![buy],
                ai_records: vec![],
                completed: Some(sold.clone()),
            },
            t0() + Duration::days(30),
        )
        .unwrap();

        let kinds: Vec<_> = timeline.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TimelineEventKind::Buy, TimelineEventKind::Sell]);
        assert_eq!(timeline.summary.status, PositionStatus::Completed);
        assert_eq!(timeline.summary.sell_date, Some(sold.exit_date));
        assert_eq!(timeline.summary.total_days, 3);
        assert_eq!(timeline.summary.final_pnl, Some(120.0));
        assert_eq!(timeline.summary.final_percentage, Some(6.67));
        assert_eq!(timeline.summary.total_events, 2);
    }

    #[test]
    fn history_only_is_active_until_now() {
        let now = t0() + Duration::hours(30);
        let timeline = reconstruct_timeline(
            "TSLA",
            TimelineInputs {
                history: vec![history("TSLA", t0() + Duration::hours(6)), history("TSLA", t0())],
                ..Default::default()
            },
            now,
        )
        .unwrap();

        assert_eq!(timeline.summary.status, PositionStatus::Active);
        assert!(timeline.summary.sell_date.is_none());
        assert!(timeline.summary.final_pnl.is_none());
        assert_eq!(timeline.summary.total_days, 2);
        assert_eq!(timeline.events[0].kind, TimelineEventKind::Buy);
        assert_eq!(timeline.events[0].date, t0());
        assert_eq!(timeline.events[1].kind, TimelineEventKind::Check);

        let v = serde_json::to_value(&timeline.summary).unwrap();
        assert!(v.get("sell_date").is_none());
        assert_eq!(v["status"], "active");
    }

    #[test]
    fn events_are_sorted_across_sources() {
        let mut ai = ai_record("NVDA", Some(0.7), None);
        ai.analysis_date = t0() + Duration::hours(1);
        let timeline = reconstruct_timeline(
            "NVDA",
            TimelineInputs {
                history: vec![history("NVDA", t0() + Duration::hours(2)), history("NVDA", t0())],
                ai_records: vec![ai],
                completed: Some(trade("NVDA", -30.0, -1.5, t0() + Duration::hours(3))),
            },
            t0(),
        )
        .unwrap();

        let kinds: Vec<_> = timeline.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TimelineEventKind::Buy,
                TimelineEventKind::AiAnalysis,
                TimelineEventKind::Check,
                TimelineEventKind::Sell,
            ]
        );
        assert!(timeline.events.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn earlier_position_of_the_same_symbol_is_left_out() {
        let first_buy = buy("AAPL", at(1));
        let second_buy = buy("AAPL", at(10));
        let mut first_ai = ai_record("AAPL", Some(0.6), None);
        first_ai.analysis_date = at(1) - Duration::hours(2);
        let mut second_ai = ai_record("AAPL", Some(0.9), None);
        second_ai.analysis_date = at(10) - Duration::hours(2);
        // Entered at(9) per the trade record, closed at(12).
        let second_trade = trade("AAPL", -49.5, -1.71, at(12));

        let timeline = reconstruct_timeline(
            "AAPL",
            TimelineInputs {
                history: vec![
                    first_buy,
                    history("AAPL", at(2)),
                    second_buy.clone(),
                    history("AAPL", at(11)),
                ],
                ai_records: vec![first_ai, second_ai.clone()],
                completed: Some(second_trade.clone()),
            },
            at(20),
        )
        .unwrap();

        let kinds: Vec<_> = timeline.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TimelineEventKind::AiAnalysis,
                TimelineEventKind::Buy,
                TimelineEventKind::Check,
                TimelineEventKind::Sell,
            ]
        );
        assert_eq!(timeline.events[0].source.record_id, second_ai.id);
        assert_eq!(timeline.events[1].source.record_id, second_buy.id);
        assert_eq!(timeline.summary.start_date, second_ai.analysis_date);
        assert_eq!(timeline.summary.total_days, 3);
        assert_eq!(timeline.summary.final_pnl, Some(-49.5));
        assert_eq!(timeline.summary.sell_date, Some(second_trade.exit_date));
    }

    #[test]
    fn buying_again_after_the_exit_shows_the_open_position() {
        let reopened = buy("TSLA", at(8));
        let timeline = reconstruct_timeline(
            "TSLA",
            TimelineInputs {
                history: vec![
                    buy("TSLA", at(2)),
                    history("TSLA", at(3)),
                    reopened.clone(),
                    history("TSLA", at(9)),
                ],
                ai_records: vec![],
                completed: Some(trade("TSLA", 20.0, 2.0, at(5))),
            },
            at(10),
        )
        .unwrap();

        let kinds: Vec<_> = timeline.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TimelineEventKind::Buy, TimelineEventKind::Check]);
        assert_eq!(timeline.events[0].source.record_id, reopened.id);
        assert_eq!(timeline.summary.status, PositionStatus::Active);
        assert!(timeline.summary.final_pnl.is_none());
        assert_eq!(timeline.summary.total_days, 2);
    }

    #[test]
    fn sample_symbol_with_two_trades_covers_only_the_latest() {
        let now = at(28);
        let data = crate::domain::fixtures::sample_dataset(now);
        let latest = data
            .trades
            .iter()
            .filter(|t| t.symbol == "AAPL")
            .max_by_key(|t| t.exit_date)
            .cloned();
        let inputs = TimelineInputs {
            history: data.history.into_iter().filter(|h| h.symbol == "AAPL").collect(),
            ai_records: data.ai_records.into_iter().filter(|r| r.symbol == "AAPL").collect(),
            completed: latest,
        };

        let timeline = reconstruct_timeline("AAPL", inputs, now).unwrap();
        let kinds: Vec<_> = timeline.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TimelineEventKind::AiAnalysis,
                TimelineEventKind::Buy,
                TimelineEventKind::Check,
                TimelineEventKind::Sell,
            ]
        );
        assert_eq!(timeline.summary.total_days, 3);
        assert_eq!(timeline.summary.final_pnl, Some(-49.5));
    }

    #[test]
    fn no_history_and_no_trade_means_no_timeline() {
        let inputs = TimelineInputs {
            ai_records: vec![ai_record("MSFT", Some(0.5), None)],
            ..Default::default()
        };
        assert!(reconstruct_timeline("MSFT", inputs, t0()).is_none());
    }

    #[test]
    fn decision_factors_follow_present_signals() {
        let mut record = history("AAPL", t0());
        assert_eq!(history_factors(&record), vec![GENERIC_FACTOR.to_string()]);

        record.technical_recommendation = Some("BUY".to_string());
        record.sentiment_score = Some(-0.4);
        record.vix_level = Some(24.0);
        record.composite_score = Some(0.734);
        assert_eq!(
            history_factors(&record),
            vec![
                "Technical: BUY".to_string(),
                "Sentiment: negative".to_string(),
                "VIX: medium (24.0)".to_string(),
                "Composite score: 0.73".to_string(),
            ]
        );
    }

    #[test]
    fn descriptions_interpolate_trade_values() {
        let sold = trade("AAPL", -42.5, -2.1, t0());
        let event = sell_event(&sold);
        assert_eq!(
            event.description,
            "Closed 10 shares at $97.90 (entry $100.00), realized P&L -$42.50 (-2.10%)"
        );
        assert_eq!(event.title, "Sold AAPL (LOSS)");
    }

    #[test]
    fn buckets_cover_the_boundaries() {
        assert_eq!(sentiment_bucket(0.1), "neutral");
        assert_eq!(sentiment_bucket(0.11), "positive");
        assert_eq!(sentiment_bucket(-0.5), "negative");
        assert_eq!(vix_bucket(19.9), "low");
        assert_eq!(vix_bucket(30.0), "medium");
        assert_eq!(vix_bucket(30.1), "high");
    }
}
