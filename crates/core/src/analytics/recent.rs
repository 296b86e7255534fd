use crate::analytics::round2;
use crate::domain::records::{CompletedTrade, TradingHistoryRecord, WinLoss};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const MAX_RECENT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTrade {
    pub id: Uuid,
    pub symbol: String,
    pub date: DateTime<Utc>,
    pub pnl: f64,
    pub win_loss: WinLoss,
    pub ai_confidence: Option<f64>,
}

pub fn resolve_limit(requested: Option<i64>) -> usize {
    match requested {
        None => DEFAULT_RECENT_LIMIT,
        Some(n) => n.clamp(1, MAX_RECENT_LIMIT as i64) as usize,
    }
}

/// Newest-first view of completed trades with an AI confidence attached.
///
/// Confidence comes from the trade itself when recorded. Otherwise it is taken
/// from the latest history row of the same symbol inside the trade's own
/// holding period, so confidence from an unrelated earlier or later position
/// of that symbol is never attached.
pub fn recent_trades(
    trades: &[CompletedTrade],
    history: &[TradingHistoryRecord],
    limit: usize,
) -> Vec<RecentTrade> {
    let mut ordered: Vec<&CompletedTrade> = trades.iter().collect();
    ordered.sort_by(|a, b| b.exit_date.cmp(&a.exit_date));

    ordered
        .into_iter()
        .take(limit)
        .map(|trade| RecentTrade {
            id: trade.id,
            symbol: trade.symbol.clone(),
            date: trade.exit_date,
            pnl: round2(trade.realized_pnl),
            win_loss: trade.win_loss,
            ai_confidence: trade
                .ai_confidence
                .or_else(|| confidence_during_holding(trade, history)),
        })
        .collect()
}

fn confidence_during_holding(
    trade: &CompletedTrade,
    history: &[TradingHistoryRecord],
) -> Option<f64> {
    history
        .iter()
        .filter(|h| h.symbol == trade.symbol)
        .filter(|h| h.timestamp >= trade.entry_date && h.timestamp <= trade.exit_date)
        .filter(|h| h.ai_confidence.is_some())
        .max_by_key(|h| h.timestamp)
        .and_then(|h| h.ai_confidence)
}
