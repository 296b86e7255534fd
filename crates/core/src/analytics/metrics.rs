use crate::analytics::round2;
use crate::domain::records::CompletedTrade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetrics {
    pub total_trades: usize,
    pub total_wins: usize,
    pub total_losses: usize,
    pub win_rate: f64,
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    pub average_return: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
}

/// Summary statistics over a set of completed trades. Empty input yields all zeros.
pub fn compute_metrics(trades: &[CompletedTrade]) -> TradeMetrics {
    if trades.is_empty() {
        return TradeMetrics::default();
    }

    let total_trades = trades.len();
    let total_wins = trades.iter().filter(|t| t.is_win()).count();
    let total_losses = total_trades - total_wins;

    let total_pnl: f64 = trades.iter().map(|t| t.realized_pnl).sum();
    let return_sum: f64 = trades.iter().map(|t| t.profit_percentage).sum();

    let best_trade = trades
        .iter()
        .map(|t| t.realized_pnl)
        .fold(f64::NEG_INFINITY, f64::max);
    let worst_trade = trades
        .iter()
        .map(|t| t.realized_pnl)
        .fold(f64::INFINITY, f64::min);

    TradeMetrics {
        total_trades,
        total_wins,
        total_losses,
        win_rate: round2(total_wins as f64 / total_trades as f64 * 100.0),
        total_pnl: round2(total_pnl),
        average_return: round2(return_sum / total_trades as f64),
        best_trade: round2(best_trade),
        worst_trade: round2(worst_trade),
    }
}
