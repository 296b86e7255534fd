use crate::analytics::metrics::{compute_metrics, TradeMetrics};
use crate::domain::records::{AiLearningRecord, CompletedTrade, TradingHistoryRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub completed_trades: usize,
    pub trading_history: usize,
    pub ai_learning_data: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolCount {
    pub symbol: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub counts: TableCounts,
    pub duplicate_symbols: Vec<SymbolCount>,
    pub open_symbols: Vec<String>,
    /// Trades whose win/loss flag disagrees with the sign of realized P&L.
    pub inconsistent_outcomes: Vec<Uuid>,
    pub metrics: TradeMetrics,
}

pub fn verify_data(
    trades: &[CompletedTrade],
    history: &[TradingHistoryRecord],
    ai_records: &[AiLearningRecord],
) -> VerificationReport {
    let mut per_symbol: BTreeMap<&str, usize> = BTreeMap::new();
    for trade in trades {
        *per_symbol.entry(trade.symbol.as_str()).or_default() += 1;
    }

    let duplicate_symbols = per_symbol
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(symbol, count)| SymbolCount {
            symbol: symbol.to_string(),
            count: *count,
        })
        .collect();

    let open_symbols = history
        .iter()
        .map(|h| h.symbol.as_str())
        .filter(|s| !per_symbol.contains_key(s))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let inconsistent_outcomes = trades
        .iter()
        .filter(|t| (t.realized_pnl > 0.0 && !t.is_win()) || (t.realized_pnl < 0.0 && t.is_win()))
        .map(|t| t.id)
        .collect();

    VerificationReport {
        counts: TableCounts {
            completed_trades: trades.len(),
            trading_history: history.len(),
            ai_learning_data: ai_records.len(),
        },
        duplicate_symbols,
        open_symbols,
        inconsistent_outcomes,
        metrics: compute_metrics(trades),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::metrics::tests::trade;
    use crate::domain::records::{TradeAction, WinLoss};
    use chrono::{TimeZone, Utc};

    fn history(symbol: &str) -> TradingHistoryRecord {
        TradingHistoryRecord {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            action: TradeAction::Buy,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 14, 0, 0).unwrap(),
            ai_confidence: None,
            technical_confidence: None,
            position_size: None,
            current_price: None,
            entry_price: None,
            unrealized_pnl: None,
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

    #[test]
    fn reports_duplicates_open_positions_and_bad_flags() {
        let at = Utc.with_ymd_and_hms(2026, 8, 3, 14, 0, 0).unwrap();
        let mut mislabeled = trade("TSLA", 40.0, 2.0, at);
        mislabeled.win_loss = WinLoss::Loss;
        let trades = vec![
            trade("AAPL", 10.0, 1.0, at),
            trade("AAPL", -3.0, -0.3, at),
            mislabeled.clone(),
        ];
        let history = vec![history("AAPL"), history("NVDA"), history("NVDA"), history("AMD")];

        let report = verify_data(&trades, &history, &[]);
        assert_eq!(report.counts.completed_trades, 3);
        assert_eq!(report.counts.trading_history, 4);
        assert_eq!(report.counts.ai_learning_data, 0);
        assert_eq!(
            report.duplicate_symbols,
            vec![SymbolCount {
                symbol: "AAPL".to_string(),
                count: 2
            }]
        );
        assert_eq!(report.open_symbols, vec!["AMD".to_string(), "NVDA".to_string()]);
        assert_eq!(report.inconsistent_outcomes, vec![mislabeled.id]);
        assert_eq!(report.metrics.total_trades, 3);
    }

    #[test]
    fn empty_tables_verify_cleanly() {
        let report = verify_data(&[], &[], &[]);
        assert!(report.duplicate_symbols.is_empty());
        assert!(report.open_symbols.is_empty());
        assert_eq!(report.metrics, TradeMetrics::default());
    }
}
