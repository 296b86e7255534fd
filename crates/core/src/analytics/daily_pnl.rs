use crate::analytics::round2;
use crate::domain::records::CompletedTrade;
use crate::time::window::{utc_date, window_dates};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnlPoint {
    pub date: NaiveDate,
    pub pnl: f64,
    #[serde(rename = "cumulativePnL")]
    pub cumulative_pnl: f64,
}

/// Buckets realized P&L by exit date over `[today - days, today]`.
///
/// Every date in the window gets a point even when nothing closed that day.
/// Trades outside the window are skipped, not rejected.
pub fn bucket_daily_pnl(
    trades: &[CompletedTrade],
    days: u32,
    today: NaiveDate,
) -> Vec<DailyPnlPoint> {
    let mut buckets: BTreeMap<NaiveDate, f64> = window_dates(today, days)
        .into_iter()
        .map(|d| (d, 0.0))
        .collect();

    for trade in trades {
        if let Some(bucket) = buckets.get_mut(&utc_date(trade.exit_date)) {
            *bucket += trade.realized_pnl;
        }
    }

    let mut cumulative = 0.0;
    buckets
        .into_iter()
        .map(|(date, pnl)| {
            cumulative += pnl;
            DailyPnlPoint {
                date,
                pnl: round2(pnl),
                cumulative_pnl: round2(cumulative),
            }
        })
        .collect()
}
