//! Pure aggregation over already-fetched records.
//!
//! Nothing in here touches the store: callers fetch rows through
//! [`crate::storage::TradeStore`] and pass them in.

pub mod accuracy;
pub mod daily_pnl;
pub mod export;
pub mod metrics;
pub mod recent;
pub mod timeline;
pub mod verify;

/// Rounds to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
