use chrono::{DateTime, Duration, NaiveDate, Utc};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const MAX_WINDOW_DAYS: u32 = 365;

const SECS_PER_DAY: i64 = 24 * 3600;

/// Calendar date of a timestamp, truncated in UTC.
pub fn utc_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Clamps a requested window to `1..=MAX_WINDOW_DAYS`, defaulting when absent.
pub fn resolve_window_days(requested: Option<i64>) -> u32 {
    match requested {
        None => DEFAULT_WINDOW_DAYS,
        Some(d) => d.clamp(1, MAX_WINDOW_DAYS as i64) as u32,
    }
}

/// Every calendar date in `[today - days, today]`, ascending.
pub fn window_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let start = today - Duration::days(days as i64);
    start
        .iter_days()
        .take_while(|d| *d <= today)
        .collect()
}

/// Whole days between two instants, rounded up. Never negative.
pub fn ceil_days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let secs = (end - start).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
}
