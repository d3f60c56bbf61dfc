//! Test utilities and shared test helpers for salesflow.
//!
//! Enabled with the `testing` feature so the other crates in the workspace can
//! reuse the same fixtures in their integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{Amount, DailyRevenue};

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call multiple times.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Calendar date shorthand for fixtures.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// Timestamp shorthand for fixtures.
pub fn timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    date(year, month, day)
        .and_hms_opt(hour, min, sec)
        .expect("valid fixture time")
}

/// Build daily revenue rows from `(date, amount)` text pairs.
pub fn revenue_rows(rows: &[(&str, &str)]) -> Vec<DailyRevenue> {
    rows.iter()
        .map(|(day, amount)| DailyRevenue {
            order_date: day.parse().expect("fixture date"),
            daily_revenue: amount.parse().expect("fixture amount"),
        })
        .collect()
}

/// The aggregation the default seed data must produce.
pub fn seed_daily_revenue() -> Vec<DailyRevenue> {
    revenue_rows(&[
        ("2024-01-01", "3127.50"),
        ("2024-01-02", "1025.00"),
        ("2024-01-03", "1700.00"),
        ("2024-01-04", "1276.50"),
    ])
}

/// Total of the default seed data.
pub const SEED_TOTAL: Amount = Amount::from_cents(712_900);
