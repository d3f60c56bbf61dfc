//! Utility functions used across the pipeline

use crate::{Amount, Result};
use chrono::{NaiveDateTime, Utc};
use std::path::Path;

/// Current UTC time. Chart names embed it, so it must never step backwards
/// the way local time does when daylight saving ends.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format an amount as dollars with thousands separators, e.g. `$7,129.00`
pub fn format_currency(amount: Amount) -> String {
    let plain = amount.to_string();
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (whole, cents) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// Create the parent directory of `path` if it does not exist yet
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
