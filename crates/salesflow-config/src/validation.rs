//! Validation utilities and regex patterns

use regex::Regex;
use salesflow_common::SalesRecord;
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::LazyLock;
use validator::{ValidationError, ValidationErrors};

/// Regex pattern for validating hex color codes (e.g., #FFFFFF, #2E86AB)
pub static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid hex color regex pattern")
});

/// Plain SQL identifier; table names are spliced into statements
pub static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("Invalid identifier regex pattern")
});

/// Validate a six-field cron expression
pub fn validate_cron_expression(cron_expr: &str) -> Result<(), ValidationError> {
    if cron_expr.trim().is_empty() {
        return Err(ValidationError::new("empty_cron_expression"));
    }

    match cron::Schedule::from_str(cron_expr) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("invalid_cron_expression")),
    }
}

/// Validate a log level name
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

/// Validate a mailbox, either `user@host` or `Name <user@host>`
pub fn validate_mailbox(mailbox: &str) -> Result<(), ValidationError> {
    let address = match (mailbox.find('<'), mailbox.rfind('>')) {
        (Some(start), Some(end)) if start < end && end == mailbox.len() - 1 => &mailbox[start + 1..end],
        (None, None) => mailbox,
        _ => return Err(ValidationError::new("invalid_mailbox")),
    };

    match address.split_once('@') {
        Some((user, host)) if !user.is_empty() && host.contains('.') && !address.contains(char::is_whitespace) => Ok(()),
        _ => Err(ValidationError::new("invalid_mailbox")),
    }
}

/// Validate file path (basic check for valid path characters)
pub fn validate_file_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::new("empty_file_path"));
    }

    let invalid_chars = ['<', '>', '"', '|', '?', '*'];
    if path.chars().any(|c| invalid_chars.contains(&c)) {
        return Err(ValidationError::new("invalid_file_path_characters"));
    }

    Ok(())
}

/// Validate the seed rows inserted on every table reset
pub fn validate_seed_records(records: &[SalesRecord]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if records.is_empty() {
        errors.add("seed_records", invalid("empty_seed_records", "At least one seed record is required".into()));
    }

    for (index, record) in records.iter().enumerate() {
        if record.product_name.trim().is_empty() || record.product_name.chars().count() > 100 {
            errors.add(
                "seed_records",
                invalid("invalid_product_name", format!("Record {index}: product name must be 1-100 characters").into()),
            );
        }
        if record.quantity <= 0 {
            errors.add(
                "seed_records",
                invalid("invalid_quantity", format!("Record {index}: quantity must be positive").into()),
            );
        }
        if record.unit_price.cents() < 0 || record.total_amount.cents() < 0 {
            errors.add(
                "seed_records",
                invalid("negative_amount", format!("Record {index}: amounts cannot be negative").into()),
            );
        }
        if !record.total_is_consistent() {
            errors.add(
                "seed_records",
                invalid(
                    "inconsistent_total",
                    format!(
                        "Record {index}: total {} does not equal {} x {}",
                        record.total_amount, record.quantity, record.unit_price
                    )
                    .into(),
                ),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn invalid(code: &'static str, message: Cow<'static, str>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message);
    error
}
