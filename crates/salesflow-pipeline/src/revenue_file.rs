//! The aggregated daily revenue CSV shared by the downstream stages

use salesflow_common::{ensure_parent_dir, DailyRevenue, PipelineError, Result};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Artifact kind used in missing-file errors
pub const AGGREGATED_FILE_KIND: &str = "aggregated revenue file";

/// Write `rows` with an `order_date,daily_revenue` header, replacing the file
pub fn write_daily_revenue(path: &Path, rows: &[DailyRevenue]) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut writer = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    if rows.is_empty() {
        writer.write_record(["order_date", "daily_revenue"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the aggregated file back; dates are parsed as calendar dates
pub fn read_daily_revenue(path: &Path) -> Result<Vec<DailyRevenue>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PipelineError::missing_artifact(AGGREGATED_FILE_KIND, path));
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::Reader::from_reader(file);
    let rows = reader.deserialize().collect::<std::result::Result<Vec<DailyRevenue>, _>>()?;
    Ok(rows)
}

/// Fixed-width table of the rows, for the logs
pub fn render_table(rows: &[DailyRevenue]) -> String {
    let amounts: Vec<String> = rows.iter().map(|row| row.daily_revenue.to_string()).collect();
    let width = amounts
        .iter()
        .map(String::len)
        .chain(std::iter::once("daily_revenue".len()))
        .max()
        .unwrap_or_default();

    let mut table = format!("{:<10}  {:>width$}", "order_date", "daily_revenue");
    for (row, amount) in rows.iter().zip(&amounts) {
        table.push('\n');
        table.push_str(&format!("{}  {:>width$}", row.order_date.format("%Y-%m-%d"), amount));
    }
    table
}
