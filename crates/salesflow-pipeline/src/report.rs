//! Summary statistics and the text report

use salesflow_common::{ensure_parent_dir, format_currency, Amount, DailyRevenue, PipelineError, Result};
use std::path::Path;

const RULE: &str = "================================";

/// Derived statistics behind the daily revenue report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueSummary {
    pub days: usize,
    pub total: Amount,
    pub average: Amount,
    pub best: DailyRevenue,
    pub worst: DailyRevenue,
}

impl RevenueSummary {
    /// Summarize the aggregated rows. Ties for best and worst day go to the
    /// earliest row.
    pub fn from_rows(rows: &[DailyRevenue]) -> Result<Self> {
        let (first, rest) = rows.split_first().ok_or_else(|| {
            PipelineError::validation_field("No daily revenue rows to report on", "daily_revenue")
        })?;

        let mut best = *first;
        let mut worst = *first;
        for row in rest {
            if row.daily_revenue > best.daily_revenue {
                best = *row;
            }
            if row.daily_revenue < worst.daily_revenue {
                worst = *row;
            }
        }

        let total = Amount::checked_sum(rows.iter().map(|row| row.daily_revenue))
            .ok_or_else(|| PipelineError::data("Total revenue does not fit in the amount range"))?;
        let average = total
            .div_round(rows.len())
            .ok_or_else(|| PipelineError::validation("Cannot average zero days"))?;

        Ok(Self {
            days: rows.len(),
            total,
            average,
            best,
            worst,
        })
    }

    /// Render the fixed-layout report text
    pub fn render(&self) -> String {
        let mut lines = vec![
            "📊 DAILY REVENUE REPORT 📊".to_string(),
            RULE.to_string(),
            format!("Total Period: {} days", self.days),
            format!("Total Revenue: {}", format_currency(self.total)),
            format!("Average Daily Revenue: {}", format_currency(self.average)),
            format!(
                "Best Performing Day: {} - {}",
                self.best.order_date.format("%Y-%m-%d"),
                format_currency(self.best.daily_revenue)
            ),
            format!(
                "Lowest Revenue Day: {} - {}",
                self.worst.order_date.format("%Y-%m-%d"),
                format_currency(self.worst.daily_revenue)
            ),
            RULE.to_string(),
        ];
        lines.push(String::new());
        lines.join("\n")
    }

    /// Write the rendered report to `path`, replacing any previous report
    pub fn write_to(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesflow_common::test_utils::{date, revenue_rows, seed_daily_revenue, SEED_TOTAL};

    #[test]
    fn test_seed_summary() {
        let summary = RevenueSummary::from_rows(&seed_daily_revenue()).unwrap();

        assert_eq!(summary.days, 4);
        assert_eq!(summary.total, SEED_TOTAL);
        assert_eq!(summary.average, Amount::new(1782, 25));
        assert_eq!(summary.best.order_date, date(2024, 1, 1));
        assert_eq!(summary.worst.order_date, date(2024, 1, 2));
    }

    #[test]
    fn test_rendered_report_layout() {
        let report = RevenueSummary::from_rows(&seed_daily_revenue()).unwrap().render();

        let expected = "📊 DAILY REVENUE REPORT 📊\n\
                        ================================\n\
                        Total Period: 4 days\n\
                        Total Revenue: $7,129.00\n\
                        Average Daily Revenue: $1,782.25\n\
                        Best Performing Day: 2024-01-01 - $3,127.50\n\
                        Lowest Revenue Day: 2024-01-02 - $1,025.00\n\
                        ================================\n";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_ties_resolve_to_first_date() {
        let rows = revenue_rows(&[
            ("2024-01-01", "100.00"),
            ("2024-01-02", "300.00"),
            ("2024-01-03", "100.00"),
            ("2024-01-04", "300.00"),
        ]);

        let summary = RevenueSummary::from_rows(&rows).unwrap();

        assert_eq!(summary.best.order_date, date(2024, 1, 2));
        assert_eq!(summary.worst.order_date, date(2024, 1, 1));
    }

    #[test]
    fn test_average_rounds_half_away_from_zero() {
        let rows = revenue_rows(&[("2024-01-01", "0.01"), ("2024-01-02", "0.00")]);
        let summary = RevenueSummary::from_rows(&rows).unwrap();
        assert_eq!(summary.average, Amount::from_cents(1));

        let rows = revenue_rows(&[("2024-01-01", "0.01"), ("2024-01-02", "0.01"), ("2024-01-03", "0.00")]);
        let summary = RevenueSummary::from_rows(&rows).unwrap();
        assert_eq!(summary.average, Amount::from_cents(1));
    }

    #[test]
    fn test_total_overflow_is_data_error() {
        let huge = Amount::from_cents(i64::MAX / 2);
        let rows: Vec<DailyRevenue> = (1..=3)
            .map(|day| DailyRevenue {
                order_date: date(2024, 1, day),
                daily_revenue: huge,
            })
            .collect();

        let err = RevenueSummary::from_rows(&rows).unwrap_err();
        assert!(matches!(err, PipelineError::Data { .. }));
    }

    #[test]
    fn test_single_day_is_best_and_worst() {
        let summary = RevenueSummary::from_rows(&revenue_rows(&[("2024-01-01", "42.00")])).unwrap();
        assert_eq!(summary.best, summary.worst);
        assert!(summary.render().contains("Total Period: 1 days"));
    }

    #[test]
    fn test_empty_rows_are_rejected() {
        let err = RevenueSummary::from_rows(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revenue_report.txt");
        std::fs::write(&path, "stale report that is much longer than the new one ".repeat(20)).unwrap();

        let summary = RevenueSummary::from_rows(&seed_daily_revenue()).unwrap();
        summary.write_to(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), summary.render());
    }
}
