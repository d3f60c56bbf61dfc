//! SQLite access for the sales table
//!
//! Table names come from validated configuration and are interpolated into
//! the statements; every value is bound.

use chrono::NaiveDate;
use salesflow_common::{Amount, DailyRevenue, PipelineError, Result, SalesRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Handle over the sales database
#[derive(Debug, Clone)]
pub struct SalesStore {
    pool: SqlitePool,
}

impl SalesStore {
    /// Connect to the database at `url`
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to sales database: {}", url);

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| PipelineError::database_with_source(format!("Invalid database URL: {url}"), e))?
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database
        let pool = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Create the table if needed and replace its contents with `seed`.
    ///
    /// The delete and the inserts share one transaction, so a failed insert
    /// leaves the previous contents in place.
    pub async fn reset_table(&self, table: &str, seed: &[SalesRecord]) -> Result<u64> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_date DATE NOT NULL,
                product_name VARCHAR(100),
                quantity INTEGER,
                unit_price DECIMAL(10,2),
                total_amount DECIMAL(10,2)
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(&format!(r#"DELETE FROM "{table}""#))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        debug!("Deleted {} existing rows from {}", deleted, table);

        let insert = format!(
            r#"INSERT INTO "{table}" (order_date, product_name, quantity, unit_price, total_amount)
               VALUES (?, ?, ?, ?, ?)"#
        );
        let mut inserted = 0;
        for record in seed {
            inserted += sqlx::query(&insert)
                .bind(record.order_date.format("%Y-%m-%d").to_string())
                .bind(record.product_name.as_str())
                .bind(record.quantity)
                .bind(record.unit_price.as_f64())
                .bind(record.total_amount.as_f64())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Revenue per distinct order date, ascending, summed in whole cents
    pub async fn daily_revenue(&self, table: &str) -> Result<Vec<DailyRevenue>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT order_date, SUM(CAST(ROUND(total_amount * 100) AS INTEGER)) AS revenue_cents
            FROM "{table}"
            GROUP BY order_date
            ORDER BY order_date
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<DailyRevenue> {
                let day: String = row.try_get("order_date")?;
                let cents: i64 = row.try_get("revenue_cents")?;
                let order_date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                    PipelineError::data_with_source(format!("Invalid order_date '{day}' in {table}"), e)
                })?;
                Ok(DailyRevenue {
                    order_date,
                    daily_revenue: Amount::from_cents(cents),
                })
            })
            .collect()
    }

    /// Number of rows in the table
    pub async fn count(&self, table: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!(r#"SELECT COUNT(*) FROM "{table}""#))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
