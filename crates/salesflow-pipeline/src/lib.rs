//! # Salesflow Pipeline
//!
//! The five stages of the daily sales revenue job and the runner that
//! executes them in order:
//!
//! 1. `create_sales_table` resets the sales table to its seed rows
//! 2. `calculate_daily_revenue` writes the per-day totals to CSV
//! 3. `visualize_revenue` renders a timestamped chart of the totals
//! 4. `generate_report` writes the text summary
//! 5. `send_email_report` mails the CSV, the report and the newest chart
//!
//! Stages 3 and 4 run concurrently once stage 2 has finished, and stage 5
//! waits for both.

pub mod mail;
pub mod report;
pub mod revenue_file;
pub mod runner;
pub mod stages;
pub mod store;

pub use mail::{create_mail_client, Attachment, DynMailClient, EmailMessage, MailClient};
pub use report::RevenueSummary;
pub use runner::{Pipeline, RetryPolicy, RunReport, Stage, StageOutcome};
pub use store::SalesStore;
