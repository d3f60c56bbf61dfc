//! Integration tests for salesflow-config crate.

use std::io::Write;
use std::path::PathBuf;

use salesflow_config::{Config, ConfigLoader, MailTransportKind};

#[test]
fn test_default_config_validation() {
    let config = Config::default();
    assert!(config.validate_all().is_ok());
    assert_eq!(config.notification.transport, MailTransportKind::File);
    assert_eq!(config.seed_records.len(), 8);
}

#[test]
fn test_pipeline_settings_from_yaml() {
    let yaml = r#"
output:
  output_dir: "/srv/salesflow"
  aggregated_file: "daily_revenue.csv"
  report_file: "/var/reports/revenue_report.txt"
  chart_dir: "revenue_plots"
notification:
  recipient: "finance@example.com"
  subject_template: "Revenue for {date}"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = ConfigLoader::load_from_file(file.path()).unwrap();
    let settings = config.pipeline_settings();

    assert_eq!(settings.aggregated_file, PathBuf::from("/srv/salesflow/daily_revenue.csv"));
    assert_eq!(settings.report_path, PathBuf::from("/var/reports/revenue_report.txt"));
    assert_eq!(settings.chart_dir, PathBuf::from("/srv/salesflow/revenue_plots"));
    assert_eq!(settings.subject_for("2024-01-05"), "Revenue for 2024-01-05");
    assert_eq!(settings.table_name, "sales");
}

#[test]
fn test_custom_seed_records_from_yaml() {
    let yaml = r#"
seed_records:
  - order_date: "2024-02-01"
    product_name: "Desk"
    quantity: 2
    unit_price: "150.00"
    total_amount: "300.00"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = ConfigLoader::load_from_file(file.path()).unwrap();
    assert_eq!(config.seed_records.len(), 1);
    assert_eq!(config.seed_records[0].product_name, "Desk");
}

#[test]
fn test_inconsistent_seed_rejected() {
    let yaml = r#"
seed_records:
  - order_date: "2024-02-01"
    product_name: "Desk"
    quantity: 2
    unit_price: "150.00"
    total_amount: "299.00"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    assert!(ConfigLoader::load_from_file(file.path()).is_err());
}

#[test]
fn test_smtp_only_validated_when_selected() {
    let mut config = Config::default();
    config.notification.smtp.host = String::new();
    assert!(config.validate_all().is_ok());

    config.notification.transport = MailTransportKind::Smtp;
    assert!(config.validate_all().is_err());
}
