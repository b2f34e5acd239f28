use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Result};
use sales_report::config::{DashboardConfig, ProcessorConfig};
use sales_report::dashboard::{Dashboard, DatasetCache};
use sales_report::processor::load_and_process_data;
use tempfile::tempdir;

#[test]
fn test_sample_export_flows_from_processor_to_dashboard() -> Result<()> {
    let dir = tempdir()?;
    let processed = dir.path().join("processed_dataset.csv");
    let sample = Path::new("samples").join("sales.csv");

    let outcome = load_and_process_data(&sample, &processed, &ProcessorConfig::default())?;
    assert!(outcome.saved);
    assert_eq!(outcome.report.total_rows, 14);
    assert_eq!(outcome.report.columns, 10);
    assert_eq!(outcome.report.duplicates_removed, 1);
    assert_eq!(outcome.report.unparsed_dates, 1);
    assert_eq!(outcome.report.defaulted_transaction_types, 2);
    assert_eq!(outcome.records.len(), 13);

    let mut cache = DatasetCache::new();
    let data = cache.load(&processed)?;
    assert_eq!(data.len(), 13);

    let dashboard = Dashboard::new(data, DashboardConfig::default())?;
    assert_eq!(dashboard.years(), vec![2021, 2022, 2023]);
    assert_eq!(
        dashboard.times_of_sale(),
        vec!["Afternoon", "Evening", "Midnight", "Morning", "Night"]
    );

    let view = dashboard.render(2022, Some("Afternoon"))?;
    assert_eq!(view.year_panel.total_sales, 1380.0);
    let top = view.year_panel.chart.first().ok_or_else(|| anyhow!("empty chart"))?;
    assert_eq!((top.item_type.as_str(), top.total_amount), ("Fastfood", 1180.0));

    let time_panel = view.time_panel.ok_or_else(|| anyhow!("time panel missing"))?;
    assert_eq!(time_panel.total_sales, 420.0);
    assert_eq!(time_panel.chart.len(), 1);

    // yearly totals 880, 1380, 375
    assert!((view.forecast.fit.slope + 252.5).abs() < 1e-9);
    assert!((view.forecast.predicted_total - 373.333_333_333).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_processed_sample_is_a_fixpoint() -> Result<()> {
    let dir = tempdir()?;
    let first_path = dir.path().join("first.csv");
    let second_path = dir.path().join("second.csv");
    let sample = Path::new("samples").join("sales.csv");

    let first = load_and_process_data(&sample, &first_path, &ProcessorConfig::default())?;
    let second = load_and_process_data(&first_path, &second_path, &ProcessorConfig::default())?;

    assert_eq!(second.records.len(), first.records.len());
    assert_eq!(second.report.duplicates_removed, 0);
    assert_eq!(second.records, first.records);

    let first_text = fs::read_to_string(&first_path)?;
    assert_eq!(fs::read_to_string(&second_path)?, first_text);
    assert!(first_text.starts_with(
        "order_id,date,item_name,item_type,item_price,quantity,transaction_amount,transaction_type,received_by,time_of_sale,Year,Hour,total_amount\n"
    ));
    Ok(())
}

#[test]
fn test_cli_processes_and_renders_dashboard() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_sales_report");
    let dir = tempdir()?;
    let processed = dir.path().join("processed_dataset.csv");
    let sample = Path::new("samples").join("sales.csv");

    let mut child = Command::new(binary_path)
        .arg(&sample)
        .arg(&processed)
        .arg("error")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin unavailable"))?
        .write_all(b"1\n2\n2\n1\nN\n")?;
    let output = child.wait_with_output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("Original dataset shape: (14, 10)"));
    assert!(stdout.contains("14 rows read, 1 duplicates removed, 13 rows kept"));
    assert!(stdout.contains("Total Sales by Item Type for 2022"));
    assert!(stdout.contains("Total Sales (₹): 1,380"));
    assert!(stdout.contains("Sales by Item Type for 2022 at Afternoon"));
    assert!(stdout.contains("Total Sales (₹): 420"));
    assert!(stdout.contains("Predicted Sales for 2024 (₹): 373"));
    assert!(stdout.contains("Exiting the program."));

    assert!(processed.exists());
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("dashboard_summary.json"))?)?;
    assert_eq!(summary["year"], 2022);
    assert_eq!(summary["time_of_sale"], "Afternoon");
    assert_eq!(summary["year_total_sales"], 1380.0);
    assert!(dir.path().join("sales_by_item_type.csv").exists());
    assert!(dir.path().join("yearly_totals.csv").exists());
    Ok(())
}

#[test]
fn test_cli_reports_missing_processed_file() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_sales_report");
    let dir = tempdir()?;
    let processed = dir.path().join("processed_dataset.csv");

    let mut child = Command::new(binary_path)
        .arg(dir.path().join("raw.csv"))
        .arg(&processed)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin unavailable"))?
        .write_all(b"2\nN\n")?;
    let output = child.wait_with_output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Error: File not found"));
    assert!(!stdout.contains("Predicted Sales"));
    Ok(())
}
