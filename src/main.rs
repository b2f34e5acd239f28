// Console front-end for the sales pipeline.
//
// - Option [1] processes the raw export into the processed dataset.
// - Option [2] opens the dashboard: pick a year and a time of sale, see the
//   per-item totals for each, and the trend forecast. The views are also
//   exported next to the processed dataset.
use std::fmt::Display;
use std::io::{self, stderr, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use sales_report::config::Config;
use sales_report::dashboard::{Dashboard, DatasetCache};
use sales_report::error::{DashboardError, ProcessError};
use sales_report::output;
use sales_report::processor::load_and_process_data;
use sales_report::types::{DashboardSummary, DashboardView, PanelView};
use sales_report::util::{format_int, format_number};

// The processed dataset is parsed once per file version and reused across
// dashboard sessions in the same run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    cache: DatasetCache,
}

/// Read one trimmed line from stdin. `None` on end of input.
fn read_line() -> Option<String> {
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    read_line()
}

fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to menu (Y/N): ");
        let Some(resp) = read_line() else { return false };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Show a numbered list and return the picked element.
fn select_option<T: Display + Clone>(label: &str, options: &[T]) -> Option<T> {
    println!("{label}:");
    for (idx, opt) in options.iter().enumerate() {
        println!("[{}] {}", idx + 1, opt);
    }
    loop {
        let choice = read_choice()?;
        match choice.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Some(options[n - 1].clone()),
            _ => println!("Invalid choice. Please enter a number between 1 and {}.", options.len()),
        }
    }
}

fn handle_process(config: &Config) {
    match load_and_process_data(&config.source_path, &config.processed_path, &config.processor) {
        Ok(outcome) => {
            let report = &outcome.report;
            println!(
                "Original dataset shape: ({}, {})",
                report.total_rows, report.columns
            );
            println!(
                "Processing dataset... ({} rows read, {} duplicates removed, {} rows kept)",
                format_int(report.total_rows),
                format_int(report.duplicates_removed),
                format_int(outcome.records.len())
            );
            if report.unparsed_dates > 0 {
                println!("Note: {} rows have an unparseable date.", format_int(report.unparsed_dates));
            }
            if report.skipped_rows > 0 {
                println!("Note: {} unreadable rows skipped.", format_int(report.skipped_rows));
            }
            if outcome.saved {
                println!("Processed dataset saved to {}\n", outcome.output_path.display());
            } else {
                println!("Warning: processed dataset could not be saved to {}\n", outcome.output_path.display());
            }
            // A fresh file invalidates whatever the dashboard had cached.
            lock_state().cache.invalidate(&config.processed_path);
        }
        Err(ProcessError::SourceNotFound { path }) => {
            eprintln!("Input file not found: {}\n", path.display());
        }
        Err(e) => {
            eprintln!("Failed to process file: {}\n", e);
        }
    }
}

fn lock_state() -> std::sync::MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn print_panel(heading: &str, panel: &PanelView) {
    println!("{heading}\n");
    println!("Total Sales (₹): {}\n", format_number(panel.total_sales, 0));
    println!("{}\n", panel.title);
    output::preview_table_rows(&panel.chart, panel.chart.len());
}

fn handle_dashboard(config: &Config) {
    let data = match lock_state().cache.load(&config.processed_path) {
        Ok(d) => d,
        Err(DashboardError::ProcessedFileNotFound { path }) => {
            println!("Error: File not found: {}\n", path.display());
            return;
        }
        Err(e) => {
            eprintln!("Failed to load processed dataset: {}\n", e);
            return;
        }
    };
    let dashboard = match Dashboard::new(data, config.dashboard.clone()) {
        Ok(d) => d,
        Err(e) => {
            println!("Warning: {}\n", e);
            return;
        }
    };

    println!("Sales Dashboard\n");
    let years = dashboard.years();
    if years.is_empty() {
        println!("Warning: no dated sales to display.\n");
        return;
    }
    let Some(year) = select_option("Select Year", &years) else { return };

    let times = dashboard.times_of_sale();
    let time_of_sale = if times.is_empty() {
        None
    } else {
        match select_option("Select Time of Sale", &times) {
            Some(t) => Some(t),
            None => return,
        }
    };

    let view = match dashboard.render(year, time_of_sale.as_deref()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to build dashboard: {}\n", e);
            return;
        }
    };

    print_panel("Total Sales by Item Type", &view.year_panel);
    if let Some(panel) = &view.time_panel {
        print_panel("Sales by Time of Day", panel);
    }
    println!("Predict Total Sales for {}\n", view.forecast.target_year);
    output::preview_table_rows(&view.forecast.yearly_totals, view.forecast.yearly_totals.len());
    println!(
        "Predicted Sales for {} (₹): {}\n",
        view.forecast.target_year,
        format_number(view.forecast.predicted_total, 0)
    );

    export_reports(&config.processed_path, &view);
}

fn export_reports(processed_path: &Path, view: &DashboardView) {
    let dir = processed_path.parent().unwrap_or_else(|| Path::new("."));

    let file1 = dir.join("sales_by_item_type.csv");
    if let Err(e) = output::write_csv(&file1, &view.year_panel.chart) {
        eprintln!("Write error: {}", e);
    }
    if let Some(panel) = &view.time_panel {
        let file2 = dir.join("sales_by_time_of_day.csv");
        if let Err(e) = output::write_csv(&file2, &panel.chart) {
            eprintln!("Write error: {}", e);
        }
    }
    let file3 = dir.join("yearly_totals.csv");
    if let Err(e) = output::write_csv(&file3, &view.forecast.yearly_totals) {
        eprintln!("Write error: {}", e);
    }
    let summary = DashboardSummary::from(view);
    let file4 = dir.join("dashboard_summary.json");
    if let Err(e) = output::write_json(&file4, &summary) {
        eprintln!("Write error: {}", e);
    }
    info!("Exported dashboard views to {}", dir.display());
    println!("(Views exported to {})\n", dir.display());
}

fn setup_logging(level: LevelFilter) {
    // stdout carries the dashboard, logs go to stderr.
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry().with(terminal_log).init();
}

fn main() -> Result<()> {
    let config = Config::from_args(std::env::args());
    setup_logging(config.log_level);

    loop {
        println!("Sales Data Pipeline:");
        println!("[1] Process the raw file");
        println!("[2] Open the dashboard\n");
        let Some(choice) = read_choice() else { break };
        match choice.as_str() {
            "1" => handle_process(&config),
            "2" => {
                println!();
                handle_dashboard(&config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
    if let Err(e) = io::stdout().flush() {
        error!("Failed to flush stdout: {e}");
    }
    Ok(())
}
