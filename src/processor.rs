use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, error, info, warn};

use crate::config::ProcessorConfig;
use crate::error::ProcessError;
use crate::output::write_rows;
use crate::types::{RawRow, TransactionRecord};
use crate::util::{
    format_decimal, non_empty_string, parse_f64_safe, parse_i64_safe, parse_timestamp_safe,
    TIMESTAMP_FORMAT,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessReport {
    /// Data rows read from the source, duplicates included.
    pub total_rows: usize,
    pub columns: usize,
    pub duplicates_removed: usize,
    /// Rows the CSV reader could not split into fields.
    pub skipped_rows: usize,
    pub unparsed_dates: usize,
    pub defaulted_transaction_types: usize,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub records: Vec<TransactionRecord>,
    pub report: ProcessReport,
    /// Absolute form of the requested destination.
    pub output_path: PathBuf,
    /// `false` when the processed file could not be written. The records are
    /// still returned in that case.
    pub saved: bool,
}

/// A column of the processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputColumn {
    Date,
    ItemType,
    ItemPrice,
    Quantity,
    TransactionType,
    TimeOfSale,
    Year,
    Hour,
    TotalAmount,
    Passthrough(String),
}

const KNOWN_COLUMNS: [OutputColumn; 9] = [
    OutputColumn::Date,
    OutputColumn::ItemType,
    OutputColumn::ItemPrice,
    OutputColumn::Quantity,
    OutputColumn::TransactionType,
    OutputColumn::TimeOfSale,
    OutputColumn::Year,
    OutputColumn::Hour,
    OutputColumn::TotalAmount,
];

impl OutputColumn {
    fn from_header(name: &str) -> Self {
        match name {
            "date" => Self::Date,
            "item_type" => Self::ItemType,
            "item_price" => Self::ItemPrice,
            "quantity" => Self::Quantity,
            "transaction_type" => Self::TransactionType,
            "time_of_sale" => Self::TimeOfSale,
            "Year" => Self::Year,
            "Hour" => Self::Hour,
            "total_amount" => Self::TotalAmount,
            other => Self::Passthrough(other.to_string()),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Date => "date",
            Self::ItemType => "item_type",
            Self::ItemPrice => "item_price",
            Self::Quantity => "quantity",
            Self::TransactionType => "transaction_type",
            Self::TimeOfSale => "time_of_sale",
            Self::Year => "Year",
            Self::Hour => "Hour",
            Self::TotalAmount => "total_amount",
            Self::Passthrough(name) => name,
        }
    }
}

/// Column order of the processed file: the source header as-is, followed by
/// whichever known columns the source lacked. Reading a processed file back
/// yields the same layout.
#[derive(Debug, Clone)]
struct OutputLayout {
    columns: Vec<OutputColumn>,
}

impl OutputLayout {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut columns: Vec<OutputColumn> = Vec::new();
        for name in headers.iter() {
            let column = OutputColumn::from_header(name);
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        for column in KNOWN_COLUMNS {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        Self { columns }
    }

    fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    fn render(&self, record: &TransactionRecord) -> Vec<String> {
        self.columns.iter().map(|c| render_field(c, record)).collect()
    }
}

fn render_field(column: &OutputColumn, r: &TransactionRecord) -> String {
    match column {
        OutputColumn::Date => r
            .date
            .map(|d| d.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default(),
        OutputColumn::ItemType => r.item_type.clone().unwrap_or_default(),
        OutputColumn::ItemPrice => r.item_price.map(format_decimal).unwrap_or_default(),
        OutputColumn::Quantity => r.quantity.map(|q| q.to_string()).unwrap_or_default(),
        OutputColumn::TransactionType => r.transaction_type.clone(),
        OutputColumn::TimeOfSale => r.time_of_sale.clone().unwrap_or_default(),
        OutputColumn::Year => r.year.map(|y| y.to_string()).unwrap_or_default(),
        OutputColumn::Hour => r.hour.map(|h| h.to_string()).unwrap_or_default(),
        OutputColumn::TotalAmount => r.total_amount.map(format_decimal).unwrap_or_default(),
        OutputColumn::Passthrough(name) => r
            .extra_columns
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default(),
    }
}

/// Load the raw sales export, clean it, derive `Year`, `Hour` and
/// `total_amount`, and persist the result to `destination`.
///
/// Rows are compared after cleaning, on exactly the values that get written,
/// so the processed file never holds two identical lines and processing it
/// again changes nothing. Columns outside the known set are carried through.
///
/// Only a missing or unreadable source is an error. Failing to write the
/// processed file is logged and reported through [`ProcessOutcome::saved`].
pub fn load_and_process_data(
    source: &Path,
    destination: &Path,
    config: &ProcessorConfig,
) -> Result<ProcessOutcome, ProcessError> {
    if !source.exists() {
        return Err(ProcessError::SourceNotFound { path: source.to_path_buf() });
    }

    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(source)
        .map_err(|e| ProcessError::csv(source, e))?;
    let headers = rdr.headers().map_err(|e| ProcessError::csv(source, e))?.clone();
    let layout = OutputLayout::from_headers(&headers);

    let mut report = ProcessReport { columns: headers.len(), ..Default::default() };
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut records: Vec<TransactionRecord> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable row {}: {e}", report.total_rows);
                report.skipped_rows += 1;
                continue;
            }
        };
        let raw: RawRow = match row.deserialize(Some(&headers)) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping row {} that does not match the header: {e}", report.total_rows);
                report.skipped_rows += 1;
                continue;
            }
        };

        let extra_columns = passthrough_values(&headers, &row);
        let (record, defaulted) = process_row(raw, extra_columns, config);
        let line = layout.render(&record);
        if !seen.insert(line.clone()) {
            report.duplicates_removed += 1;
            continue;
        }

        if record.date.is_none() {
            report.unparsed_dates += 1;
        }
        if defaulted {
            report.defaulted_transaction_types += 1;
        }
        records.push(record);
        rows.push(line);
    }

    info!("Original dataset shape: ({}, {})", report.total_rows, report.columns);
    info!(
        "Removed {} duplicate rows, {} rows remain",
        report.duplicates_removed,
        records.len()
    );
    if report.unparsed_dates > 0 {
        warn!("{} rows have a date that could not be parsed", report.unparsed_dates);
    }

    let output_path = resolve_output_path(destination);
    info!("Attempting to save to: {}", output_path.display());
    let saved = match write_rows(&output_path, &layout.header(), &rows) {
        Ok(()) => {
            info!("Processed dataset saved successfully");
            true
        }
        Err(e) => {
            error!("Failed to save file [{}]. Error: {e}", output_path.display());
            false
        }
    };

    Ok(ProcessOutcome { records, report, output_path, saved })
}

/// Trimmed values of the columns the cleaner does not interpret, in header order.
fn passthrough_values(headers: &StringRecord, row: &StringRecord) -> Vec<(String, String)> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, name)| matches!(OutputColumn::from_header(name), OutputColumn::Passthrough(_)))
        .map(|(idx, name)| (name.to_string(), row.get(idx).unwrap_or("").trim().to_string()))
        .collect()
}

/// Returns the cleaned record and whether `transaction_type` was defaulted.
fn process_row(
    raw: RawRow,
    extra_columns: Vec<(String, String)>,
    config: &ProcessorConfig,
) -> (TransactionRecord, bool) {
    let date = parse_timestamp_safe(raw.date.as_deref());
    if date.is_none() {
        debug!("Unparseable date {:?}", raw.date);
    }

    let (transaction_type, defaulted) = match non_empty_string(raw.transaction_type) {
        Some(t) => (t, false),
        None => (config.default_transaction_type.clone(), true),
    };

    let item_price = parse_f64_safe(raw.item_price.as_deref());
    let quantity = parse_i64_safe(raw.quantity.as_deref());
    let total_amount = match (item_price, quantity) {
        (Some(price), Some(qty)) => Some(price * qty as f64),
        _ => None,
    };

    let record = TransactionRecord {
        date,
        item_type: non_empty_string(raw.item_type),
        item_price,
        quantity,
        transaction_type,
        time_of_sale: non_empty_string(raw.time_of_sale),
        year: date.map(|d| d.year()),
        hour: date.map(|d| d.hour()),
        total_amount,
        extra_columns,
    };
    (record, defaulted)
}

fn resolve_output_path(destination: &Path) -> PathBuf {
    match std::path::absolute(destination) {
        Ok(p) => p,
        Err(e) => {
            warn!("Could not resolve [{}] to an absolute path: {e}", destination.display());
            destination.to_path_buf()
        }
    }
}
