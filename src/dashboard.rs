// Read-only view over the processed dataset.
//
// `Dashboard` is a pure function of (table, year, time of sale). Loading goes
// through `DatasetCache`, which keeps one parsed copy per file and reloads it
// when the file's modification time changes.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::config::{DashboardConfig, TimePanelChart};
use crate::error::{DashboardError, ForecastError};
use crate::reports::{
    available_times, available_years, filter_by_year, filter_by_year_and_time,
    forecast_total_sales, sales_by_item_type, total_sales,
};
use crate::types::{DashboardView, Forecast, PanelView, ProcessedRow, TransactionRecord};
use crate::util::{
    non_empty_string, parse_f64_safe, parse_i32_safe, parse_i64_safe, parse_timestamp_safe,
    parse_u32_safe,
};

/// Parse the processed CSV into records. Stored `Year`, `Hour` and
/// `total_amount` values are taken as written, not re-derived.
pub fn read_processed(path: &Path) -> Result<Vec<TransactionRecord>, DashboardError> {
    if !path.exists() {
        return Err(DashboardError::ProcessedFileNotFound { path: path.to_path_buf() });
    }
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| DashboardError::csv(path, e))?;

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<ProcessedRow>().enumerate() {
        match result {
            Ok(row) => records.push(from_processed(row)),
            Err(e) => warn!("Skipping processed row {}: {e}", idx + 1),
        }
    }
    info!("Loaded {} processed rows from {}", records.len(), path.display());
    Ok(records)
}

fn from_processed(row: ProcessedRow) -> TransactionRecord {
    TransactionRecord {
        date: parse_timestamp_safe(row.date.as_deref()),
        item_type: non_empty_string(row.item_type),
        item_price: parse_f64_safe(row.item_price.as_deref()),
        quantity: parse_i64_safe(row.quantity.as_deref()),
        transaction_type: non_empty_string(row.transaction_type).unwrap_or_default(),
        time_of_sale: non_empty_string(row.time_of_sale),
        year: parse_i32_safe(row.year.as_deref()),
        hour: parse_u32_safe(row.hour.as_deref()),
        total_amount: parse_f64_safe(row.total_amount.as_deref()),
        extra_columns: Vec::new(),
    }
}

struct CachedDataset {
    modified: Option<SystemTime>,
    records: Arc<Vec<TransactionRecord>>,
}

/// Memoizes parsed datasets by absolute path and modification time.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CachedDataset>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<Vec<TransactionRecord>>, DashboardError> {
        let key = cache_key(path);
        if !key.exists() {
            self.entries.remove(&key);
            return Err(DashboardError::ProcessedFileNotFound { path: path.to_path_buf() });
        }
        let modified = fs::metadata(&key)
            .map_err(|e| DashboardError::io(&key, e))?
            .modified()
            .ok();

        if let Some(entry) = self.entries.get(&key) {
            if entry.modified == modified {
                debug!("Dataset cache hit for {}", key.display());
                return Ok(Arc::clone(&entry.records));
            }
            debug!("Dataset {} changed on disk, reloading", key.display());
        }

        let records = Arc::new(read_processed(&key)?);
        self.entries.insert(
            key,
            CachedDataset { modified, records: Arc::clone(&records) },
        );
        Ok(records)
    }

    /// Drop the cached copy of `path`. Returns whether anything was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(&cache_key(path)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub struct Dashboard {
    data: Arc<Vec<TransactionRecord>>,
    config: DashboardConfig,
}

impl Dashboard {
    /// Fails with [`DashboardError::EmptyDataset`] when there is nothing to show.
    pub fn new(data: Arc<Vec<TransactionRecord>>, config: DashboardConfig) -> Result<Self, DashboardError> {
        if data.is_empty() {
            return Err(DashboardError::EmptyDataset);
        }
        Ok(Self { data, config })
    }

    pub fn years(&self) -> Vec<i32> {
        available_years(&self.data)
    }

    pub fn times_of_sale(&self) -> Vec<String> {
        available_times(&self.data)
    }

    pub fn year_panel(&self, year: i32) -> PanelView {
        let filtered = filter_by_year(&self.data, year);
        PanelView {
            title: format!("Total Sales by Item Type for {year}"),
            total_sales: total_sales(filtered.iter().copied()),
            chart: sales_by_item_type(filtered.iter().copied()),
        }
    }

    /// The metric always reflects year and time of sale together. The chart
    /// source depends on [`DashboardConfig::time_panel_chart`].
    pub fn time_panel(&self, year: i32, time_of_sale: &str) -> PanelView {
        let filtered = filter_by_year_and_time(&self.data, year, time_of_sale);
        let chart = match self.config.time_panel_chart {
            TimePanelChart::YearAndTime => sales_by_item_type(filtered.iter().copied()),
            TimePanelChart::YearOnly => sales_by_item_type(filter_by_year(&self.data, year)),
        };
        PanelView {
            title: format!("Sales by Item Type for {year} at {time_of_sale}"),
            total_sales: total_sales(filtered.iter().copied()),
            chart,
        }
    }

    pub fn forecast(&self) -> Result<Forecast, ForecastError> {
        forecast_total_sales(&self.data, self.config.forecast_year)
    }

    pub fn render(&self, year: i32, time_of_sale: Option<&str>) -> Result<DashboardView, DashboardError> {
        Ok(DashboardView {
            year,
            time_of_sale: time_of_sale.map(str::to_string),
            year_panel: self.year_panel(year),
            time_panel: time_of_sale.map(|t| self.time_panel(year, t)),
            forecast: self.forecast()?,
        })
    }
}
