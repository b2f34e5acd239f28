use std::path::PathBuf;

use tracing::level_filters::LevelFilter;

pub const DEFAULT_SOURCE_PATH: &str = "data/Balaji Fast Food Sales.csv";
pub const DEFAULT_PROCESSED_PATH: &str = "data/processed_dataset.csv";
pub const DEFAULT_TRANSACTION_TYPE: &str = "Credit Card";
pub const DEFAULT_FORECAST_YEAR: i32 = 2024;

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Literal written into `transaction_type` when the source leaves it blank.
    pub default_transaction_type: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            default_transaction_type: DEFAULT_TRANSACTION_TYPE.to_string(),
        }
    }
}

/// Which aggregation feeds the chart of the time-of-day panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePanelChart {
    /// Items sold in the selected year at the selected time of sale.
    #[default]
    YearAndTime,
    /// Items sold in the selected year at any time of sale. Matches the legacy
    /// dashboard, whose second chart ignored the time filter.
    YearOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub forecast_year: i32,
    pub time_panel_chart: TimePanelChart,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            forecast_year: DEFAULT_FORECAST_YEAR,
            time_panel_chart: TimePanelChart::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source_path: PathBuf,
    pub processed_path: PathBuf,
    pub log_level: LevelFilter,
    pub processor: ProcessorConfig,
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            processed_path: PathBuf::from(DEFAULT_PROCESSED_PATH),
            log_level: LevelFilter::ERROR,
            processor: ProcessorConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// Build from positional arguments: `[raw.csv] [processed.csv] [log_level]`.
    /// The first element is expected to be the program name.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().skip(1);
        if let Some(source) = args.next() {
            config.source_path = PathBuf::from(source.as_ref());
        }
        if let Some(processed) = args.next() {
            config.processed_path = PathBuf::from(processed.as_ref());
        }
        if let Some(level) = args.next() {
            config.log_level = parse_log_level(level.as_ref());
        }
        config
    }
}

pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}
