use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Input file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },
    #[error("Failed to read CSV [{}]: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("File not found: {}", path.display())]
    ProcessedFileNotFound { path: PathBuf },
    #[error("No data to display. Please ensure the dataset is processed and available.")]
    EmptyDataset,
    #[error("Failed to read processed CSV [{}]: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error for [{}]: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("Cannot fit a trend line without at least one yearly total")]
    NoData,
}

impl ProcessError {
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }
}

impl DashboardError {
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
