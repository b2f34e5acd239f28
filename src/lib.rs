//! Cleaning pipeline and reporting views for point-of-sale sales exports.
//!
//! [`processor::load_and_process_data`] turns the raw CSV into the processed
//! dataset. [`dashboard::Dashboard`] answers the filtering, aggregation and
//! forecast questions asked of that dataset.
pub mod config;
pub mod dashboard;
pub mod error;
pub mod output;
pub mod processor;
pub mod reports;
pub mod types;
pub mod util;
