use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::format_number;

/// One line of the raw point-of-sale export. Every field is read as text so
/// that a malformed value degrades to `None` instead of rejecting the row.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub date: Option<String>,
    pub item_type: Option<String>,
    pub item_price: Option<String>,
    pub quantity: Option<String>,
    pub transaction_type: Option<String>,
    pub time_of_sale: Option<String>,
}

/// One line of the processed dataset as it sits on disk.
#[derive(Debug, Deserialize)]
pub struct ProcessedRow {
    pub date: Option<String>,
    pub item_type: Option<String>,
    pub item_price: Option<String>,
    pub quantity: Option<String>,
    pub transaction_type: Option<String>,
    pub time_of_sale: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Hour")]
    pub hour: Option<String>,
    pub total_amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub date: Option<NaiveDateTime>,
    pub item_type: Option<String>,
    pub item_price: Option<f64>,
    pub quantity: Option<i64>,
    pub transaction_type: String,
    pub time_of_sale: Option<String>,
    pub year: Option<i32>,
    pub hour: Option<u32>,
    pub total_amount: Option<f64>,
    /// Source columns the cleaner passes through untouched, in header order.
    pub extra_columns: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ItemTotalRow {
    #[tabled(rename = "Item Type")]
    pub item_type: String,
    #[tabled(rename = "Total Sales (₹)", display_with = "display_amount")]
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct YearlyTotalRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Total Sales (₹)", display_with = "display_amount")]
    pub total_amount: f64,
}

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub target_year: i32,
    pub predicted_total: f64,
    pub fit: LinearFit,
    pub yearly_totals: Vec<YearlyTotalRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub title: String,
    pub total_sales: f64,
    pub chart: Vec<ItemTotalRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub year: i32,
    pub time_of_sale: Option<String>,
    pub year_panel: PanelView,
    pub time_panel: Option<PanelView>,
    pub forecast: Forecast,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub time_of_sale: Option<String>,
    pub year_total_sales: f64,
    pub time_total_sales: Option<f64>,
    pub forecast_year: i32,
    pub predicted_total_sales: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl From<&DashboardView> for DashboardSummary {
    fn from(view: &DashboardView) -> Self {
        Self {
            year: view.year,
            time_of_sale: view.time_of_sale.clone(),
            year_total_sales: view.year_panel.total_sales,
            time_total_sales: view.time_panel.as_ref().map(|p| p.total_sales),
            forecast_year: view.forecast.target_year,
            predicted_total_sales: view.forecast.predicted_total,
            slope: view.forecast.fit.slope,
            intercept: view.forecast.fit.intercept,
        }
    }
}

fn display_amount(v: &f64) -> String {
    format_number(*v, 0)
}
