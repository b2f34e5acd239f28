use crate::error::ForecastError;
use crate::types::{Forecast, ItemTotalRow, LinearFit, TransactionRecord, YearlyTotalRow};
use crate::util::sum_present;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Distinct years present in the data, ascending. Rows without a year are ignored.
pub fn available_years(data: &[TransactionRecord]) -> Vec<i32> {
    data.iter()
        .filter_map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct time-of-sale labels present in the data, sorted.
pub fn available_times(data: &[TransactionRecord]) -> Vec<String> {
    data.iter()
        .filter_map(|r| r.time_of_sale.as_deref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn filter_by_year(data: &[TransactionRecord], year: i32) -> Vec<&TransactionRecord> {
    data.iter().filter(|r| r.year == Some(year)).collect()
}

pub fn filter_by_year_and_time<'a>(
    data: &'a [TransactionRecord],
    year: i32,
    time_of_sale: &str,
) -> Vec<&'a TransactionRecord> {
    data.iter()
        .filter(|r| r.year == Some(year) && r.time_of_sale.as_deref() == Some(time_of_sale))
        .collect()
}

/// Grand total of `total_amount`, skipping rows where it is missing.
pub fn total_sales<'a, I>(rows: I) -> f64
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    sum_present(rows.into_iter().map(|r| r.total_amount))
}

/// Sum of `total_amount` per item type, largest first.
///
/// Rows without an item type are dropped. An item type whose amounts are all
/// missing still appears, with a total of zero. Equal totals are ordered by
/// item type so the series is deterministic.
pub fn sales_by_item_type<'a, I>(rows: I) -> Vec<ItemTotalRow>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut map: HashMap<&str, f64> = HashMap::new();
    for r in rows {
        let Some(item_type) = r.item_type.as_deref() else { continue };
        *map.entry(item_type).or_insert(0.0) += r.total_amount.unwrap_or(0.0);
    }
    let mut out: Vec<ItemTotalRow> = map
        .into_iter()
        .map(|(item_type, total_amount)| ItemTotalRow {
            item_type: item_type.to_string(),
            total_amount,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_amount
            .partial_cmp(&a.total_amount)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item_type.cmp(&b.item_type))
    });
    out
}

/// Sum of `total_amount` per year, ascending by year.
pub fn yearly_totals(data: &[TransactionRecord]) -> Vec<YearlyTotalRow> {
    let mut map: BTreeMap<i32, f64> = BTreeMap::new();
    for r in data {
        let Some(year) = r.year else { continue };
        *map.entry(year).or_insert(0.0) += r.total_amount.unwrap_or(0.0);
    }
    map.into_iter()
        .map(|(year, total_amount)| YearlyTotalRow { year, total_amount })
        .collect()
}

/// Ordinary least squares fit of `y` on a single predictor `x`.
///
/// With one distinct `x` the slope is zero and the intercept is the mean of
/// `y`, which is the minimum-norm least squares solution.
pub fn fit_linear(points: &[(f64, f64)]) -> Result<LinearFit, ForecastError> {
    if points.is_empty() {
        return Err(ForecastError::NoData);
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for (x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;
    Ok(LinearFit { slope, intercept })
}

/// Fit a trend line through the yearly totals and evaluate it at `target_year`.
pub fn forecast_total_sales(
    data: &[TransactionRecord],
    target_year: i32,
) -> Result<Forecast, ForecastError> {
    let yearly = yearly_totals(data);
    let points: Vec<(f64, f64)> = yearly
        .iter()
        .map(|row| (row.year as f64, row.total_amount))
        .collect();
    let fit = fit_linear(&points)?;
    Ok(Forecast {
        target_year,
        predicted_total: fit.predict(target_year as f64),
        fit,
        yearly_totals: yearly,
    })
}
