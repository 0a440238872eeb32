//! Summary statistics, histograms and per-city spreads

use crate::error::{FlatpriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headline numbers for a selection of listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_listings: usize,
    pub avg_square_meters: Option<f64>,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
}

impl SummaryStats {
    pub fn compute(df: &DataFrame) -> Result<Self> {
        let area = column_values(df, "squareMeters")?;
        let mut price = column_values(df, "price")?;
        price.sort_by(f64::total_cmp);

        Ok(Self {
            total_listings: df.height(),
            avg_square_meters: mean(&area),
            avg_price: mean(&price),
            median_price: quantile(&price, 0.5),
        })
    }
}

/// Equal-width bin counts; `edges` has one more entry than `counts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    fn equal_width(values: &[f64], nbins: usize) -> Result<Self> {
        if nbins == 0 {
            return Err(FlatpriceError::invalid_parameter(
                "nbins",
                0,
                "a histogram needs at least one bin",
            ));
        }
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let Some(mut lo) = finite.iter().copied().reduce(f64::min) else {
            return Ok(Self {
                edges: Vec::new(),
                counts: Vec::new(),
            });
        };
        let mut hi = finite.iter().copied().fold(lo, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / nbins as f64;
        let edges: Vec<f64> = (0..=nbins)
            .map(|i| if i == nbins { hi } else { lo + width * i as f64 })
            .collect();
        Ok(Self {
            edges,
            counts: vec![0; nbins],
        })
    }

    /// Bin index of `value`; the last bin is closed on the right
    fn bin_of(&self, value: f64) -> Option<usize> {
        let nbins = self.counts.len();
        let (lo, hi) = (*self.edges.first()?, *self.edges.last()?);
        if !value.is_finite() || value < lo || value > hi {
            return None;
        }
        let idx = ((value - lo) / (hi - lo) * nbins as f64).floor() as usize;
        Some(idx.min(nbins - 1))
    }

    fn add(&mut self, values: &[f64]) {
        for &v in values {
            if let Some(idx) = self.bin_of(v) {
                self.counts[idx] += 1;
            }
        }
    }
}

/// Split `[min, max]` of `values` into `nbins` equal-width bins and count.
///
/// Non-finite values are ignored. A constant input gets the range
/// `[v - 0.5, v + 0.5]`. An empty input yields an empty histogram.
pub fn histogram(values: &[f64], nbins: usize) -> Result<Histogram> {
    let mut hist = Histogram::equal_width(values, nbins)?;
    hist.add(values);
    Ok(hist)
}

/// Histogram of `value_col` for each level of `group_col`, on shared bins
pub fn histogram_by(
    df: &DataFrame,
    value_col: &str,
    group_col: &str,
    nbins: usize,
) -> Result<Vec<(String, Histogram)>> {
    let all = column_values(df, value_col)?;
    let template = Histogram::equal_width(&all, nbins)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (group, value) in grouped_values(df, group_col, value_col)? {
        groups.entry(group).or_default().push(value);
    }

    Ok(groups
        .into_iter()
        .map(|(group, values)| {
            let mut hist = template.clone();
            hist.add(&values);
            (group, hist)
        })
        .collect())
}

/// Five-number summary of price per square metre in one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySpread {
    pub city: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Spread of `pricePerSqM` per city, sorted by city name
pub fn price_per_sqm_by_city(df: &DataFrame) -> Result<Vec<CitySpread>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (city, value) in grouped_values(df, "city", super::PRICE_PER_SQM)? {
        groups.entry(city).or_default().push(value);
    }

    Ok(groups
        .into_iter()
        .filter_map(|(city, mut values)| {
            values.sort_by(f64::total_cmp);
            Some(CitySpread {
                count: values.len(),
                min: *values.first()?,
                q1: quantile(&values, 0.25)?,
                median: quantile(&values, 0.5)?,
                q3: quantile(&values, 0.75)?,
                max: *values.last()?,
                city,
            })
        })
        .collect())
}

/// Non-null values of a column as `f64`
pub(crate) fn column_values(df: &DataFrame, col_name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(col_name)
        .map_err(|_| FlatpriceError::Schema(format!("missing column '{}'", col_name)))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().flatten().collect())
}

fn grouped_values(df: &DataFrame, group_col: &str, value_col: &str) -> Result<Vec<(String, f64)>> {
    let groups = df
        .column(group_col)
        .map_err(|_| FlatpriceError::Schema(format!("missing column '{}'", group_col)))?
        .cast(&DataType::String)?;
    let values = df
        .column(value_col)
        .map_err(|_| FlatpriceError::Schema(format!("missing column '{}'", value_col)))?
        .cast(&DataType::Float64)?;

    Ok(groups
        .str()?
        .into_iter()
        .zip(values.f64()?.into_iter())
        .filter_map(|(g, v)| Some((g?.to_string(), v?)))
        .collect())
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Linear-interpolation quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}
