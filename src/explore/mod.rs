//! Exploration of the listings table
//!
//! The data layer behind an interactive listings dashboard: a cleaned table
//! with a derived price per square metre, listing filters, summary figures,
//! histograms and per-city price spreads. Rendering is left to the caller.

mod filter;
mod stats;

pub use filter::{Amenity, ListingFilter};
pub use stats::{
    histogram, histogram_by, price_per_sqm_by_city, CitySpread, Histogram, SummaryStats,
};

use crate::error::{FlatpriceError, Result};
use crate::preprocessing::{coerce_types, map_binary_columns, Cleaner};
use crate::schema;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Derived column: price divided by area, truncated to a whole number
pub const PRICE_PER_SQM: &str = "pricePerSqM";

/// Bins used for the distance-to-amenity histograms
pub const DISTANCE_BINS: usize = 30;

/// Distance columns shown as histograms
pub const DISTANCE_COLUMNS: [&str; 7] = [
    "schoolDistance",
    "clinicDistance",
    "postOfficeDistance",
    "kindergartenDistance",
    "restaurantDistance",
    "collegeDistance",
    "pharmacyDistance",
];

/// Clean a raw listings frame for exploration.
///
/// Drops the unreliable columns and incomplete rows (keeping `id`), casts
/// numeric and categorical columns, maps the `yes`/`no` flags, stores room
/// counts as integers and adds `pricePerSqM`.
pub fn prepare(df: &DataFrame) -> Result<DataFrame> {
    let (cleaned, report) = Cleaner::for_exploration().clean(df)?;
    let typed = coerce_types(&cleaned)?;
    let (mut prepared, _) = map_binary_columns(&typed, &schema::BINARY)?;

    let rooms = prepared.column("rooms")?.cast(&DataType::Int64)?;
    prepared.with_column(rooms)?;

    let price_per_sqm: Int64Chunked = {
        let price = prepared.column(schema::TARGET)?.f64()?;
        let area = prepared.column("squareMeters")?.f64()?;
        price
            .into_iter()
            .zip(area.into_iter())
            .map(|(p, a)| match (p, a) {
                (Some(p), Some(a)) if a != 0.0 && (p / a).is_finite() => {
                    Some((p / a).trunc() as i64)
                }
                _ => None,
            })
            .collect()
    };
    prepared.with_column(price_per_sqm.with_name(PRICE_PER_SQM.into()).into_series())?;

    tracing::info!(
        rows = prepared.height(),
        dropped = report.rows_removed(),
        "Prepared listings for exploration"
    );
    Ok(prepared)
}

/// Choices available for each filter criterion on a prepared frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub types: Vec<String>,
    pub rooms: Vec<i64>,
    pub price_range: Option<(f64, f64)>,
    pub area_range: Option<(f64, f64)>,
}

impl FilterOptions {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let rooms: BTreeSet<i64> = df
            .column("rooms")?
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .flatten()
            .collect();

        Ok(Self {
            cities: distinct_text(df, "city")?,
            types: distinct_text(df, "type")?,
            rooms: rooms.into_iter().collect(),
            price_range: value_range(&stats::column_values(df, schema::TARGET)?),
            area_range: value_range(&stats::column_values(df, "squareMeters")?),
        })
    }
}

/// Everything a dashboard shows for one selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub filter: ListingFilter,
    pub summary: SummaryStats,
    pub price: Histogram,
    pub area: Histogram,
    pub build_year: Histogram,
    pub build_year_by_type: Vec<(String, Histogram)>,
    pub price_per_sqm_by_city: Vec<CitySpread>,
    pub distances: Vec<(String, Histogram)>,
}

impl DashboardReport {
    /// Filter a prepared frame and compute every figure with `nbins` bins
    pub fn build(df: &DataFrame, filter: &ListingFilter, nbins: usize) -> Result<Self> {
        if nbins == 0 {
            return Err(FlatpriceError::invalid_parameter(
                "nbins",
                0,
                "a histogram needs at least one bin",
            ));
        }
        let selected = filter.apply(df)?;

        let distances = DISTANCE_COLUMNS
            .iter()
            .map(|col| {
                let values = stats::column_values(&selected, col)?;
                Ok((col.to_string(), histogram(&values, DISTANCE_BINS)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            filter: filter.clone(),
            summary: SummaryStats::compute(&selected)?,
            price: histogram(&stats::column_values(&selected, schema::TARGET)?, nbins)?,
            area: histogram(&stats::column_values(&selected, "squareMeters")?, nbins)?,
            build_year: histogram(&stats::column_values(&selected, "buildYear")?, nbins)?,
            build_year_by_type: histogram_by(&selected, "buildYear", "type", nbins)?,
            price_per_sqm_by_city: price_per_sqm_by_city(&selected)?,
            distances,
        })
    }
}

fn distinct_text(df: &DataFrame, col_name: &str) -> Result<Vec<String>> {
    let column = df.column(col_name)?.cast(&DataType::String)?;
    let values: BTreeSet<String> = column
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect();
    Ok(values.into_iter().collect())
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;
    Some((min, max))
}
