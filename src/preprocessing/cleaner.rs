//! Column and row cleaning

use crate::error::{FlatpriceError, Result};
use crate::schema;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// What a cleaning pass removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_dropped: Vec<String>,
}

impl CleaningReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_in - self.rows_out
    }
}

/// Drops unreliable columns, then every row with a missing value.
///
/// There is no imputation: a row either has every retained value or it goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cleaner {
    drop_columns: Vec<String>,
}

impl Cleaner {
    /// Profile for the regression pipeline: also drops `id`
    pub fn for_modelling() -> Self {
        let mut drop_columns: Vec<String> =
            schema::UNRELIABLE.iter().map(|c| c.to_string()).collect();
        drop_columns.push(schema::ID.to_string());
        Self { drop_columns }
    }

    /// Profile for exploration: keeps `id` to label listings
    pub fn for_exploration() -> Self {
        Self {
            drop_columns: schema::UNRELIABLE.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    /// Drop the configured columns and every incomplete row.
    ///
    /// A frame that already lacks all configured columns is only row-cleaned,
    /// so cleaning a clean frame returns it unchanged. A frame lacking only
    /// some of them is a schema error.
    pub fn clean(&self, df: &DataFrame) -> Result<(DataFrame, CleaningReport)> {
        let present: Vec<&String> = self
            .drop_columns
            .iter()
            .filter(|col| df.column(col.as_str()).is_ok())
            .collect();

        if present.is_empty() {
            tracing::debug!(
                columns = ?self.drop_columns,
                "Drop columns already absent; cleaning rows only"
            );
        } else if present.len() != self.drop_columns.len() {
            let names: Vec<&str> = self.drop_columns.iter().map(|s| s.as_str()).collect();
            schema::require_columns(df, &names)?;
        }

        let mut result = df.clone();
        for col in &present {
            result = result.drop(col.as_str())?;
        }

        let cleaned = Self::drop_incomplete_rows(&result)?;
        let report = CleaningReport {
            rows_in: df.height(),
            rows_out: cleaned.height(),
            columns_dropped: present.iter().map(|s| s.to_string()).collect(),
        };

        if cleaned.height() == 0 {
            return Err(FlatpriceError::DataQuality(format!(
                "cleaning removed all {} rows; every row has at least one missing value",
                report.rows_in
            )));
        }

        if report.rows_removed() > 0 {
            tracing::info!(
                rows_in = report.rows_in,
                rows_out = report.rows_out,
                "Dropped incomplete rows"
            );
        }

        Ok((cleaned, report))
    }

    /// Keep only rows without nulls (or float NaN) in any column.
    pub fn drop_incomplete_rows(df: &DataFrame) -> Result<DataFrame> {
        let mask = Self::complete_rows_mask(df)?;
        Ok(df.filter(&mask)?)
    }

    /// `true` for rows without nulls (or float NaN) in any column
    pub fn complete_rows_mask(df: &DataFrame) -> Result<BooleanChunked> {
        let mut mask = BooleanChunked::full("complete".into(), true, df.height());

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let keep: BooleanChunked = match series.dtype() {
                DataType::Float32 | DataType::Float64 => {
                    let as_f64 = series.cast(&DataType::Float64)?;
                    as_f64
                        .f64()?
                        .into_iter()
                        .map(|v| Some(matches!(v, Some(x) if !x.is_nan())))
                        .collect()
                }
                _ => series.is_not_null(),
            };
            mask = &mask & &keep;
        }

        Ok(mask)
    }
}
