//! Binary flag mapping and drop-first one-hot encoding

use crate::config::UnknownCategoryPolicy;
use crate::error::{FlatpriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Values outside `yes`/`no` seen per binary column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryMappingReport {
    pub unmapped: BTreeMap<String, usize>,
}

impl BinaryMappingReport {
    pub fn total_unmapped(&self) -> usize {
        self.unmapped.values().sum()
    }
}

/// Map literal `yes`/`no` columns to booleans.
///
/// Any other value, including a null, becomes null. A boolean column is read
/// as its text form, so `true`/`false` count as unmapped.
pub fn map_binary_columns(
    df: &DataFrame,
    columns: &[&str],
) -> Result<(DataFrame, BinaryMappingReport)> {
    let mut result = df.clone();
    let mut report = BinaryMappingReport::default();

    for col_name in columns {
        let column = df
            .column(col_name)
            .map_err(|_| FlatpriceError::Schema(format!("missing binary column '{}'", col_name)))?;
        let as_text = column.cast(&DataType::String)?;
        let ca = as_text.str()?;

        let mut unmapped = 0usize;
        let mapped: BooleanChunked = ca
            .into_iter()
            .map(|v| match v {
                Some("yes") => Some(true),
                Some("no") => Some(false),
                Some(_) => {
                    unmapped += 1;
                    None
                }
                None => None,
            })
            .collect();

        if unmapped > 0 {
            tracing::warn!(column = %col_name, count = unmapped, "Unmapped values in yes/no column");
            report.unmapped.insert(col_name.to_string(), unmapped);
        }

        result.with_column(mapped.with_name((*col_name).into()).into_series())?;
    }

    Ok((result, report))
}

/// Observed levels of one categorical column, sorted; the first is the reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevels {
    pub column: String,
    pub levels: Vec<String>,
}

impl CategoryLevels {
    /// The level represented by all indicators being zero
    pub fn reference(&self) -> Option<&str> {
        self.levels.first().map(|s| s.as_str())
    }

    /// Levels that get their own indicator column
    pub fn encoded_levels(&self) -> &[String] {
        if self.levels.is_empty() {
            &[]
        } else {
            &self.levels[1..]
        }
    }

    fn indicator_name(&self, level: &str) -> String {
        format!("{}_{}", self.column, level)
    }
}

/// Category vocabulary for drop-first one-hot encoding.
///
/// Fitted once on the full cleaned table and persisted with the model, so
/// train, validation, test and future inputs share one column layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    columns: Vec<CategoryLevels>,
}

impl Vocabulary {
    /// Record the distinct non-null values of each column
    pub fn fit(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let mut levels = Vec::with_capacity(columns.len());

        for col_name in columns {
            let column = df.column(col_name).map_err(|_| {
                FlatpriceError::Schema(format!("missing categorical column '{}'", col_name))
            })?;
            let as_text = column.cast(&DataType::String)?;
            let distinct: BTreeSet<String> = as_text
                .str()?
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();

            tracing::debug!(column = %col_name, levels = distinct.len(), "Fitted category levels");
            levels.push(CategoryLevels {
                column: col_name.to_string(),
                levels: distinct.into_iter().collect(),
            });
        }

        Ok(Self { columns: levels })
    }

    pub fn columns(&self) -> &[CategoryLevels] {
        &self.columns
    }

    pub fn levels(&self, column: &str) -> Option<&CategoryLevels> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Output column names in encoding order
    pub fn indicator_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| c.encoded_levels().iter().map(move |l| c.indicator_name(l)))
            .collect()
    }

    /// Build the indicator columns for `df` as `(name, values)` pairs.
    ///
    /// A null value is a data-quality error. A value absent from the
    /// vocabulary is handled according to `unknown`.
    pub fn indicators(
        &self,
        df: &DataFrame,
        unknown: UnknownCategoryPolicy,
    ) -> Result<Vec<(String, Vec<f64>)>> {
        let mut out = Vec::new();

        for levels in &self.columns {
            let column = df.column(&levels.column).map_err(|_| {
                FlatpriceError::Schema(format!("missing categorical column '{}'", levels.column))
            })?;
            let as_text = column.cast(&DataType::String)?;
            let values: Vec<Option<&str>> = as_text.str()?.into_iter().collect();

            if values.iter().any(|v| v.is_none()) {
                return Err(FlatpriceError::DataQuality(format!(
                    "categorical column '{}' contains missing values",
                    levels.column
                )));
            }

            let unseen: BTreeSet<&str> = values
                .iter()
                .flatten()
                .copied()
                .filter(|v| !levels.levels.iter().any(|l| l.as_str() == *v))
                .collect();
            if !unseen.is_empty() {
                match unknown {
                    UnknownCategoryPolicy::Reject => {
                        return Err(FlatpriceError::Schema(format!(
                            "column '{}' has values outside the training vocabulary: {}",
                            levels.column,
                            unseen.into_iter().collect::<Vec<_>>().join(", ")
                        )));
                    }
                    UnknownCategoryPolicy::Ignore => {
                        tracing::warn!(
                            column = %levels.column,
                            values = ?unseen,
                            "Unseen categories encoded as the reference level"
                        );
                    }
                }
            }

            for level in levels.encoded_levels() {
                let indicator: Vec<f64> = values
                    .iter()
                    .map(|v| if *v == Some(level.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                out.push((levels.indicator_name(level), indicator));
            }
        }

        Ok(out)
    }
}
