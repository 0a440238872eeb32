//! Feature preparation pipeline: clean → cast → map flags → one-hot → matrix

use super::{
    cleaner::{Cleaner, CleaningReport},
    encoder::{map_binary_columns, BinaryMappingReport, Vocabulary},
};
use crate::config::UnknownCategoryPolicy;
use crate::error::{FlatpriceError, Result};
use crate::schema;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Encoded numeric representation of a set of listings
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    /// Column names of `features`, in order
    pub feature_names: Vec<String>,
    /// One row per listing
    pub features: Array2<f64>,
    /// Target values, absent for prediction inputs
    pub target: Option<Array1<f64>>,
}

impl FeatureTable {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Rows `indices` in the given order, with the same columns
    pub fn select_rows(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            feature_names: self.feature_names.clone(),
            features: self.features.select(Axis(0), indices),
            target: self.target.as_ref().map(|t| t.select(Axis(0), indices)),
        }
    }

    /// Target vector, or a schema error when the table has none
    pub fn target(&self) -> Result<&Array1<f64>> {
        self.target
            .as_ref()
            .ok_or_else(|| FlatpriceError::Schema("feature table has no target column".to_string()))
    }
}

/// What preparation removed or flagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparationReport {
    pub cleaning: CleaningReport,
    pub binary: BinaryMappingReport,
    /// Rows left after unmapped binary values were dropped
    pub rows_out: usize,
}

/// A prepared prediction input: the cleaned frame plus the ids of retained rows
///
/// `ids` is `None` when the input has no `id` column.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub frame: DataFrame,
    pub ids: Option<Vec<Option<String>>>,
    pub rows_in: usize,
}

/// Ordered feature preparation shared by training and prediction
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    cleaner: Cleaner,
    unknown_category: UnknownCategoryPolicy,
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self::new(UnknownCategoryPolicy::Ignore)
    }
}

impl FeaturePipeline {
    pub fn new(unknown_category: UnknownCategoryPolicy) -> Self {
        Self {
            cleaner: Cleaner::for_modelling(),
            unknown_category,
        }
    }

    /// Clean a raw training frame and normalise its column types.
    ///
    /// Binary flags are mapped after cleaning; a row whose flag was neither
    /// `yes` nor `no` is then dropped under the same no-missing-values rule.
    pub fn prepare(&self, df: &DataFrame, target: &str) -> Result<(DataFrame, PreparationReport)> {
        schema::require_columns(df, &[target])?;

        let (cleaned, cleaning) = self.cleaner.clean(df)?;
        let typed = coerce_types(&cleaned)?;
        let (mapped, binary) = map_binary_columns(&typed, &present(&typed, &schema::BINARY))?;

        let prepared = if binary.total_unmapped() > 0 {
            let kept = Cleaner::drop_incomplete_rows(&mapped)?;
            tracing::warn!(
                dropped = mapped.height() - kept.height(),
                "Dropped rows with unmapped yes/no values"
            );
            kept
        } else {
            mapped
        };

        if prepared.height() == 0 {
            return Err(FlatpriceError::DataQuality(
                "no rows left after mapping yes/no columns".to_string(),
            ));
        }

        let report = PreparationReport {
            cleaning,
            binary,
            rows_out: prepared.height(),
        };
        tracing::info!(rows = report.rows_out, columns = prepared.width(), "Prepared listings");
        Ok((prepared, report))
    }

    /// Prepare a prediction input: feature sources only, incomplete rows dropped.
    ///
    /// Completeness is judged on the feature sources; a missing `id` keeps
    /// the row and comes out as a null id.
    pub fn prepare_for_prediction(&self, df: &DataFrame) -> Result<PreparedInput> {
        let sources = schema::feature_source_columns();
        schema::require_columns(df, &sources)?;

        let typed = coerce_types(&df.select(sources)?)?;
        let (mapped, _) = map_binary_columns(&typed, &schema::BINARY)?;
        let mask = Cleaner::complete_rows_mask(&mapped)?;
        let complete = mapped.filter(&mask)?;

        let dropped = df.height() - complete.height();
        if dropped > 0 {
            tracing::warn!(dropped, "Skipping incomplete listings during prediction");
        }

        let ids = match df.column(schema::ID) {
            Ok(column) => {
                let as_text = column.cast(&DataType::String)?.filter(&mask)?;
                let ids: Vec<Option<String>> = as_text
                    .str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect();
                Some(ids)
            }
            Err(_) => None,
        };

        Ok(PreparedInput {
            frame: complete,
            ids,
            rows_in: df.height(),
        })
    }

    /// Fit the category vocabulary on a prepared frame
    pub fn fit_vocabulary(&self, prepared: &DataFrame) -> Result<Vocabulary> {
        Vocabulary::fit(prepared, &schema::CATEGORICAL)
    }

    /// Build the numeric feature table for a prepared frame.
    ///
    /// Columns: numeric features, then yes/no flags as 0/1, then indicators.
    pub fn build_table(
        &self,
        prepared: &DataFrame,
        vocabulary: &Vocabulary,
        target: Option<&str>,
    ) -> Result<FeatureTable> {
        let n_rows = prepared.height();
        let mut names: Vec<String> = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for col_name in schema::NUMERIC_FEATURES {
            names.push(col_name.to_string());
            columns.push(numeric_values(prepared, col_name)?);
        }

        for col_name in schema::BINARY {
            let column = prepared
                .column(col_name)
                .map_err(|_| FlatpriceError::Schema(format!("missing column '{}'", col_name)))?;
            let values = column
                .bool()?
                .into_iter()
                .map(|v| match v {
                    Some(true) => Ok(1.0),
                    Some(false) => Ok(0.0),
                    None => Err(FlatpriceError::DataQuality(format!(
                        "column '{}' has missing values",
                        col_name
                    ))),
                })
                .collect::<Result<Vec<f64>>>()?;
            names.push(col_name.to_string());
            columns.push(values);
        }

        for (name, values) in vocabulary.indicators(prepared, self.unknown_category)? {
            names.push(name);
            columns.push(values);
        }

        let features = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| columns[c][r]);
        let target = match target {
            Some(t) => Some(Array1::from(numeric_values(prepared, t)?)),
            None => None,
        };

        Ok(FeatureTable {
            feature_names: names,
            features,
            target,
        })
    }

    /// Prepare, fit the vocabulary on the full table and encode it
    pub fn fit_transform(
        &self,
        df: &DataFrame,
        target: &str,
    ) -> Result<(FeatureTable, Vocabulary, PreparationReport)> {
        let (prepared, report) = self.prepare(df, target)?;
        let vocabulary = self.fit_vocabulary(&prepared)?;
        let table = self.build_table(&prepared, &vocabulary, Some(target))?;
        tracing::info!(
            rows = table.n_rows(),
            features = table.n_features(),
            "Encoded feature table"
        );
        Ok((table, vocabulary, report))
    }
}

/// Cast numeric columns to Float64 (strictly) and categorical columns to String
pub(crate) fn coerce_types(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();

    for col_name in schema::numeric_columns() {
        let Ok(column) = df.column(col_name) else {
            continue;
        };
        let series = column.as_materialized_series();
        if series.dtype() == &DataType::Float64 {
            continue;
        }
        let casted = series.strict_cast(&DataType::Float64).map_err(|e| {
            FlatpriceError::Schema(format!("column '{}' is not numeric: {}", col_name, e))
        })?;
        result.with_column(casted)?;
    }

    for col_name in schema::CATEGORICAL {
        let Ok(column) = df.column(col_name) else {
            continue;
        };
        if column.dtype() != &DataType::String {
            let casted = column.as_materialized_series().cast(&DataType::String)?;
            result.with_column(casted)?;
        }
    }

    Ok(result)
}

fn present<'a>(df: &DataFrame, columns: &[&'a str]) -> Vec<&'a str> {
    columns
        .iter()
        .copied()
        .filter(|c| df.column(c).is_ok())
        .collect()
}

fn numeric_values(df: &DataFrame, col_name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(col_name)
        .map_err(|_| FlatpriceError::Schema(format!("missing column '{}'", col_name)))?;
    let as_f64 = column.cast(&DataType::Float64)?;
    as_f64
        .f64()?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                FlatpriceError::DataQuality(format!("column '{}' has missing values", col_name))
            })
        })
        .collect()
}
