//! Persisted regression model
//!
//! An artifact carries everything needed to score new listings the way the
//! training run scored its validation rows: the feature column order, the
//! category vocabulary, the training scaler statistics and the coefficients.

use crate::config::PipelineConfig;
use crate::error::{FlatpriceError, Result};
use crate::preprocessing::{FeaturePipeline, FeatureTable, ScalerState, StandardScaler, Vocabulary};
use crate::schema;
use crate::training::{LinearRegression, RegressionMetrics};
use chrono::{DateTime, Utc};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Artifact layout version understood by this build
pub const FORMAT_VERSION: u32 = 1;

/// Held-out metrics recorded at training time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetrics {
    pub validation: RegressionMetrics,
    pub test: RegressionMetrics,
}

/// Coefficients expressed in the units of the raw feature columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCoefficients {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RawCoefficients {
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| n == feature)
            .map(|i| self.coefficients[i])
    }
}

/// A fitted model plus the preprocessing state it was trained with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub crate_version: String,
    pub trained_at: DateTime<Utc>,
    pub target_column: String,
    /// Feature column order expected by `coefficients`
    pub feature_names: Vec<String>,
    /// Coefficients on standardized features
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler: ScalerState,
    pub vocabulary: Vocabulary,
    pub config: PipelineConfig,
    pub metrics: Option<ArtifactMetrics>,
}

impl ModelArtifact {
    /// Bundle a fitted model with its preprocessing state
    pub fn new(
        feature_names: Vec<String>,
        model: &LinearRegression,
        scaler: &StandardScaler,
        vocabulary: Vocabulary,
        config: PipelineConfig,
    ) -> Result<Self> {
        let coefficients = model.coefficients.as_ref().ok_or(FlatpriceError::NotFitted)?;
        let intercept = model.intercept.ok_or(FlatpriceError::NotFitted)?;
        let scaler = scaler.state().ok_or(FlatpriceError::NotFitted)?.clone();

        let artifact = Self {
            format_version: FORMAT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Utc::now(),
            target_column: config.target_column.clone(),
            feature_names,
            coefficients: coefficients.to_vec(),
            intercept,
            scaler,
            vocabulary,
            config,
            metrics: None,
        };
        artifact.check_consistency()?;
        Ok(artifact)
    }

    pub fn with_metrics(mut self, validation: RegressionMetrics, test: RegressionMetrics) -> Self {
        self.metrics = Some(ArtifactMetrics { validation, test });
        self
    }

    /// Write the artifact as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), features = self.feature_names.len(), "Saved model");
        Ok(())
    }

    /// Read an artifact written by `save`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let artifact: Self = serde_json::from_reader(reader)?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(FlatpriceError::Serialization(format!(
                "unsupported model format version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }
        artifact.check_consistency()?;

        tracing::info!(
            path = %path.display(),
            trained_at = %artifact.trained_at,
            "Loaded model"
        );
        Ok(artifact)
    }

    fn check_consistency(&self) -> Result<()> {
        let n = self.feature_names.len();
        if self.coefficients.len() != n || self.scaler.means.len() != n {
            return Err(FlatpriceError::Serialization(format!(
                "{} feature names, {} coefficients, {} scaler columns",
                n,
                self.coefficients.len(),
                self.scaler.means.len()
            )));
        }

        let expected: Vec<String> = schema::NUMERIC_FEATURES
            .iter()
            .chain(schema::BINARY.iter())
            .map(|s| s.to_string())
            .chain(self.vocabulary.indicator_names())
            .collect();
        if expected != self.feature_names {
            return Err(FlatpriceError::Serialization(
                "feature names do not match the stored vocabulary".to_string(),
            ));
        }
        Ok(())
    }

    fn model(&self) -> LinearRegression {
        LinearRegression::from_parameters(Array1::from(self.coefficients.clone()), self.intercept)
            .with_feature_names(self.feature_names.clone())
    }

    /// Predict for an encoded table with this artifact's column layout
    pub fn predict_table(&self, table: &FeatureTable) -> Result<Array1<f64>> {
        if table.feature_names != self.feature_names {
            return Err(FlatpriceError::Shape {
                expected: format!("{} features in training order", self.feature_names.len()),
                actual: format!("{} features", table.feature_names.len()),
            });
        }
        let scaler = StandardScaler::from_state(self.scaler.clone())?;
        let x = scaler.transform(&table.features)?;
        self.model().predict(&x)
    }

    /// Predict prices for raw listings.
    ///
    /// Incomplete rows are skipped. The result has a `predicted_<target>`
    /// column, preceded by `id` when the input carries one.
    pub fn predict_frame(&self, df: &DataFrame) -> Result<DataFrame> {
        let pipeline = FeaturePipeline::new(self.config.unknown_category);
        let input = pipeline.prepare_for_prediction(df)?;
        if input.frame.height() == 0 {
            return Err(FlatpriceError::DataQuality(format!(
                "none of the {} listings is complete enough to score",
                input.rows_in
            )));
        }

        let table = pipeline.build_table(&input.frame, &self.vocabulary, None)?;
        let predictions = self.predict_table(&table)?;

        let mut columns = Vec::with_capacity(2);
        if let Some(ids) = input.ids {
            columns.push(Column::new(schema::ID.into(), ids));
        }
        columns.push(Column::new(
            format!("predicted_{}", self.target_column).into(),
            predictions.to_vec(),
        ));

        tracing::info!(rows = table.n_rows(), skipped = input.rows_in - table.n_rows(), "Scored listings");
        Ok(DataFrame::new(columns)?)
    }

    /// Undo the standardization: `β_raw = β / σ`, `b_raw = b - Σ β·μ/σ`
    pub fn raw_coefficients(&self) -> RawCoefficients {
        let mut intercept = self.intercept;
        let coefficients: Vec<f64> = self
            .coefficients
            .iter()
            .zip(self.scaler.means.iter().zip(self.scaler.scales.iter()))
            .map(|(beta, (mean, scale))| {
                let raw = beta / scale;
                intercept -= raw * mean;
                raw
            })
            .collect();

        RawCoefficients {
            feature_names: self.feature_names.clone(),
            coefficients,
            intercept,
        }
    }
}
