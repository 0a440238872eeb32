//! Pipeline configuration

use crate::error::{FlatpriceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the scaler does with a training column whose standard deviation is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroVariancePolicy {
    /// Fail the fit with a `Fit` error naming the columns
    Reject,
    /// Divide by 1.0 instead and record the column as constant
    UnitScale,
}

/// How prediction-time categorical values missing from the vocabulary are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownCategoryPolicy {
    /// Encode as all-zero indicators (the reference level) and log a warning
    Ignore,
    /// Fail with a `Schema` error
    Reject,
}

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target column name
    pub target_column: String,

    /// Fraction of all rows withheld from training
    pub holdout_fraction: f64,

    /// Fraction of the holdout that becomes the test set
    pub test_fraction: f64,

    /// Seed for both split draws
    pub seed: u64,

    pub zero_variance: ZeroVariancePolicy,

    pub unknown_category: UnknownCategoryPolicy,

    /// Rows polars inspects when inferring column types
    pub infer_schema_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: crate::schema::TARGET.to_string(),
            holdout_fraction: 0.2,
            test_fraction: 0.2,
            seed: 100,
            zero_variance: ZeroVariancePolicy::Reject,
            unknown_category: UnknownCategoryPolicy::Ignore,
            infer_schema_rows: 10_000,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FlatpriceError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| FlatpriceError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_zero_variance(mut self, policy: ZeroVariancePolicy) -> Self {
        self.zero_variance = policy;
        self
    }

    pub fn with_unknown_category(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_category = policy;
        self
    }

    pub fn with_infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = rows;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("holdout_fraction", self.holdout_fraction),
            ("test_fraction", self.test_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(FlatpriceError::invalid_parameter(
                    name,
                    value,
                    "must lie strictly between 0 and 1",
                ));
            }
        }
        if self.target_column.is_empty() {
            return Err(FlatpriceError::invalid_parameter(
                "target_column",
                "\"\"",
                "must name a column",
            ));
        }
        if crate::schema::feature_source_columns()
            .iter()
            .any(|c| *c == self.target_column)
        {
            return Err(FlatpriceError::invalid_parameter(
                "target_column",
                &self.target_column,
                "is a model feature",
            ));
        }
        if self.infer_schema_rows == 0 {
            return Err(FlatpriceError::invalid_parameter(
                "infer_schema_rows",
                0,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
