//! Training engine implementation

use super::linear_models::LinearRegression;
use super::metrics::RegressionMetrics;
use super::split::{PartitionSizes, Splitter};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::ModelArtifact;
use crate::preprocessing::{FeaturePipeline, PreparationReport, StandardScaler};
use polars::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Everything a training run produces
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub validation: RegressionMetrics,
    pub test: RegressionMetrics,
    pub partition_sizes: PartitionSizes,
    pub preparation: PreparationReport,
    pub training_time_secs: f64,
}

/// Main training engine: prepare → encode → split → scale → fit → evaluate
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: PipelineConfig,
}

impl Default for TrainEngine {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline on a raw listings frame.
    ///
    /// The vocabulary comes from the full cleaned table; scaler statistics
    /// come from the training partition only and are then applied unchanged
    /// to validation and test rows.
    pub fn run(&self, df: &DataFrame) -> Result<TrainingOutcome> {
        let start = Instant::now();
        self.config.validate()?;
        let target = self.config.target_column.as_str();

        let pipeline = FeaturePipeline::new(self.config.unknown_category);
        let (table, vocabulary, preparation) = pipeline.fit_transform(df, target)?;

        let splitter = Splitter::new(
            self.config.holdout_fraction,
            self.config.test_fraction,
            self.config.seed,
        )?;
        let partition = splitter.split(table.n_rows())?;
        let parts = partition.take(&table)?;

        let mut scaler = StandardScaler::new(self.config.zero_variance);
        let x_train = scaler.fit_transform(&parts.train.features, &table.feature_names)?;
        let x_validation = scaler.transform(&parts.validation.features)?;
        let x_test = scaler.transform(&parts.test.features)?;
        tracing::info!(features = table.n_features(), "Standardized features");

        let mut model = LinearRegression::new().with_feature_names(table.feature_names.clone());
        model.fit(&x_train, parts.train.target()?)?;
        tracing::info!(samples = x_train.nrows(), "Fitted least squares model");

        let validation =
            RegressionMetrics::compute(parts.validation.target()?, &model.predict(&x_validation)?)?;
        let test = RegressionMetrics::compute(parts.test.target()?, &model.predict(&x_test)?)?;
        tracing::info!(
            validation_mse = validation.mse,
            validation_r2 = validation.r2,
            test_mse = test.mse,
            test_r2 = test.r2,
            "Evaluated model"
        );

        let artifact = ModelArtifact::new(
            table.feature_names.clone(),
            &model,
            &scaler,
            vocabulary,
            self.config.clone(),
        )?
        .with_metrics(validation, test);

        Ok(TrainingOutcome {
            artifact,
            validation,
            test,
            partition_sizes: partition.sizes(),
            preparation,
            training_time_secs: start.elapsed().as_secs_f64(),
        })
    }
}
