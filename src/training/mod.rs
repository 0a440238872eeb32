//! Model training module
//!
//! Provides the regression side of the pipeline:
//! - Seeded train/validation/test partitioning
//! - Ordinary least squares (Householder QR)
//! - Regression metrics (MSE, RMSE, MAE, R²)
//! - The training engine tying preprocessing and fitting together

mod engine;
pub mod linear_models;
pub mod metrics;
pub mod split;

pub use engine::{TrainEngine, TrainingOutcome};
pub use linear_models::LinearRegression;
pub use metrics::{mean_squared_error, r2_score, RegressionMetrics};
pub use split::{Partition, PartitionSizes, PartitionedTables, Splitter};
