//! flatprice - Apartment price modelling
//!
//! This crate provides a small, deterministic pipeline for apartment listings:
//! - Loading and schema-checking listing CSVs
//! - Cleaning, yes/no flag mapping and drop-first one-hot encoding
//! - Seeded train/validation/test partitioning
//! - Standardization fitted on the training partition only
//! - Ordinary least squares with MSE/R² evaluation
//! - Persisted model artifacts for scoring new listings
//! - Filters, summaries and histograms for exploring listings
//!
//! # Modules
//!
//! ## Core
//! - [`schema`] - Column catalogue of the listings dataset
//! - [`preprocessing`] - Cleaning, encoding, scaling
//! - [`training`] - Splitting, fitting, evaluation
//! - [`export`] - Model artifacts
//!
//! ## Exploration
//! - [`explore`] - Listing filters, summary statistics, histograms
//!
//! ## Services
//! - [`cli`] - Command-line interface
//!
//! ## Utilities
//! - [`config`] - Pipeline configuration
//! - [`utils`] - CSV loading and saving

// Core error handling
pub mod error;

// Core pipeline
pub mod config;
pub mod schema;
pub mod preprocessing;
pub mod training;
pub mod export;

// Exploration
pub mod explore;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{FlatpriceError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{FlatpriceError, Result};

    // Configuration
    pub use crate::config::{PipelineConfig, UnknownCategoryPolicy, ZeroVariancePolicy};

    // Preprocessing
    pub use crate::preprocessing::{Cleaner, FeaturePipeline, FeatureTable, StandardScaler, Vocabulary};

    // Training
    pub use crate::training::{LinearRegression, RegressionMetrics, Splitter, TrainEngine, TrainingOutcome};

    // Export
    pub use crate::export::ModelArtifact;

    // Exploration
    pub use crate::explore::{DashboardReport, FilterOptions, ListingFilter, SummaryStats};

    // Loading
    pub use crate::utils::{ListingLoader, LoadPurpose};
}
