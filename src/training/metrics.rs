//! Regression error metrics

use crate::error::{FlatpriceError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Metrics for one evaluated subset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared
    pub r2: f64,
    /// Number of evaluated rows
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let mse = mean_squared_error(y_true, y_pred)?;
        let mae = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / y_true.len() as f64;

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2: r2_score(y_true, y_pred)?,
            n_samples: y_true.len(),
        })
    }
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.is_empty() {
        return Err(FlatpriceError::Evaluation(
            "cannot evaluate an empty target vector".to_string(),
        ));
    }
    if y_true.len() != y_pred.len() {
        return Err(FlatpriceError::Evaluation(format!(
            "{} predictions for {} targets",
            y_pred.len(),
            y_true.len()
        )));
    }
    Ok(())
}

/// Average of squared differences
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let sse: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(sse / y_true.len() as f64)
}

/// `1 - SS_res / SS_tot`. Undefined, and an error, for constant targets.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;

    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_raw: f64 = y_true.iter().map(|t| t * t).sum();
    if ss_tot <= f64::EPSILON * ss_raw {
        return Err(FlatpriceError::Evaluation(
            "R² is undefined for constant targets".to_string(),
        ));
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    Ok(1.0 - ss_res / ss_tot)
}
