//! Standardization of feature matrices

use crate::config::ZeroVariancePolicy;
use crate::error::{FlatpriceError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted per-column statistics. Written once by `fit`, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    /// Column means of the training matrix
    pub means: Array1<f64>,
    /// Divisors: population standard deviations, or 1.0 for constant columns
    pub scales: Array1<f64>,
    /// Indices of columns whose training standard deviation was zero
    pub constant_columns: Vec<usize>,
}

/// Z-score scaler: `(x - mean) / std` with population standard deviation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    policy: ZeroVariancePolicy,
    state: Option<ScalerState>,
}

impl StandardScaler {
    /// Create an unfitted scaler
    pub fn new(policy: ZeroVariancePolicy) -> Self {
        Self {
            policy,
            state: None,
        }
    }

    /// Rebuild a fitted scaler from persisted statistics
    pub fn from_state(state: ScalerState) -> Result<Self> {
        if state.means.len() != state.scales.len() {
            return Err(FlatpriceError::Shape {
                expected: format!("{} scales", state.means.len()),
                actual: format!("{} scales", state.scales.len()),
            });
        }
        if state.scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(FlatpriceError::Serialization(
                "scaler state holds a non-positive divisor".to_string(),
            ));
        }
        Ok(Self {
            policy: ZeroVariancePolicy::UnitScale,
            state: Some(state),
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&ScalerState> {
        self.state.as_ref()
    }

    /// Compute column statistics from the training matrix.
    ///
    /// `names` labels the columns in error messages and logs.
    pub fn fit(&mut self, x: &Array2<f64>, names: &[String]) -> Result<&mut Self> {
        if self.state.is_some() {
            return Err(FlatpriceError::invalid_parameter(
                "scaler",
                "fitted",
                "already fitted; statistics are computed once from the training partition",
            ));
        }
        if names.len() != x.ncols() {
            return Err(FlatpriceError::Shape {
                expected: format!("{} column names", x.ncols()),
                actual: format!("{} column names", names.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(FlatpriceError::Fit(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(FlatpriceError::Fit(
                "feature matrix contains non-finite values".to_string(),
            ));
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| FlatpriceError::Fit("cannot compute column means".to_string()))?;
        let stds = x.std_axis(Axis(0), 0.0);

        let constant_columns: Vec<usize> = stds
            .iter()
            .zip(means.iter())
            .enumerate()
            .filter(|(_, (std, mean))| **std <= 1e-12 * mean.abs().max(1.0))
            .map(|(idx, _)| idx)
            .collect();

        if !constant_columns.is_empty() {
            let constant_names: Vec<&str> =
                constant_columns.iter().map(|&i| names[i].as_str()).collect();
            match self.policy {
                ZeroVariancePolicy::Reject => {
                    return Err(FlatpriceError::Fit(format!(
                        "zero variance in training column(s): {}",
                        constant_names.join(", ")
                    )));
                }
                ZeroVariancePolicy::UnitScale => {
                    tracing::warn!(
                        columns = ?constant_names,
                        "Zero-variance training columns scaled with divisor 1.0"
                    );
                }
            }
        }

        let mut scales = stds;
        for &idx in &constant_columns {
            scales[idx] = 1.0;
        }

        self.state = Some(ScalerState {
            means,
            scales,
            constant_columns,
        });
        Ok(self)
    }

    /// Standardize `x` with the stored statistics
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let state = self.checked_state(x)?;
        Ok((x - &state.means) / &state.scales)
    }

    /// Fit on `x` and return it standardized
    pub fn fit_transform(&mut self, x: &Array2<f64>, names: &[String]) -> Result<Array2<f64>> {
        self.fit(x, names)?;
        self.transform(x)
    }

    /// Map standardized values back to original units
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let state = self.checked_state(x)?;
        Ok(x * &state.scales + &state.means)
    }

    fn checked_state(&self, x: &Array2<f64>) -> Result<&ScalerState> {
        let state = self.state.as_ref().ok_or(FlatpriceError::NotFitted)?;
        if x.ncols() != state.means.len() {
            return Err(FlatpriceError::Shape {
                expected: format!("{} columns", state.means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(state)
    }
}
