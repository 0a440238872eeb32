//! Ordinary least squares regression

use crate::error::{FlatpriceError, Result};
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Column norm ratio below which a column counts as a combination of earlier ones
const COLLINEARITY_TOLERANCE: f64 = 1e-10;

/// Solve the least squares problem `min ||a·β - b||` by Householder QR.
///
/// `a` and `b` are overwritten with `R` and `Qᵀb`. Requires `a.nrows() > a.ncols()`.
fn householder_least_squares(
    a: &mut Array2<f64>,
    b: &mut Array1<f64>,
    names: &[&str],
) -> Result<Array1<f64>> {
    let p = a.ncols();
    let original_norms: Vec<f64> = a.columns().into_iter().map(|c| c.dot(&c).sqrt()).collect();

    for k in 0..p {
        let norm = {
            let col = a.slice(s![k.., k]);
            col.dot(&col).sqrt()
        };
        if norm <= COLLINEARITY_TOLERANCE * original_norms[k] {
            return Err(FlatpriceError::Fit(format!(
                "feature '{}' is a linear combination of earlier features; the design matrix is rank deficient",
                names[k]
            )));
        }

        let alpha = if a[[k, k]] > 0.0 { -norm } else { norm };
        let mut v = a.slice(s![k.., k]).to_owned();
        v[0] -= alpha;
        let v_norm2 = v.dot(&v);

        for j in k..p {
            let proj = 2.0 * v.dot(&a.slice(s![k.., j])) / v_norm2;
            a.slice_mut(s![k.., j]).scaled_add(-proj, &v);
        }
        let proj = 2.0 * v.dot(&b.slice(s![k..])) / v_norm2;
        b.slice_mut(s![k..]).scaled_add(-proj, &v);
    }

    // Back substitution on the upper triangle
    let mut beta = Array1::zeros(p);
    for i in (0..p).rev() {
        let mut sum = b[i];
        for j in (i + 1)..p {
            sum -= a[[i, j]] * beta[j];
        }
        beta[i] = sum / a[[i, i]];
    }

    Ok(beta)
}

/// Linear Regression (Ordinary Least Squares) with an intercept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients, one per input column
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Column names used in error messages
    pub feature_names: Vec<String>,
    /// Columns excluded from the solve for having zero variance
    pub excluded: Vec<usize>,
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the input columns
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = names;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Rebuild a fitted model from stored parameters
    pub fn from_parameters(coefficients: Array1<f64>, intercept: f64) -> Self {
        Self {
            coefficients: Some(coefficients),
            intercept: Some(intercept),
            feature_names: Vec::new(),
            excluded: Vec::new(),
        }
    }

    fn feature_name(&self, idx: usize) -> String {
        self.feature_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("x{}", idx))
    }

    /// Fit the model to training data.
    ///
    /// X and y are centred, the centred problem is solved by QR and the
    /// intercept is `mean(y) - β·mean(X)`. Zero-variance columns get a zero
    /// coefficient and take no part in the solve.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(FlatpriceError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != n_features {
            return Err(FlatpriceError::Shape {
                expected: format!("{} feature names", n_features),
                actual: format!("{} feature names", self.feature_names.len()),
            });
        }
        if n_samples == 0 {
            return Err(FlatpriceError::Fit("cannot fit on zero samples".to_string()));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FlatpriceError::Fit(
                "training data contains non-finite values".to_string(),
            ));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| FlatpriceError::Fit("cannot compute feature means".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);
        let x_centered = x - &x_mean;
        let y_centered = y - y_mean;

        let stds = x.std_axis(Axis(0), 0.0);
        let (active, excluded): (Vec<usize>, Vec<usize>) = (0..n_features)
            .partition(|&j| stds[j] > 1e-12 * x_mean[j].abs().max(1.0));

        if !excluded.is_empty() {
            let names: Vec<String> = excluded.iter().map(|&j| self.feature_name(j)).collect();
            tracing::warn!(columns = ?names, "Zero-variance features fixed at coefficient 0");
        }
        if n_samples <= active.len() {
            return Err(FlatpriceError::Fit(format!(
                "{} samples are not enough to fit {} features",
                n_samples,
                active.len()
            )));
        }

        let mut a = x_centered.select(Axis(1), &active);
        let mut b = y_centered;
        let names: Vec<String> = active.iter().map(|&j| self.feature_name(j)).collect();
        let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let beta = householder_least_squares(&mut a, &mut b, &name_refs)?;

        let mut coefficients = Array1::zeros(n_features);
        for (pos, &j) in active.iter().enumerate() {
            coefficients[j] = beta[pos];
        }
        if coefficients.iter().any(|c: &f64| !c.is_finite()) {
            return Err(FlatpriceError::Fit(
                "least squares solve produced non-finite coefficients".to_string(),
            ));
        }

        let intercept = y_mean - coefficients.dot(&x_mean);
        tracing::debug!(
            samples = n_samples,
            features = n_features,
            excluded = excluded.len(),
            intercept,
            "Fitted linear regression"
        );

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.excluded = excluded;
        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coefficients, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(i)) => (c, i),
            _ => return Err(FlatpriceError::NotFitted),
        };
        if x.ncols() != coefficients.len() {
            return Err(FlatpriceError::Shape {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + intercept)
    }

    /// Coefficient of determination on `(x, y)`
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        super::metrics::r2_score(y, &predictions)
    }
}
