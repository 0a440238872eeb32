//! Column catalogue of the apartment listings dataset
//!
//! The source CSV has a fixed schema. The constants here name the columns
//! each stage works with, and [`require_columns`] checks a frame against them.

use crate::error::{FlatpriceError, Result};
use polars::prelude::*;

/// Column holding the listing price, the regression target
pub const TARGET: &str = "price";

/// Listing identifier, kept for exploration and prediction output only
pub const ID: &str = "id";

/// Columns judged unreliable and dropped by every cleaning profile
pub const UNRELIABLE: [&str; 2] = ["condition", "buildingMaterial"];

/// Numeric measurements used as model features, in feature-matrix order
pub const NUMERIC_FEATURES: [&str; 16] = [
    "squareMeters",
    "rooms",
    "floor",
    "floorCount",
    "buildYear",
    "centreDistance",
    "poiCount",
    "schoolDistance",
    "clinicDistance",
    "postOfficeDistance",
    "kindergartenDistance",
    "restaurantDistance",
    "collegeDistance",
    "pharmacyDistance",
    "latitude",
    "longitude",
];

/// Multi-valued categorical attributes, one-hot encoded
pub const CATEGORICAL: [&str; 3] = ["type", "city", "ownership"];

/// Amenity flags stored as literal `yes`/`no`
pub const BINARY: [&str; 5] = [
    "hasParkingSpace",
    "hasBalcony",
    "hasElevator",
    "hasSecurity",
    "hasStorageRoom",
];

/// Every column the training input must carry
pub fn training_columns() -> Vec<&'static str> {
    let mut cols: Vec<&'static str> = NUMERIC_FEATURES.to_vec();
    cols.push(TARGET);
    cols.extend(CATEGORICAL);
    cols.extend(BINARY);
    cols.push(ID);
    cols.extend(UNRELIABLE);
    cols
}

/// Columns a prediction input must carry (no target, no dropped columns)
pub fn feature_source_columns() -> Vec<&'static str> {
    let mut cols: Vec<&'static str> = NUMERIC_FEATURES.to_vec();
    cols.extend(CATEGORICAL);
    cols.extend(BINARY);
    cols
}

/// Numeric columns including the target
pub fn numeric_columns() -> Vec<&'static str> {
    let mut cols: Vec<&'static str> = NUMERIC_FEATURES.to_vec();
    cols.push(TARGET);
    cols
}

/// Fail with a schema error listing every column from `required` that `df` lacks.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !present.iter().any(|p| p == col))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FlatpriceError::Schema(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )))
    }
}
