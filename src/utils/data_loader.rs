//! Listing data loading and saving

use crate::error::{FlatpriceError, Result};
use crate::schema;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Which columns a loaded frame must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPurpose {
    /// Full training schema including the target and the dropped columns
    Training,
    /// Feature sources only; `id` is kept when present
    Prediction,
}

/// CSV loader for listing datasets
pub struct ListingLoader {
    /// Rows inspected for type inference
    infer_schema_rows: usize,
}

impl Default for ListingLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            infer_schema_rows: 10_000,
        }
    }

    /// Set the number of rows used for type inference
    pub fn with_infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = rows.max(1);
        self
    }

    /// Read a CSV file without any schema checks
    pub fn read_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            FlatpriceError::Data(format!("cannot open {}: {}", path.display(), e))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_rows))
            .into_reader_with_file_handle(file)
            .finish()?;

        Ok(df)
    }

    /// Load a training dataset (full schema)
    pub fn load_for_training(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        self.load(path, LoadPurpose::Training)
    }

    /// Load listings to predict; `id` and `price` are kept when present
    pub fn load_for_prediction(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        self.load(path, LoadPurpose::Prediction)
    }

    /// Load a CSV file and check it against the schema required for `purpose`.
    ///
    /// Columns outside the schema are dropped.
    pub fn load(&self, path: impl AsRef<Path>, purpose: LoadPurpose) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();
        let raw = self.read_csv(path)?;

        let mut keep: Vec<&str> = match purpose {
            LoadPurpose::Training => schema::training_columns(),
            LoadPurpose::Prediction => schema::feature_source_columns(),
        };
        schema::require_columns(&raw, &keep)?;

        if purpose == LoadPurpose::Prediction {
            let present = raw.get_column_names();
            for optional in [schema::ID, schema::TARGET] {
                if present.iter().any(|name| name.as_str() == optional) {
                    keep.push(optional);
                }
            }
        }

        let extra: Vec<String> = raw
            .get_column_names()
            .into_iter()
            .filter(|name| !keep.iter().any(|k| *k == name.as_str()))
            .map(|name| name.to_string())
            .collect();
        if !extra.is_empty() {
            tracing::debug!(columns = ?extra, "Ignoring columns outside the listing schema");
        }

        let df = raw.select(keep)?;
        tracing::info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded listings"
        );
        Ok(df)
    }
}

/// Writes frames back to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).finish(df)?;
        Ok(())
    }
}
