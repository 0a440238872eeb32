//! Seeded train/validation/test partitioning

use crate::error::{FlatpriceError, Result};
use crate::preprocessing::FeatureTable;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Row counts of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSizes {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

/// Disjoint row-index sets covering every row of the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

/// The three subsets of a feature table
#[derive(Debug, Clone)]
pub struct PartitionedTables {
    pub train: FeatureTable,
    pub validation: FeatureTable,
    pub test: FeatureTable,
}

impl Partition {
    pub fn sizes(&self) -> PartitionSizes {
        PartitionSizes {
            train: self.train.len(),
            validation: self.validation.len(),
            test: self.test.len(),
        }
    }

    /// Materialise the three subsets of `table`
    pub fn take(&self, table: &FeatureTable) -> Result<PartitionedTables> {
        let n = table.n_rows();
        let out_of_range = self
            .train
            .iter()
            .chain(&self.validation)
            .chain(&self.test)
            .any(|&i| i >= n);
        if out_of_range {
            return Err(FlatpriceError::Shape {
                expected: format!("row indices below {}", n),
                actual: "index out of range".to_string(),
            });
        }

        Ok(PartitionedTables {
            train: table.select_rows(&self.train),
            validation: table.select_rows(&self.validation),
            test: table.select_rows(&self.test),
        })
    }
}

/// Two sequential seeded splits: holdout off the full set, then test off the holdout.
#[derive(Debug, Clone)]
pub struct Splitter {
    holdout_fraction: f64,
    test_fraction: f64,
    seed: u64,
}

impl Splitter {
    pub fn new(holdout_fraction: f64, test_fraction: f64, seed: u64) -> Result<Self> {
        for (name, value) in [
            ("holdout_fraction", holdout_fraction),
            ("test_fraction", test_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(FlatpriceError::invalid_parameter(
                    name,
                    value,
                    "must lie strictly between 0 and 1",
                ));
            }
        }
        Ok(Self {
            holdout_fraction,
            test_fraction,
            seed,
        })
    }

    /// Sizes for `n_rows` rows, rounding the peeled-off share up
    pub fn sizes(&self, n_rows: usize) -> PartitionSizes {
        let n_holdout = ((n_rows as f64) * self.holdout_fraction).ceil() as usize;
        let n_test = ((n_holdout as f64) * self.test_fraction).ceil() as usize;
        PartitionSizes {
            train: n_rows.saturating_sub(n_holdout),
            validation: n_holdout.saturating_sub(n_test),
            test: n_test,
        }
    }

    /// Assign each of `n_rows` rows to exactly one subset.
    ///
    /// Both draws use a fresh generator seeded with the same value, so the
    /// assignment depends only on the seed and the row count.
    pub fn split(&self, n_rows: usize) -> Result<Partition> {
        let sizes = self.sizes(n_rows);
        if sizes.train == 0 || sizes.validation == 0 || sizes.test == 0 {
            return Err(FlatpriceError::DataQuality(format!(
                "{} rows cannot form non-empty train/validation/test subsets ({}/{}/{})",
                n_rows, sizes.train, sizes.validation, sizes.test
            )));
        }
        let n_holdout = sizes.validation + sizes.test;

        let mut rows: Vec<usize> = (0..n_rows).collect();
        rows.shuffle(&mut ChaCha8Rng::seed_from_u64(self.seed));
        let (holdout, train) = rows.split_at(n_holdout);

        let mut positions: Vec<usize> = (0..n_holdout).collect();
        positions.shuffle(&mut ChaCha8Rng::seed_from_u64(self.seed));
        let (test_pos, validation_pos) = positions.split_at(sizes.test);

        let partition = Partition {
            train: train.to_vec(),
            validation: validation_pos.iter().map(|&p| holdout[p]).collect(),
            test: test_pos.iter().map(|&p| holdout[p]).collect(),
        };

        tracing::info!(
            train = sizes.train,
            validation = sizes.validation,
            test = sizes.test,
            seed = self.seed,
            "Partitioned rows"
        );
        Ok(partition)
    }
}
