//! Property tests for the preparation and partitioning stages

mod common;

use common::{linear_listings, replace_column};
use flatprice::config::{PipelineConfig, ZeroVariancePolicy};
use flatprice::preprocessing::{Cleaner, FeaturePipeline, StandardScaler};
use flatprice::training::{Splitter, TrainEngine};
use ndarray::{Array2, Axis};
use polars::prelude::*;
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn random_matrix(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1_000.0..1_000.0))
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("f{}", i)).collect()
}

fn frame_with_holes(n: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut maybe = |p: f64| -> Vec<Option<f64>> {
        (0..n)
            .map(|_| if rng.gen_bool(p) { None } else { Some(rng.gen_range(0.0..10.0)) })
            .collect()
    };
    let a = maybe(0.2);
    let b = maybe(0.1);
    let ids: Vec<String> = (0..n).map(|i| format!("r{}", i)).collect();
    df!(
        "id" => ids,
        "condition" => vec![None::<&str>; n],
        "buildingMaterial" => vec![Some("brick"); n],
        "a" => a,
        "b" => b
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_split_is_deterministic_disjoint_and_covering(n in 10usize..600, seed in any::<u64>()) {
        let splitter = Splitter::new(0.2, 0.2, seed).unwrap();
        let first = splitter.split(n).unwrap();
        let second = splitter.split(n).unwrap();
        prop_assert_eq!(&first, &second);

        let mut seen = HashSet::new();
        for idx in first.train.iter().chain(&first.validation).chain(&first.test) {
            prop_assert!(*idx < n);
            prop_assert!(seen.insert(*idx));
        }
        prop_assert_eq!(seen.len(), n);
        prop_assert!(!first.validation.is_empty());
        prop_assert!(!first.test.is_empty());
    }

    #[test]
    fn prop_scaled_training_columns_are_standard(rows in 3usize..80, cols in 1usize..6, seed in any::<u64>()) {
        let x = random_matrix(rows, cols, seed);
        let mut scaler = StandardScaler::new(ZeroVariancePolicy::Reject);
        let scaled = scaler.fit_transform(&x, &names(cols)).unwrap();

        let means = scaled.mean_axis(Axis(0)).unwrap();
        let stds = scaled.std_axis(Axis(0), 0.0);
        for j in 0..cols {
            prop_assert!(means[j].abs() < 1e-9);
            prop_assert!((stds[j] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_cleaning_is_idempotent(n in 1usize..120, seed in any::<u64>()) {
        let df = frame_with_holes(n, seed);
        let cleaner = Cleaner::for_modelling();
        match cleaner.clean(&df) {
            Ok((once, _)) => {
                for column in once.get_columns() {
                    prop_assert_eq!(column.null_count(), 0);
                }
                let (twice, report) = cleaner.clean(&once).unwrap();
                prop_assert!(once.equals_missing(&twice));
                prop_assert_eq!(report.rows_removed(), 0);
            }
            Err(err) => {
                prop_assert!(matches!(err, flatprice::FlatpriceError::DataQuality(_)));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_encoding_is_deterministic(n in 20usize..150, seed in any::<u64>()) {
        let df = linear_listings(n, seed, 5.0);
        let pipeline = FeaturePipeline::default();
        let (a, va, _) = pipeline.fit_transform(&df, "price").unwrap();
        let (b, vb, _) = pipeline.fit_transform(&df, "price").unwrap();

        prop_assert_eq!(&a.feature_names, &b.feature_names);
        prop_assert_eq!(&a.features, &b.features);
        prop_assert_eq!(va, vb);
    }

    #[test]
    fn prop_holdout_rows_do_not_move_trained_scaler(n in 80usize..200, seed in any::<u64>(), shift in 1f64..1e4) {
        let df = linear_listings(n, seed, 5.0);
        let config = PipelineConfig::new().with_seed(seed);
        let baseline = TrainEngine::new(config.clone()).run(&df).unwrap();

        let partition = Splitter::new(0.2, 0.2, seed).unwrap().split(n).unwrap();
        let mut area: Vec<f64> = df
            .column("squareMeters")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        for &row in partition.validation.iter().chain(&partition.test) {
            area[row] += shift;
        }
        let mut perturbed = df.clone();
        replace_column(&mut perturbed, "squareMeters", area);
        let outcome = TrainEngine::new(config).run(&perturbed).unwrap();

        prop_assert_eq!(&outcome.artifact.scaler, &baseline.artifact.scaler);
        prop_assert_eq!(&outcome.artifact.coefficients, &baseline.artifact.coefficients);
    }
}
