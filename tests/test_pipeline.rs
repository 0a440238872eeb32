//! Integration test: training pipeline end-to-end

mod common;

use approx::assert_abs_diff_eq;
use common::{linear_listings, replace_column};
use flatprice::config::{PipelineConfig, UnknownCategoryPolicy};
use flatprice::export::ModelArtifact;
use flatprice::training::{r2_score, PartitionSizes, TrainEngine};
use flatprice::utils::{DataSaver, ListingLoader};
use flatprice::FlatpriceError;
use ndarray::Array1;
use polars::prelude::*;
use tempfile::TempDir;

#[test]
fn test_recovers_known_linear_relationship() {
    let df = linear_listings(1000, 42, 5.0);
    let outcome = TrainEngine::default().run(&df).unwrap();

    assert_eq!(
        outcome.partition_sizes,
        PartitionSizes {
            train: 800,
            validation: 160,
            test: 40
        }
    );
    assert!(
        outcome.validation.r2 > 0.9,
        "validation R² too low: {}",
        outcome.validation.r2
    );

    let raw = outcome.artifact.raw_coefficients();
    let area = raw.get("squareMeters").unwrap();
    assert_abs_diff_eq!(area, 3.0, epsilon = 0.05);
    assert_abs_diff_eq!(raw.get("hasBalcony").unwrap(), 0.0, epsilon = 2.0);
}

#[test]
fn test_metrics_are_reproducible_for_a_seed() {
    let df = linear_listings(300, 7, 20.0);
    let config = PipelineConfig::new().with_seed(2024);

    let a = TrainEngine::new(config.clone()).run(&df).unwrap();
    let b = TrainEngine::new(config).run(&df).unwrap();
    assert_eq!(a.validation, b.validation);
    assert_eq!(a.test, b.test);

    let other = TrainEngine::new(PipelineConfig::new().with_seed(2025))
        .run(&df)
        .unwrap();
    assert_ne!(a.validation, other.validation);
}

#[test]
fn test_csv_train_save_load_predict() {
    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("listings.csv");
    let model_path = dir.path().join("model.json");

    let mut df = linear_listings(400, 3, 5.0);
    DataSaver::save_csv(&mut df, &data_path).unwrap();

    let loaded = ListingLoader::new().load_for_training(&data_path).unwrap();
    let outcome = TrainEngine::default().run(&loaded).unwrap();
    outcome.artifact.save(&model_path).unwrap();

    let artifact = ModelArtifact::load(&model_path).unwrap();
    assert_eq!(artifact.feature_names, outcome.artifact.feature_names);
    assert_eq!(artifact.vocabulary, outcome.artifact.vocabulary);
    assert_eq!(artifact.config, outcome.artifact.config);
    for (a, b) in artifact
        .coefficients
        .iter()
        .zip(&outcome.artifact.coefficients)
    {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-9 * b.abs().max(1.0));
    }

    let new_listings = ListingLoader::new().load_for_prediction(&data_path).unwrap();
    let predictions = artifact.predict_frame(&new_listings).unwrap();
    assert_eq!(predictions.height(), 400);
    assert!(predictions.column("id").is_ok());

    let predicted: Array1<f64> = predictions
        .column("predicted_price")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect();
    let actual: Array1<f64> = new_listings
        .column("price")
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect();
    assert!(r2_score(&actual, &predicted).unwrap() > 0.9);
}

#[test]
fn test_unknown_format_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.json");

    let outcome = TrainEngine::default()
        .run(&linear_listings(200, 5, 5.0))
        .unwrap();
    let mut artifact = outcome.artifact;
    artifact.format_version = 99;
    artifact.save(&model_path).unwrap();

    let err = ModelArtifact::load(&model_path).unwrap_err();
    assert!(matches!(err, FlatpriceError::Serialization(_)));
}

#[test]
fn test_every_row_incomplete_is_data_quality_error() {
    let mut df = linear_listings(50, 9, 5.0);
    let holes: Vec<Option<f64>> = (0..50)
        .map(|i| if i % 2 == 0 { None } else { Some(3.0) })
        .collect();
    let more_holes: Vec<Option<f64>> = (0..50)
        .map(|i| if i % 2 == 1 { None } else { Some(1.0) })
        .collect();
    replace_column(&mut df, "floor", holes);
    replace_column(&mut df, "poiCount", more_holes);

    let err = TrainEngine::default().run(&df).unwrap_err();
    assert!(matches!(err, FlatpriceError::DataQuality(_)), "{:?}", err);
}

#[test]
fn test_single_level_category_has_no_indicators() {
    let mut df = linear_listings(200, 10, 5.0);
    replace_column(&mut df, "ownership", vec!["condominium"; 200]);

    let outcome = TrainEngine::default().run(&df).unwrap();
    let names = &outcome.artifact.feature_names;
    assert!(names.iter().all(|n| !n.starts_with("ownership_")));
    assert!(names.iter().any(|n| n == "city_krakow"));
    assert!(names.iter().all(|n| n != "city_gdansk"));
}

#[test]
fn test_missing_column_is_schema_error() {
    let df = linear_listings(100, 11, 5.0).drop("buildYear").unwrap();
    let err = TrainEngine::default().run(&df).unwrap_err();
    assert!(matches!(err, FlatpriceError::Schema(_)), "{:?}", err);
}

#[test]
fn test_unseen_category_policy_at_prediction() {
    let outcome = TrainEngine::default()
        .run(&linear_listings(200, 12, 5.0))
        .unwrap();

    let mut fresh = linear_listings(10, 13, 5.0);
    replace_column(&mut fresh, "city", vec!["szczecin"; 10]);

    let predictions = outcome.artifact.predict_frame(&fresh).unwrap();
    assert_eq!(predictions.height(), 10);

    let mut strict = outcome.artifact.clone();
    strict.config = strict
        .config
        .with_unknown_category(UnknownCategoryPolicy::Reject);
    assert!(matches!(
        strict.predict_frame(&fresh),
        Err(FlatpriceError::Schema(_))
    ));
}

#[test]
fn test_listing_without_id_is_still_scored() {
    let outcome = TrainEngine::default()
        .run(&linear_listings(200, 14, 5.0))
        .unwrap();

    let mut fresh = linear_listings(5, 15, 5.0);
    replace_column(
        &mut fresh,
        "id",
        vec![Some("a"), Some("b"), None, Some("d"), Some("e")],
    );

    let predictions = outcome.artifact.predict_frame(&fresh).unwrap();
    assert_eq!(predictions.height(), 5);
    let ids = predictions.column("id").unwrap();
    assert_eq!(ids.null_count(), 1);
    assert_eq!(
        predictions.column("predicted_price").unwrap().null_count(),
        0
    );
}

#[test]
fn test_true_false_flags_are_not_yes_no() {
    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("listings.csv");

    let mut df = linear_listings(100, 16, 5.0);
    let flags: Vec<bool> = (0..100).map(|i| i % 2 == 0).collect();
    replace_column(&mut df, "hasBalcony", flags);
    DataSaver::save_csv(&mut df, &data_path).unwrap();

    let loaded = ListingLoader::new().load_for_training(&data_path).unwrap();
    let err = TrainEngine::default().run(&loaded).unwrap_err();
    assert!(matches!(err, FlatpriceError::DataQuality(_)), "{:?}", err);
}
