//! Data preprocessing module
//!
//! Turns raw listing frames into numeric model inputs:
//! - Dropping unreliable columns and incomplete rows
//! - Mapping `yes`/`no` amenity flags to booleans
//! - Drop-first one-hot encoding of categorical attributes
//! - Standardization with statistics from the training partition

mod cleaner;
mod encoder;
mod pipeline;
mod scaler;

pub use cleaner::{Cleaner, CleaningReport};
pub use encoder::{map_binary_columns, BinaryMappingReport, CategoryLevels, Vocabulary};
pub use pipeline::{FeaturePipeline, FeatureTable, PreparationReport, PreparedInput};
pub use scaler::{ScalerState, StandardScaler};

pub(crate) use pipeline::coerce_types;

#[cfg(test)]
pub(crate) mod testing {
    use polars::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const CITIES: [&str; 4] = ["gdansk", "krakow", "lodz", "warszawa"];
    const TYPES: [&str; 3] = ["apartmentBuilding", "blockOfFlats", "tenement"];
    const OWNERSHIP: [&str; 2] = ["condominium", "cooperative"];

    fn yes_no(rng: &mut ChaCha8Rng, n: usize) -> Vec<&'static str> {
        (0..n)
            .map(|_| if rng.gen_bool(0.5) { "yes" } else { "no" })
            .collect()
    }

    fn uniform(rng: &mut ChaCha8Rng, n: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..n).map(|_| rng.gen_range(lo..hi)).collect()
    }

    /// Raw listings with the full training schema and a linear price
    pub(crate) fn listing_frame(n: usize, seed: u64) -> DataFrame {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let square_meters = uniform(&mut rng, n, 25.0, 120.0);
        let rooms: Vec<i64> = (0..n).map(|_| rng.gen_range(1..=5)).collect();
        let price: Vec<f64> = square_meters
            .iter()
            .zip(&rooms)
            .map(|(sqm, r)| 9_000.0 * sqm + 15_000.0 * *r as f64 + rng.gen_range(-5_000.0..5_000.0))
            .collect();

        let ids: Vec<String> = (0..n).map(|i| format!("listing-{}", i)).collect();
        let condition: Vec<Option<&str>> = (0..n)
            .map(|i| if i % 3 == 0 { Some("premium") } else { None })
            .collect();
        let material: Vec<Option<&str>> = (0..n)
            .map(|i| if i % 2 == 0 { Some("brick") } else { None })
            .collect();

        let columns = vec![
            Column::new("id".into(), ids),
            Column::new(
                "city".into(),
                (0..n).map(|i| CITIES[i % CITIES.len()]).collect::<Vec<_>>(),
            ),
            Column::new(
                "type".into(),
                (0..n).map(|i| TYPES[i % TYPES.len()]).collect::<Vec<_>>(),
            ),
            Column::new("squareMeters".into(), square_meters),
            Column::new("rooms".into(), rooms),
            Column::new("floor".into(), uniform(&mut rng, n, 1.0, 10.0)),
            Column::new("floorCount".into(), uniform(&mut rng, n, 1.0, 15.0)),
            Column::new("buildYear".into(), uniform(&mut rng, n, 1900.0, 2023.0)),
            Column::new("latitude".into(), uniform(&mut rng, n, 49.0, 54.5)),
            Column::new("longitude".into(), uniform(&mut rng, n, 14.5, 24.0)),
            Column::new("centreDistance".into(), uniform(&mut rng, n, 0.1, 15.0)),
            Column::new("poiCount".into(), uniform(&mut rng, n, 0.0, 200.0)),
            Column::new("schoolDistance".into(), uniform(&mut rng, n, 0.01, 3.0)),
            Column::new("clinicDistance".into(), uniform(&mut rng, n, 0.01, 3.0)),
            Column::new("postOfficeDistance".into(), uniform(&mut rng, n, 0.01, 3.0)),
            Column::new("kindergartenDistance".into(), uniform(&mut rng, n, 0.01, 3.0)),
            Column::new("restaurantDistance".into(), uniform(&mut rng, n, 0.01, 3.0)),
            Column::new("collegeDistance".into(), uniform(&mut rng, n, 0.01, 5.0)),
            Column::new("pharmacyDistance".into(), uniform(&mut rng, n, 0.01, 3.0)),
            Column::new(
                "ownership".into(),
                (0..n).map(|i| OWNERSHIP[(i % 7) % OWNERSHIP.len()]).collect::<Vec<_>>(),
            ),
            Column::new("buildingMaterial".into(), material),
            Column::new("condition".into(), condition),
            Column::new("hasParkingSpace".into(), yes_no(&mut rng, n)),
            Column::new("hasBalcony".into(), yes_no(&mut rng, n)),
            Column::new("hasElevator".into(), yes_no(&mut rng, n)),
            Column::new("hasSecurity".into(), yes_no(&mut rng, n)),
            Column::new("hasStorageRoom".into(), yes_no(&mut rng, n)),
            Column::new("price".into(), price),
        ];

        DataFrame::new(columns).unwrap()
    }
}
