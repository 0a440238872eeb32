//! Synthetic listing tables shared by the integration tests

#![allow(dead_code)]

use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const CITIES: [&str; 5] = ["gdansk", "krakow", "lodz", "poznan", "warszawa"];
pub const TYPES: [&str; 3] = ["apartmentBuilding", "blockOfFlats", "tenement"];
pub const OWNERSHIP: [&str; 2] = ["condominium", "cooperative"];

fn uniform(rng: &mut ChaCha8Rng, n: usize, lo: f64, hi: f64) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(lo..hi)).collect()
}

fn yes_no(rng: &mut ChaCha8Rng, n: usize) -> Vec<&'static str> {
    (0..n)
        .map(|_| if rng.gen_bool(0.5) { "yes" } else { "no" })
        .collect()
}

fn pick(rng: &mut ChaCha8Rng, n: usize, levels: &[&'static str]) -> Vec<&'static str> {
    (0..n).map(|_| levels[rng.gen_range(0..levels.len())]).collect()
}

/// Full-schema listings with `price = 3 * squareMeters + 1000 + noise`,
/// noise uniform in `[-noise, noise]`.
pub fn linear_listings(n: usize, seed: u64, noise: f64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let square_meters = uniform(&mut rng, n, 25.0, 150.0);
    let price: Vec<f64> = square_meters
        .iter()
        .map(|sqm| {
            let eps = if noise > 0.0 { rng.gen_range(-noise..noise) } else { 0.0 };
            3.0 * sqm + 1000.0 + eps
        })
        .collect();
    let rooms: Vec<i64> = (0..n).map(|_| rng.gen_range(1..=6)).collect();
    let ids: Vec<String> = (0..n).map(|i| format!("id-{:05}", i)).collect();
    let condition: Vec<Option<&str>> = (0..n)
        .map(|_| if rng.gen_bool(0.3) { Some("premium") } else { None })
        .collect();
    let material: Vec<Option<&str>> = (0..n)
        .map(|_| if rng.gen_bool(0.6) { Some("brick") } else { None })
        .collect();

    let columns = vec![
        Column::new("id".into(), ids),
        Column::new("city".into(), pick(&mut rng, n, &CITIES)),
        Column::new("type".into(), pick(&mut rng, n, &TYPES)),
        Column::new("squareMeters".into(), square_meters),
        Column::new("rooms".into(), rooms),
        Column::new("floor".into(), uniform(&mut rng, n, 1.0, 12.0)),
        Column::new("floorCount".into(), uniform(&mut rng, n, 1.0, 20.0)),
        Column::new("buildYear".into(), uniform(&mut rng, n, 1880.0, 2024.0)),
        Column::new("latitude".into(), uniform(&mut rng, n, 49.0, 54.6)),
        Column::new("longitude".into(), uniform(&mut rng, n, 14.1, 24.1)),
        Column::new("centreDistance".into(), uniform(&mut rng, n, 0.05, 16.0)),
        Column::new("poiCount".into(), uniform(&mut rng, n, 0.0, 210.0)),
        Column::new("schoolDistance".into(), uniform(&mut rng, n, 0.01, 4.0)),
        Column::new("clinicDistance".into(), uniform(&mut rng, n, 0.01, 5.0)),
        Column::new("postOfficeDistance".into(), uniform(&mut rng, n, 0.01, 5.0)),
        Column::new("kindergartenDistance".into(), uniform(&mut rng, n, 0.01, 5.0)),
        Column::new("restaurantDistance".into(), uniform(&mut rng, n, 0.01, 5.0)),
        Column::new("collegeDistance".into(), uniform(&mut rng, n, 0.01, 5.0)),
        Column::new("pharmacyDistance".into(), uniform(&mut rng, n, 0.01, 5.0)),
        Column::new("ownership".into(), pick(&mut rng, n, &OWNERSHIP)),
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

/// Replace one column with `values`
pub fn replace_column<T, P>(df: &mut DataFrame, name: &str, values: T)
where
    Series: NamedFrom<T, P>,
    P: ?Sized,
{
    df.with_column(Series::new(name.into(), values)).unwrap();
}
