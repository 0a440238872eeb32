use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flatprice::training::TrainEngine;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const CITIES: [&str; 5] = ["gdansk", "krakow", "lodz", "poznan", "warszawa"];
const TYPES: [&str; 3] = ["apartmentBuilding", "blockOfFlats", "tenement"];
const OWNERSHIP: [&str; 2] = ["condominium", "cooperative"];

const NUMERIC: [&str; 15] = [
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

const BINARY: [&str; 5] = [
    "hasParkingSpace",
    "hasBalcony",
    "hasElevator",
    "hasSecurity",
    "hasStorageRoom",
];

fn create_listings(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let area: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(25.0..150.0)).collect();
    let price: Vec<f64> = area
        .iter()
        .map(|a| 9_000.0 * a + rng.gen_range(-20_000.0..20_000.0))
        .collect();

    let mut columns = vec![
        Column::new("id".into(), (0..n_rows).map(|i| i.to_string()).collect::<Vec<_>>()),
        Column::new("condition".into(), vec!["premium"; n_rows]),
        Column::new("buildingMaterial".into(), vec!["brick"; n_rows]),
        Column::new("squareMeters".into(), area),
        Column::new("price".into(), price),
    ];
    for name in NUMERIC {
        let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect();
        columns.push(Column::new(name.into(), values));
    }
    for (name, levels) in [("city", &CITIES[..]), ("type", &TYPES[..]), ("ownership", &OWNERSHIP[..])] {
        let values: Vec<&str> = (0..n_rows).map(|_| *levels.choose(&mut rng).unwrap()).collect();
        columns.push(Column::new(name.into(), values));
    }
    for name in BINARY {
        let values: Vec<&str> = (0..n_rows)
            .map(|_| if rng.gen_bool(0.5) { "yes" } else { "no" })
            .collect();
        columns.push(Column::new(name.into(), values));
    }

    DataFrame::new(columns).unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 10000, 50000].iter() {
        let df = create_listings(*n_rows);

        group.bench_with_input(BenchmarkId::new("run", n_rows), &df, |b, df| {
            b.iter(|| TrainEngine::default().run(black_box(df)).unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let outcome = TrainEngine::default().run(&create_listings(5000)).unwrap();

    for n_rows in [100, 1000, 10000].iter() {
        let df = create_listings(*n_rows);

        group.bench_with_input(BenchmarkId::new("predict_frame", n_rows), &df, |b, df| {
            b.iter(|| outcome.artifact.predict_frame(black_box(df)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
