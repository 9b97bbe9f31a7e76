//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use bikeshare_sim::data::{Dataset, DistrictPeriodRecord, FeatureSchema};
use bikeshare_sim::model::BoostingParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Synthetic districts: `(borough, district, stations, base population flow)`.
///
/// `Buam-dong` has no stations, to exercise the clamp-to-one path.
pub const DISTRICTS: &[(&str, &str, f64, f64)] = &[
    ("Jongno-gu", "Sajik-dong", 6.0, 5200.0),
    ("Jongno-gu", "Buam-dong", 0.0, 900.0),
    ("Mapo-gu", "Seogyo-dong", 12.0, 9800.0),
    ("Mapo-gu", "Hapjeong-dong", 4.0, 3100.0),
    ("Gangnam-gu", "Yeoksam-dong", 15.0, 14000.0),
    ("Gangnam-gu", "Sinsa-dong", 3.0, 2600.0),
];

/// Feature columns of the synthetic tables, in header order.
pub const FEATURES: &[&str] = &["station_count", "population_flow", "temperature", "is_weekend"];

/// Builds a district-day table for `days` consecutive days of `year`.
///
/// Rentals depend nonlinearly on temperature and the weekend flag, scale
/// with stations and population flow, and carry seeded noise.
pub fn synthetic_dataset(year: u32, days: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(days * DISTRICTS.len());

    for day in 0..days {
        let date = format!("{year}-{:02}-{:02}", day / 28 + 1, day % 28 + 1);
        let temperature = 5.0 + 20.0 * ((day as f64) / 9.0).sin().abs() + rng.random_range(-2.0..2.0);
        let is_weekend = if day % 7 >= 5 { 1.0 } else { 0.0 };

        for &(borough, district, stations, population) in DISTRICTS {
            let flow = population * rng.random_range(0.9..1.1);
            let comfort = if (12.0..24.0).contains(&temperature) { 1.5 } else { 0.7 };
            let rentals = (stations.max(1.0) * 8.0 + flow * 0.01)
                * comfort
                * (1.0 + 0.3 * is_weekend)
                + rng.random_range(-3.0..3.0);
            records.push(DistrictPeriodRecord {
                borough: borough.to_string(),
                district: district.to_string(),
                date: date.clone(),
                total_rentals: rentals.max(0.0).round(),
                features: vec![stations, flow, temperature, is_weekend],
            });
        }
    }

    let schema = FeatureSchema::new(FEATURES.iter().map(|s| s.to_string()).collect())
        .expect("fixture schema");
    Dataset::new(schema, records).expect("fixture dataset")
}

/// Writes `dataset` as a CSV table with default role column names.
pub fn write_dataset_csv(dataset: &Dataset, path: &Path) {
    let mut text = String::from("borough,district,date,total_rentals");
    for column in dataset.schema().columns() {
        text.push(',');
        text.push_str(column);
    }
    text.push('\n');
    for r in dataset.records() {
        text.push_str(&format!(
            "{},{},{},{}",
            r.borough, r.district, r.date, r.total_rentals
        ));
        for v in &r.features {
            text.push_str(&format!(",{v}"));
        }
        text.push('\n');
    }
    fs::write(path, text).expect("fixture csv should be writable");
}

/// Small, fast booster for integration tests.
pub fn fast_params() -> BoostingParams {
    BoostingParams {
        n_estimators: 80,
        max_depth: 4,
        learning_rate: 0.2,
        ..BoostingParams::default()
    }
}
