mod common;

use bikeshare_sim::data::{ColumnRoles, Dataset, DistrictPeriodRecord, FeatureSchema};
use bikeshare_sim::estimator::{DemandEstimator, EstimatorError};
use bikeshare_sim::io::read_dataset;
use bikeshare_sim::metrics::RegressionReport;

use common::{FEATURES, fast_params, synthetic_dataset, write_dataset_csv};

#[test]
fn identical_inputs_give_bit_identical_predictions() {
    let train = synthetic_dataset(2023, 56, 7);
    let test = synthetic_dataset(2024, 14, 8);
    let estimator = DemandEstimator::new(fast_params());

    let a = estimator.fit_and_score(&train, &test).expect("first fit");
    let b = estimator.fit_and_score(&train, &test).expect("second fit");

    assert_eq!(a.model, b.model);
    let pa = a.predictions().expect("predict a");
    let pb = b.predictions().expect("predict b");
    assert!(
        pa.iter().zip(pb.iter()).all(|(x, y)| x.to_bits() == y.to_bits()),
        "predictions differ between identical runs"
    );
}

#[test]
fn standardization_uses_training_statistics_only() {
    let train = synthetic_dataset(2023, 28, 1);
    let test = synthetic_dataset(2024, 7, 2);
    let schema = test.schema().clone();

    let mut reversed = test.records().to_vec();
    reversed.reverse();
    let permuted = Dataset::new(schema.clone(), reversed).expect("permuted test");

    // Shift the test temperature far away so its own mean and scale would differ.
    let shifted_records = test
        .records()
        .iter()
        .cloned()
        .map(|mut r| {
            r.features[2] = r.features[2] * 3.0 + 100.0;
            r
        })
        .collect();
    let shifted = Dataset::new(schema, shifted_records).expect("shifted test");

    let estimator = DemandEstimator::new(fast_params());
    let base = estimator.fit_and_score(&train, &test).expect("fit base");
    let a = estimator.fit_and_score(&train, &permuted).expect("fit permuted");
    let b = estimator.fit_and_score(&train, &shifted).expect("fit shifted");

    assert_eq!(base.standardizer, a.standardizer);
    assert_eq!(base.standardizer, b.standardizer);
    assert_eq!(base.model, b.model);

    let temperature = train.feature_column("temperature").expect("column");
    let train_mean = temperature.iter().sum::<f64>() / temperature.len() as f64;
    assert!((b.standardizer.mean()[2] - train_mean).abs() < 1e-9);

    // Shifted test rows land far above zero in training units.
    let col = b.test_features.values().column(2);
    let test_mean = col.sum() / col.len() as f64;
    assert!(test_mean > 5.0, "test temperature mean in train units: {test_mean}");
}

#[test]
fn model_beats_training_mean_on_held_out_period() {
    let train = synthetic_dataset(2023, 84, 11);
    let test = synthetic_dataset(2024, 28, 12);
    let out = DemandEstimator::new(fast_params())
        .fit_and_score(&train, &test)
        .expect("fit");
    let report = out.report().expect("report");

    let target = train.target();
    let mean = target.sum() / target.len() as f64;
    let actual = out.test_target.to_vec();
    let baseline = RegressionReport::from_predictions(&vec![mean; actual.len()], &actual);

    assert_eq!(report.samples, test.len());
    assert!(
        report.rmse < 0.5 * baseline.rmse,
        "model rmse {:.3} vs mean predictor {:.3}",
        report.rmse,
        baseline.rmse
    );
    assert!(report.r2 > 0.5, "r2 = {}", report.r2);

    let importance = out.model.feature_importance();
    assert_eq!(importance.len(), FEATURES.len());
    let total: f64 = importance.iter().map(|(_, share)| share).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn csv_round_trip_feeds_the_estimator() {
    let dir = tempfile::tempdir().expect("tempdir");
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    write_dataset_csv(&synthetic_dataset(2023, 28, 3), &train_path);
    write_dataset_csv(&synthetic_dataset(2024, 7, 4), &test_path);

    let roles = ColumnRoles::default();
    let train = read_dataset(&train_path, &roles).expect("train csv");
    let test = read_dataset(&test_path, &roles).expect("test csv");
    assert_eq!(train.schema().columns(), FEATURES);

    let out = DemandEstimator::new(fast_params())
        .fit_and_score(&train, &test)
        .expect("fit");
    assert_eq!(out.predictions().expect("predict").len(), test.len());
}

#[test]
fn misaligned_schemas_fail_fast() {
    let train = synthetic_dataset(2023, 14, 5);
    let test = synthetic_dataset(2024, 7, 6);
    let mut columns: Vec<String> = FEATURES.iter().map(|s| s.to_string()).collect();
    columns.swap(2, 3);
    let reordered = Dataset::new(
        FeatureSchema::new(columns).expect("schema"),
        test.records().to_vec(),
    )
    .expect("reordered");

    let err = DemandEstimator::new(fast_params())
        .fit_and_score(&train, &reordered)
        .expect_err("must fail");
    assert!(matches!(err, EstimatorError::SchemaMismatch { .. }));
    assert!(err.to_string().contains("different order"));
}

#[test]
fn overlapping_periods_are_rejected() {
    let train = synthetic_dataset(2023, 14, 5);
    let mut records = synthetic_dataset(2024, 3, 6).records().to_vec();
    let leaked = DistrictPeriodRecord {
        date: "2023-01-05".to_string(),
        ..records[0].clone()
    };
    records.push(leaked);
    let test = Dataset::new(train.schema().clone(), records).expect("test");

    let err = DemandEstimator::new(fast_params())
        .fit_and_score(&train, &test)
        .expect_err("must fail");
    assert!(matches!(err, EstimatorError::OverlappingPeriods { shared: 1, .. }));
}
