use std::fs;

use flightdelay::data_handling::{FeatureTable, FlightRecord, FlightType};
use flightdelay::error::ModelError;
use flightdelay::models::{DelayModel, LATEST_ARTIFACT};
use flightdelay::preprocessing::{preprocess, FeatureSchema};

/// 80 on-time and 20 delayed flights; every delayed flight is operated by
/// Latin American Wings, so the top-ten indicators separate the classes.
fn training_set() -> (FeatureTable, Vec<i32>) {
    let airlines = ["Grupo LATAM", "Sky Airline", "Copa Air", "Avianca"];
    let mut records = Vec::new();
    let mut labels = Vec::new();
    for i in 0..80u32 {
        let flight_type = if i % 2 == 0 { FlightType::International } else { FlightType::Domestic };
        records.push(FlightRecord::new(airlines[i as usize % 4], flight_type, i % 12 + 1));
        labels.push(0);
    }
    for i in 0..20u32 {
        records.push(FlightRecord::new("Latin American Wings", FlightType::Domestic, i % 12 + 1));
        labels.push(1);
    }
    (preprocess(&records, FeatureSchema::top_ten()).unwrap(), labels)
}

fn model_in(dir: &tempfile::TempDir) -> DelayModel {
    let _ = env_logger::builder().is_test(true).try_init();
    DelayModel::new(dir.path())
}

#[test]
fn test_fit_then_predict_follows_decision_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let model = model_in(&dir);
    let (features, labels) = training_set();

    model.fit(&features, &labels).unwrap();
    let predictions = model.predict(&features).unwrap();
    assert_eq!(predictions, labels);
}

#[test]
fn test_fit_is_deterministic_across_runs() {
    let (features, labels) = training_set();
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let a = model_in(&dir_a);
    let b = model_in(&dir_b);
    a.fit(&features, &labels).unwrap();
    b.fit(&features, &labels).unwrap();

    assert_eq!(a.predict(&features).unwrap(), b.predict(&features).unwrap());
    assert_eq!(
        a.predict_proba(&features).unwrap(),
        b.predict_proba(&features).unwrap()
    );
}

#[test]
fn test_persist_reload_gives_identical_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let (features, labels) = training_set();

    let model = model_in(&dir);
    model.fit(&features, &labels).unwrap();
    let before = model.predict(&features).unwrap();
    let before_proba = model.predict_proba(&features).unwrap();

    model.unload();
    assert!(!model.is_loaded());
    let after = model.predict(&features).unwrap();
    assert!(model.is_loaded());
    assert_eq!(before, after);

    // A fresh instance over the same directory loads latest.json lazily.
    let reloaded = model_in(&dir);
    assert_eq!(reloaded.predict(&features).unwrap(), before);
    for (p, q) in before_proba.iter().zip(reloaded.predict_proba(&features).unwrap()) {
        assert!((p - q).abs() < 1e-6);
    }
}

#[test]
fn test_fit_writes_run_and_latest_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let (features, labels) = training_set();
    let trained = model_in(&dir).fit(&features, &labels).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains(&LATEST_ARTIFACT.to_string()));
    assert_eq!(names.len(), 2, "{names:?}");
    assert!(names.iter().any(|n| n != LATEST_ARTIFACT && n.ends_with(".json")));

    assert_eq!(trained.columns, FeatureSchema::top_ten().column_names());
    assert_eq!(trained.config().seed, 1);
    assert_eq!(trained.config().learning_rate, 0.01);
}

#[test]
fn test_imbalance_ratio_is_recorded_as_positive_weight() {
    let dir = tempfile::tempdir().unwrap();
    let (features, labels) = training_set();
    let trained = model_in(&dir).fit(&features, &labels).unwrap();
    assert_eq!(trained.scale_pos_weight, 4.0);

    let persisted = model_in(&dir).load_latest().unwrap();
    assert_eq!(persisted.scale_pos_weight, 4.0);
}

#[test]
fn test_predict_without_artifact_is_not_trained() {
    let dir = tempfile::tempdir().unwrap();
    let (features, _) = training_set();
    let err = model_in(&dir).predict(&features).unwrap_err();
    assert!(matches!(err, ModelError::NotTrained { .. }));
}

#[test]
fn test_missing_column_is_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let model = model_in(&dir);
    let (features, labels) = training_set();
    model.fit(&features, &labels).unwrap();

    let without_mes_12: Vec<&str> = features
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| *c != "MES_12")
        .collect();
    let narrowed = features.select_columns(&without_mes_12).unwrap();

    match model.predict(&narrowed).unwrap_err() {
        ModelError::SchemaMismatch {
            missing,
            unexpected,
            reordered,
        } => {
            assert_eq!(missing, vec!["MES_12".to_string()]);
            assert!(unexpected.is_empty());
            assert!(!reordered);
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
}

#[test]
fn test_reordered_columns_are_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let model = model_in(&dir);
    let (features, labels) = training_set();
    model.fit(&features, &labels).unwrap();

    let mut names: Vec<&str> = features.columns().iter().map(String::as_str).collect();
    names.swap(0, 1);
    let swapped = features.select_columns(&names).unwrap();
    assert!(matches!(
        model.predict(&swapped),
        Err(ModelError::SchemaMismatch { reordered: true, .. })
    ));
}

#[test]
fn test_fit_rejects_unusable_labels() {
    let dir = tempfile::tempdir().unwrap();
    let model = model_in(&dir);
    let (features, labels) = training_set();

    let all_on_time = vec![0; labels.len()];
    assert!(matches!(
        model.fit(&features, &all_on_time),
        Err(ModelError::NoPositiveLabels)
    ));
    assert!(matches!(
        model.fit(&features, &labels[..10]),
        Err(ModelError::LengthMismatch { .. })
    ));
    // Nothing was persisted by the failed fits.
    assert!(!dir.path().join(LATEST_ARTIFACT).exists());
}

#[test]
fn test_concurrent_predictions_during_refit() {
    let dir = tempfile::tempdir().unwrap();
    let model = model_in(&dir);
    let (features, labels) = training_set();
    model.fit(&features, &labels).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..5 {
                    assert_eq!(model.predict(&features).unwrap(), labels);
                }
            });
        }
        scope.spawn(|| model.fit(&features, &labels).unwrap());
    });
}

#[test]
fn test_imbalance_weight_reaches_the_booster() {
    // Every row has the same features, so the fitted probability is the
    // weighted share of delayed rows: 0.2 unweighted, 0.5 with weight 4.
    let records: Vec<FlightRecord> = (0..100)
        .map(|_| FlightRecord::new("Grupo LATAM", FlightType::International, 7))
        .collect();
    let features = preprocess(&records, FeatureSchema::top_ten()).unwrap();
    let labels: Vec<i32> = (0..100).map(|i| if i < 20 { 1 } else { 0 }).collect();

    let dir = tempfile::tempdir().unwrap();
    let model = model_in(&dir);
    model.fit(&features, &labels).unwrap();

    for p in model.predict_proba(&features).unwrap() {
        assert!((p - 0.5).abs() < 0.05, "delay probability {p}");
    }
}

#[test]
fn test_concurrent_fits_leave_resident_model_matching_latest() {
    let dir = tempfile::tempdir().unwrap();
    let model = model_in(&dir);
    let (features, wings_delayed) = training_set();
    // Same flights, but Sky Airline is late and Latin American Wings on time.
    let sky_delayed: Vec<i32> = (0..100)
        .map(|i| if i < 80 && i % 4 == 1 { 1 } else { 0 })
        .collect();

    std::thread::scope(|scope| {
        for labels in [&wings_delayed, &sky_delayed] {
            let (model, features) = (&model, &features);
            scope.spawn(move || {
                for _ in 0..3 {
                    model.fit(features, labels).unwrap();
                }
            });
        }
    });

    let resident = model.predict(&features).unwrap();
    assert!(resident == wings_delayed || resident == sky_delayed);
    let reloaded = model_in(&dir);
    assert_eq!(reloaded.predict(&features).unwrap(), resident);

    // Six run files plus latest.json.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 7);
}
