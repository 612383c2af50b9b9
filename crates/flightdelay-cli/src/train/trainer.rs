use anyhow::{Context, Result};
use std::path::PathBuf;

use flightdelay::data_handling::holdout_split;
use flightdelay::io::read_flights_csv;
use flightdelay::models::DelayModel;
use flightdelay::preprocessing::{preprocess_with_labels, FeatureSchema};
use flightdelay::stats::{roc_auc, ClassificationReport};

use super::input::TrainConfig;

/// What a training run produced.
#[derive(Debug)]
pub struct TrainSummary {
    pub train_rows: usize,
    pub validation_rows: usize,
    pub columns: Vec<String>,
    pub scale_pos_weight: f32,
    pub artifact: PathBuf,
    pub report: Option<ClassificationReport>,
    pub roc_auc: Option<f64>,
}

pub fn run_training(config: &TrainConfig) -> Result<TrainSummary> {
    let records = read_flights_csv(&config.train_data)
        .with_context(|| format!("Failed to load training data: {}", config.train_data))?;

    let schema = FeatureSchema::for_set(config.feature_set);
    log::info!(
        "Deriving {} features ({} columns) and delay labels",
        config.feature_set,
        schema.len()
    );
    let (features, labels) =
        preprocess_with_labels(&records, schema).context("Failed to derive features")?;

    let delayed = labels.iter().filter(|&&l| l == 1).count();
    log::info!(
        "{} flights, {} delayed by more than 15 minutes ({:.1}%)",
        labels.len(),
        delayed,
        100.0 * delayed as f64 / labels.len().max(1) as f64
    );

    let (train_idx, valid_idx) = holdout_split(
        features.nrows(),
        config.validation_fraction,
        config.classifier.seed,
    );
    if valid_idx.is_empty() {
        log::warn!("No validation split configured; training on all rows.");
    } else {
        log::info!(
            "Holding out {} of {} rows for validation (seed {})",
            valid_idx.len(),
            features.nrows(),
            config.classifier.seed
        );
    }

    let train_x = features.select_rows(&train_idx);
    let train_y: Vec<i32> = train_idx.iter().map(|&i| labels[i]).collect();

    let model = DelayModel::with_config(&config.models_dir, config.classifier.clone());
    let trained = model
        .fit(&train_x, &train_y)
        .context("Failed to train delay classifier")?;

    let (report, auc) = if valid_idx.is_empty() {
        (None, None)
    } else {
        let valid_x = features.select_rows(&valid_idx);
        let valid_y: Vec<i32> = valid_idx.iter().map(|&i| labels[i]).collect();
        let probabilities = trained.predict_proba(&valid_x)?;
        let predictions = trained.predict(&valid_x)?;

        let report = ClassificationReport::compute(&valid_y, &predictions);
        report.log();
        let auc = roc_auc(&probabilities, &valid_y);
        match auc {
            Some(auc) => log::info!("Validation ROC AUC: {:.4}", auc),
            None => log::warn!("Validation split holds a single class; ROC AUC undefined"),
        }
        (Some(report), auc)
    };

    let artifact = trained
        .path
        .clone()
        .unwrap_or_else(|| model.store().latest_path());
    log::info!("Training complete. Model written to {}", artifact.display());

    Ok(TrainSummary {
        train_rows: train_idx.len(),
        validation_rows: valid_idx.len(),
        columns: trained.columns.clone(),
        scale_pos_weight: trained.scale_pos_weight,
        artifact,
        report,
        roc_auc: auc,
    })
}
