use anyhow::{Context, Result};
use std::io;
use std::path::PathBuf;

use flightdelay::config::FeatureSet;
use flightdelay::io::{prediction_rows, read_flights_csv, write_predictions, write_predictions_csv};
use flightdelay::models::DelayModel;
use flightdelay::preprocessing::{preprocess, FeatureSchema};

/// Settings for the `predict` subcommand.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub data: String,
    /// `None` writes to stdout.
    pub output: Option<PathBuf>,
    pub models_dir: PathBuf,
    /// Schema to derive; by default the one the latest model was trained on.
    pub feature_set: Option<FeatureSet>,
}

/// Predict every row of `config.data` with the latest persisted model.
///
/// Returns the 0/1 prediction per input row.
pub fn run_prediction(config: &PredictConfig) -> Result<Vec<i32>> {
    let model = DelayModel::new(&config.models_dir);
    let trained = model
        .load_latest()
        .context("Failed to load the latest model")?;

    let feature_set = match config.feature_set {
        Some(set) => set,
        None => infer_feature_set(&trained.columns),
    };
    log::info!("Deriving {} features for prediction", feature_set);

    let records = read_flights_csv(&config.data)
        .with_context(|| format!("Failed to load input data: {}", config.data))?;
    let features = preprocess(&records, FeatureSchema::for_set(feature_set))
        .context("Failed to derive features")?;

    let probabilities = trained.predict_proba(&features)?;
    let predictions = trained.predict(&features)?;

    match &config.output {
        Some(path) => write_predictions_csv(path, &predictions, &probabilities)?,
        None => {
            let rows = prediction_rows(&predictions, &probabilities)?;
            write_predictions(io::stdout().lock(), &rows)
                .context("Failed to write predictions to stdout")?;
        }
    }

    let delayed = predictions.iter().filter(|&&p| p == 1).count();
    log::info!(
        "Predicted {} of {} flights as delayed",
        delayed,
        predictions.len()
    );
    Ok(predictions)
}

/// The shipped schema whose columns equal `columns`, falling back to the
/// default set (which then fails the model's schema check).
fn infer_feature_set(columns: &[String]) -> FeatureSet {
    [FeatureSet::TopTen, FeatureSet::Extended]
        .into_iter()
        .find(|&set| FeatureSchema::for_set(set).column_names() == columns)
        .unwrap_or_default()
}
