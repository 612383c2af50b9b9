//! The delay classifier: fit, persist, lazily reload and predict.
//!
//! ```text
//! Untrained --fit--> Trained (resident)
//! Untrained --predict--> load latest.json --ok--> Trained
//!                                         --missing--> ModelError::NotTrained
//! ```
//!
//! The resident model sits behind an `RwLock<Option<Arc<_>>>`. Predictions
//! clone the `Arc` and release the lock immediately; `fit` only takes the
//! write lock once the new model is fully trained and persisted, so
//! concurrent predictions see either the old or the new model. Concurrent
//! fits persist and publish one at a time, so the resident model is always
//! the one in `latest.json`.
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::config::ClassifierConfig;
use crate::data_handling::FeatureTable;
use crate::error::ModelError;
use crate::models::artifact::{ArtifactStore, TrainedModel};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::GBDTClassifier;

pub struct DelayModel {
    config: ClassifierConfig,
    store: ArtifactStore,
    resident: RwLock<Option<Arc<TrainedModel>>>,
    /// Serializes persist-and-publish so `latest.json` and the resident
    /// model always come from the same fit.
    publish: Mutex<()>,
}

impl DelayModel {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(models_dir, ClassifierConfig::default())
    }

    pub fn with_config(models_dir: impl Into<PathBuf>, config: ClassifierConfig) -> Self {
        DelayModel {
            config,
            store: ArtifactStore::new(models_dir),
            resident: RwLock::new(None),
            publish: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn is_loaded(&self) -> bool {
        self.resident.read().is_some()
    }

    /// Drop the resident model; the next prediction reloads `latest.json`.
    pub fn unload(&self) {
        *self.resident.write() = None;
    }

    /// Train on `features`/`labels`, persist the artifact and make it the
    /// resident model.
    ///
    /// The positive-class weight is `count(0) / count(1)`; delayed rows are
    /// the minority and are weighted up accordingly.
    pub fn fit(
        &self,
        features: &FeatureTable,
        labels: &[i32],
    ) -> Result<Arc<TrainedModel>, ModelError> {
        if features.nrows() != labels.len() {
            return Err(ModelError::LengthMismatch {
                features: features.nrows(),
                labels: labels.len(),
            });
        }
        let weight = scale_pos_weight(labels)?;
        let sample_weight: Vec<f32> = labels
            .iter()
            .map(|&label| if label == 1 { weight } else { 1.0 })
            .collect();

        let mut classifier = GBDTClassifier::new(self.config.clone());
        log::info!(
            "Training {} classifier on {} rows x {} features \
             (positive-class weight {:.4}, learning rate {}, {} rounds, seed {})",
            classifier.name(),
            features.nrows(),
            features.ncols(),
            weight,
            self.config.learning_rate,
            self.config.num_boost_round,
            self.config.seed
        );
        classifier.fit(features.values(), labels, &sample_weight)?;

        let _publishing = self.publish.lock();
        let mut trained = TrainedModel {
            columns: features.columns().to_vec(),
            scale_pos_weight: weight,
            trained_at: Utc::now(),
            classifier,
            path: None,
        };
        trained.path = Some(self.store.save(&trained)?);

        let trained = Arc::new(trained);
        *self.resident.write() = Some(Arc::clone(&trained));
        Ok(trained)
    }

    /// Predict 0 (on time) or 1 (delayed) per row.
    pub fn predict(&self, features: &FeatureTable) -> Result<Vec<i32>, ModelError> {
        self.resident_or_load()?.predict(features)
    }

    /// Probability of delay per row.
    pub fn predict_proba(&self, features: &FeatureTable) -> Result<Vec<f32>, ModelError> {
        self.resident_or_load()?.predict_proba(features)
    }

    /// Replace the resident model with `latest.json` from disk.
    pub fn load_latest(&self) -> Result<Arc<TrainedModel>, ModelError> {
        let _publishing = self.publish.lock();
        let loaded = Arc::new(self.store.load_latest()?);
        *self.resident.write() = Some(Arc::clone(&loaded));
        log::info!(
            "Loaded model from {} trained at {}",
            self.store.latest_path().display(),
            loaded.trained_at
        );
        Ok(loaded)
    }

    fn resident_or_load(&self) -> Result<Arc<TrainedModel>, ModelError> {
        if let Some(model) = self.resident.read().as_ref() {
            return Ok(Arc::clone(model));
        }

        let mut guard = self.resident.write();
        if let Some(model) = guard.as_ref() {
            return Ok(Arc::clone(model));
        }
        let loaded = Arc::new(self.store.load_latest()?);
        log::info!(
            "No resident model; loaded {} trained at {}",
            self.store.latest_path().display(),
            loaded.trained_at
        );
        *guard = Some(Arc::clone(&loaded));
        Ok(loaded)
    }
}

/// Ratio of on-time to delayed rows, used as the positive-class weight.
///
/// # Errors
///
/// * `ModelError::InvalidLabel` for labels other than 0 and 1.
/// * `ModelError::DegenerateLabels` for an empty set or one without
///   on-time rows.
/// * `ModelError::NoPositiveLabels` when no row is delayed.
pub fn scale_pos_weight(labels: &[i32]) -> Result<f32, ModelError> {
    if let Some((row, &label)) = labels.iter().enumerate().find(|(_, &l)| l != 0 && l != 1) {
        return Err(ModelError::InvalidLabel { row, label });
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;

    if labels.is_empty() || negatives == 0 {
        return Err(ModelError::DegenerateLabels {
            negatives,
            positives,
        });
    }
    if positives == 0 {
        return Err(ModelError::NoPositiveLabels);
    }
    Ok(negatives as f32 / positives as f32)
}
