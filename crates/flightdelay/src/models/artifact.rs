//! Persisted classifier artifacts.
//!
//! Every successful fit writes the artifact twice: once under a timestamped
//! name (one file per training run) and once under `latest.json`, which is
//! what an untrained `DelayModel` loads on its first prediction. Both files
//! are written to a temporary file in the same directory and renamed into
//! place, so a reader never sees a partially written artifact.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::ClassifierConfig;
use crate::data_handling::FeatureTable;
use crate::error::ModelError;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::GBDTClassifier;

/// File name of the artifact loaded when no model is resident.
pub const LATEST_ARTIFACT: &str = "latest.json";

/// Local-time layout used to name per-run artifacts.
pub const RUN_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A fitted classifier together with the feature columns it was trained on.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    pub columns: Vec<String>,
    pub scale_pos_weight: f32,
    pub trained_at: DateTime<Utc>,
    pub classifier: GBDTClassifier,
    /// Per-run file written by the fit, or the file the model was loaded from.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl TrainedModel {
    pub fn config(&self) -> &ClassifierConfig {
        self.classifier.params()
    }

    /// Require `features` to carry exactly the trained columns, in order.
    pub fn check_schema(&self, features: &FeatureTable) -> Result<(), ModelError> {
        let actual = features.columns();
        if actual == self.columns.as_slice() {
            return Ok(());
        }

        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !actual.contains(*c))
            .cloned()
            .collect();
        let unexpected: Vec<String> = actual
            .iter()
            .filter(|c| !self.columns.contains(*c))
            .cloned()
            .collect();
        let reordered = missing.is_empty() && unexpected.is_empty();

        Err(ModelError::SchemaMismatch {
            missing,
            unexpected,
            reordered,
        })
    }

    pub fn predict_proba(&self, features: &FeatureTable) -> Result<Vec<f32>, ModelError> {
        self.check_schema(features)?;
        self.classifier.predict_proba(features.values())
    }

    pub fn predict(&self, features: &FeatureTable) -> Result<Vec<i32>, ModelError> {
        let threshold = self.config().threshold;
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| if p > threshold { 1 } else { 0 })
            .collect())
    }
}

/// Directory of serialized `TrainedModel`s.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_ARTIFACT)
    }

    pub fn run_path(&self, trained_at: &DateTime<Utc>) -> PathBuf {
        let name = trained_at
            .with_timezone(&Local)
            .format(RUN_NAME_FORMAT)
            .to_string();
        self.dir.join(format!("{}.json", name))
    }

    /// Persist `model` under its run name and as `latest.json`.
    ///
    /// A run name already taken by an earlier save gets a `-1`, `-2`, ...
    /// suffix, so every save keeps its own per-run file. Returns the path
    /// of the per-run artifact.
    pub fn save(&self, model: &TrainedModel) -> Result<PathBuf, ModelError> {
        fs::create_dir_all(&self.dir).map_err(|source| ModelError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let run_path = self.unused_run_path(&model.trained_at);
        let bytes = serde_json::to_vec(model).map_err(|source| ModelError::Serialization {
            path: run_path.clone(),
            source,
        })?;

        self.write_atomic(&run_path, &bytes)?;
        self.write_atomic(&self.latest_path(), &bytes)?;

        log::info!(
            "Saved model artifact to {} (latest: {})",
            run_path.display(),
            self.latest_path().display()
        );
        Ok(run_path)
    }

    /// Load `latest.json`, or `ModelError::NotTrained` if there is none.
    pub fn load_latest(&self) -> Result<TrainedModel, ModelError> {
        let path = self.latest_path();
        if !path.is_file() {
            return Err(ModelError::NotTrained { path });
        }
        self.load(&path)
    }

    /// Load a per-run artifact or `latest.json`.
    pub fn load(&self, path: &Path) -> Result<TrainedModel, ModelError> {
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut model: TrainedModel =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Serialization {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!(
            "Loaded model artifact {} ({} columns, trained at {})",
            path.display(),
            model.columns.len(),
            model.trained_at
        );
        model.path = Some(path.to_path_buf());
        Ok(model)
    }

    fn unused_run_path(&self, trained_at: &DateTime<Utc>) -> PathBuf {
        let base = self.run_path(trained_at);
        if !base.exists() {
            return base;
        }
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        (1..)
            .map(|n| self.dir.join(format!("{}-{}.json", stem, n)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(base)
    }

    fn write_atomic(&self, dest: &Path, bytes: &[u8]) -> Result<(), ModelError> {
        let io_err = |source| ModelError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(dest).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
