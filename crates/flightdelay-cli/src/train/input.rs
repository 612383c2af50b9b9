use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use flightdelay::config::{ClassifierConfig, FeatureSet};

use crate::util::validate_tsv_or_csv_file;

/// Settings for the `train` subcommand.
///
/// Loaded from an optional JSON file; command line flags override the file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: String,
    pub models_dir: String,
    pub feature_set: FeatureSet,
    /// Share of rows held out (seeded by `classifier.seed`) for the
    /// evaluation report. 0 trains on every row.
    pub validation_fraction: f32,
    pub classifier: ClassifierConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::new(),
            models_dir: String::from("models"),
            feature_set: FeatureSet::TopTen,
            validation_fraction: 0.0,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => TrainConfig::default(),
        };

        // Apply CLI overrides
        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        validate_tsv_or_csv_file(&config.train_data)?;

        if let Some(models_dir) = matches.get_one::<String>("models_dir") {
            config.models_dir = models_dir.clone();
        }

        if let Some(feature_set) = matches.get_one::<String>("feature_set") {
            config.feature_set = feature_set.parse().map_err(anyhow::Error::msg)?;
        }

        if let Some(fraction) = matches.get_one::<f32>("validation_fraction") {
            config.validation_fraction = *fraction;
        }

        if !(0.0..1.0).contains(&config.validation_fraction) {
            anyhow::bail!(
                "validation_fraction must be in [0, 1), got {}",
                config.validation_fraction
            );
        }

        Ok(config)
    }
}
