use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hyper-parameters of the gradient-boosted delay classifier.
///
/// The defaults favour many small corrective trees (`learning_rate` 0.01)
/// over a few large ones, with a fixed `seed` so that training runs are
/// reproducible.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub learning_rate: f32,
    pub num_boost_round: u32,
    pub max_depth: u32,
    pub min_leaf_size: usize,
    pub seed: u64,
    pub training_optimization_level: u8,
    pub loss_type: String,
    /// Probability above which a row is predicted as delayed.
    pub threshold: f32,
    pub debug: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            num_boost_round: 100,
            max_depth: 6,
            min_leaf_size: 1,
            seed: 1,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
            threshold: 0.5,
            debug: false,
        }
    }
}

/// Which pinned feature schema to derive.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSet {
    /// The ten most important indicator columns; needs only airline,
    /// flight type and month.
    #[default]
    TopTen,
    /// Top ten plus day-name/destination indicators and cyclical
    /// encodings; needs full records.
    Extended,
}

impl FromStr for FeatureSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top-ten" | "top10" | "topten" => Ok(FeatureSet::TopTen),
            "extended" => Ok(FeatureSet::Extended),
            _ => Err(format!(
                "Unknown feature set: {}. Expected one of: top-ten, extended",
                s
            )),
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureSet::TopTen => write!(f, "top-ten"),
            FeatureSet::Extended => write!(f, "extended"),
        }
    }
}
