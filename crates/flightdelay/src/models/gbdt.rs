use std::fmt;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::error::ModelError;
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;

/// Gradient Boosting Decision Tree (GBDT) classifier
#[derive(Serialize, Deserialize)]
pub struct GBDTClassifier {
    model: Option<GBDT>,
    params: ClassifierConfig,
}

impl GBDTClassifier {
    pub fn new(params: ClassifierConfig) -> Self {
        GBDTClassifier {
            model: None,
            params,
        }
    }

    pub fn params(&self) -> &ClassifierConfig {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn booster_config(&self, feature_size: usize) -> Config {
        let mut config = Config::new();

        config.set_feature_size(feature_size);
        config.set_shrinkage(self.params.learning_rate);
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.num_boost_round as usize);
        config.set_min_leaf_size(self.params.min_leaf_size);
        config.set_debug(self.params.debug);
        config.set_training_optimization_level(self.params.training_optimization_level);
        config.set_loss(&self.params.loss_type);
        // No row or feature subsampling: every fit over the same data
        // produces the same trees.
        config.set_data_sample_ratio(1.0);
        config.set_feature_sample_ratio(1.0);
        config
    }

    /// The log-likelihood loss expects labels in {-1, 1}.
    fn encode_label(&self, label: i32) -> f32 {
        match (self.params.loss_type.as_str(), label) {
            ("LogLikelyhood", 1) => 1.0,
            ("LogLikelyhood", _) => -1.0,
            (_, 1) => 1.0,
            _ => 0.0,
        }
    }
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32], sample_weight: &[f32]) -> Result<(), ModelError> {
        if x.nrows() != y.len() || y.len() != sample_weight.len() {
            return Err(ModelError::LengthMismatch {
                features: x.nrows(),
                labels: y.len(),
            });
        }

        let config = self.booster_config(x.ncols());
        let mut gbdt = GBDT::new(&config);

        let mut train_x: DataVec = x
            .rows()
            .zip(y.iter().zip(sample_weight))
            .map(|(row, (&label, &weight))| {
                Data::new_training_data(row.to_vec(), weight, self.encode_label(label), None)
            })
            .collect();

        gbdt.fit(&mut train_x);

        self.model = Some(gbdt);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::Unfitted)?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        let test_x: DataVec = x
            .rows()
            .map(|row| Data::new_test_data(row.to_vec(), None))
            .collect();
        Ok(model.predict(&test_x))
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

impl fmt::Debug for GBDTClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GBDTClassifier")
            .field("fitted", &self.is_fitted())
            .field("params", &self.params)
            .finish()
    }
}
