use crate::error::ModelError;
use crate::math::Array2;

/// A small trait abstraction for binary classifiers backing the delay model.
///
/// Labels use the 0/1 convention (1 = delayed). `sample_weight` carries one
/// weight per row and is how class imbalance is passed to the learner.
pub trait ClassifierModel {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32], sample_weight: &[f32]) -> Result<(), ModelError>;

    /// Probability of the positive class per row.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, ModelError>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
