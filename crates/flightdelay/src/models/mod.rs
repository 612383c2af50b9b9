pub mod artifact;
pub mod classifier_trait;
pub mod delay_model;
pub mod gbdt;

pub use artifact::{ArtifactStore, TrainedModel, LATEST_ARTIFACT};
pub use classifier_trait::ClassifierModel;
pub use delay_model::{scale_pos_weight, DelayModel};
pub use self::gbdt::GBDTClassifier;
