use std::path::PathBuf;

use thiserror::Error;

/// Failures while deriving features or labels from flight records.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("row {row}: {field} value {value:?} does not match the layout \"%Y-%m-%d %H:%M:%S\"")]
    Parse {
        row: usize,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("row {row}: field {field} is required by column {column:?} but is missing")]
    MissingField {
        row: usize,
        field: &'static str,
        column: String,
    },

    #[error("row {row}: invalid {field} value {value:?}")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// Failures of the delay classifier and its artifact store.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no model in memory and no persisted artifact at {}", path.display())]
    NotTrained { path: PathBuf },

    #[error(
        "feature columns do not match the trained schema \
         (missing: {missing:?}, unexpected: {unexpected:?}, reordered: {reordered})"
    )]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
        reordered: bool,
    },

    #[error("training labels contain no delayed rows; the positive-class weight is undefined")]
    NoPositiveLabels,

    #[error("cannot train on {negatives} on-time and {positives} delayed rows")]
    DegenerateLabels { negatives: usize, positives: usize },

    #[error("label {label} at row {row} is neither 0 nor 1")]
    InvalidLabel { row: usize, label: i32 },

    #[error("{features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("booster has not been fitted")]
    Unfitted,

    #[error("artifact I/O failed for {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {} could not be (de)serialized", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reading or writing tabular files.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{predictions} predictions but {probabilities} probabilities")]
    LengthMismatch {
        predictions: usize,
        probabilities: usize,
    },
}
