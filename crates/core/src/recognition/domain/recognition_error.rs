use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("invalid algorithm '{0}': expected one of Eigen, Fisher, LBPH")]
    InvalidAlgorithm(String),
    /// Too few samples or labels to train. Cross-validation also reports
    /// this when there are fewer samples than folds: every fold would
    /// test nothing and its accuracy would be 0/0, so no run is attempted.
    #[error("insufficient training data: {0}")]
    InsufficientTrainingData(String),
    #[error("model has not been trained")]
    ModelNotTrained,
    #[error("model is corrupt: {0}")]
    ModelCorrupt(String),
    #[error("cross-validation needs at least 2 folds, got {0}")]
    InvalidFoldCount(usize),
    #[error("face image is {actual:?} but the model expects {expected:?}")]
    FeatureSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
