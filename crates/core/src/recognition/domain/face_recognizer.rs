use image::GrayImage;

use super::algorithm_kind::AlgorithmKind;
use super::recognition_error::RecognitionError;
use super::sample::{Prediction, Sample};

/// A trainable nearest-neighbour face classifier.
///
/// Implementations own their learned parameters. `train` replaces them
/// wholesale; a failed `train` leaves the previous parameters in place.
pub trait FaceRecognizer: Send + Sync {
    fn kind(&self) -> AlgorithmKind;

    fn is_trained(&self) -> bool;

    fn train(&mut self, samples: &[Sample]) -> Result<(), RecognitionError>;

    /// Nearest training label for `face`, with the raw score.
    fn predict(&self, face: &GrayImage) -> Result<Prediction, RecognitionError>;

    /// Every label id the learned parameters can return.
    fn label_ids(&self) -> Vec<i32>;

    /// Serializes the learned parameters into an opaque blob.
    fn export_params(&self) -> Result<Vec<u8>, RecognitionError>;
}
