use image::GrayImage;

use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sample::{Prediction, Sample};

use super::features::{check_samples, sample_matrix};
use super::params_codec;
use super::subspace::{pca, SubspaceProjection};

/// Eigenfaces: nearest neighbour in the principal-component space of
/// the training faces.
#[derive(Default)]
pub struct EigenRecognizer {
    max_components: Option<usize>,
    model: Option<SubspaceProjection>,
}

impl EigenRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `count` principal components.
    pub fn with_components(count: usize) -> Self {
        Self {
            max_components: Some(count.max(1)),
            model: None,
        }
    }

    pub fn from_params(blob: &[u8]) -> Result<Self, RecognitionError> {
        let model: SubspaceProjection = params_codec::decode(AlgorithmKind::Eigen, blob)?;
        Ok(Self {
            max_components: None,
            model: Some(model),
        })
    }

    pub fn components(&self) -> usize {
        self.model.as_ref().map_or(0, SubspaceProjection::dimensions)
    }
}

impl FaceRecognizer for EigenRecognizer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Eigen
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn train(&mut self, samples: &[Sample]) -> Result<(), RecognitionError> {
        let size = check_samples(samples)?;
        let data = sample_matrix(samples);
        let labels: Vec<i32> = samples.iter().map(|s| s.label_id).collect();

        let fitted = pca(&data, self.max_components);
        log::debug!(
            "Eigen: {} samples, {} components",
            samples.len(),
            fitted.components.ncols()
        );
        self.model = Some(SubspaceProjection::fit(
            size,
            &data,
            &labels,
            fitted.mean,
            fitted.components,
        ));
        Ok(())
    }

    fn predict(&self, face: &GrayImage) -> Result<Prediction, RecognitionError> {
        self.model
            .as_ref()
            .ok_or(RecognitionError::ModelNotTrained)?
            .predict(face)
    }

    fn label_ids(&self) -> Vec<i32> {
        self.model
            .as_ref()
            .map(|m| m.labels().to_vec())
            .unwrap_or_default()
    }

    fn export_params(&self) -> Result<Vec<u8>, RecognitionError> {
        let model = self.model.as_ref().ok_or(RecognitionError::ModelNotTrained)?;
        params_codec::encode(AlgorithmKind::Eigen, model)
    }
}
