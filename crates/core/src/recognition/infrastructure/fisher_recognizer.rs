use image::GrayImage;

use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sample::{Prediction, Sample};

use super::features::{check_samples, distinct_labels, sample_matrix};
use super::params_codec;
use super::subspace::{centered, lda, pca, SubspaceProjection};

/// Fisherfaces: PCA down to `N - C` dimensions, then LDA down to at most
/// `C - 1`, then nearest neighbour.
#[derive(Default)]
pub struct FisherRecognizer {
    model: Option<SubspaceProjection>,
}

impl FisherRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(blob: &[u8]) -> Result<Self, RecognitionError> {
        let model: SubspaceProjection = params_codec::decode(AlgorithmKind::Fisher, blob)?;
        Ok(Self { model: Some(model) })
    }

    pub fn components(&self) -> usize {
        self.model.as_ref().map_or(0, SubspaceProjection::dimensions)
    }
}

impl FaceRecognizer for FisherRecognizer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Fisher
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn train(&mut self, samples: &[Sample]) -> Result<(), RecognitionError> {
        let size = check_samples(samples)?;
        let classes = distinct_labels(samples);
        if classes < AlgorithmKind::Fisher.min_distinct_labels() {
            return Err(RecognitionError::InsufficientTrainingData(format!(
                "Fisher needs at least 2 distinct labels, got {classes}"
            )));
        }

        let data = sample_matrix(samples);
        let labels: Vec<i32> = samples.iter().map(|s| s.label_id).collect();

        let principal = pca(&data, Some((samples.len() - classes).max(1)));
        if principal.components.ncols() == 0 {
            return Err(RecognitionError::InsufficientTrainingData(
                "training images are all identical".to_string(),
            ));
        }

        let reduced = principal
            .components
            .tr_mul(&centered(&data, &principal.mean));
        let discriminants = lda(&reduced, &labels, classes - 1);
        let basis = &principal.components * discriminants;
        log::debug!(
            "Fisher: {} samples, {} classes, {} PCA / {} LDA components",
            samples.len(),
            classes,
            principal.components.ncols(),
            basis.ncols()
        );

        self.model = Some(SubspaceProjection::fit(
            size,
            &data,
            &labels,
            principal.mean,
            basis,
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
        params_codec::encode(AlgorithmKind::Fisher, model)
    }
}
