use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::shared::constants::UNKNOWN_LABEL;

use super::domain::algorithm_kind::{AlgorithmKind, ScorePolarity};
use super::domain::face_recognizer::FaceRecognizer;
use super::domain::label_dictionary::LabelDictionary;
use super::domain::recognition_error::RecognitionError;
use super::domain::sample::{assign_labels, Identification, LabeledFaces, Prediction};
use super::infrastructure::recognizer_factory::{create_recognizer, restore_recognizer};

/// The human-readable half of a saved model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub algorithm: String,
    pub labels: LabelDictionary,
}

/// Everything needed to rebuild a trained model.
#[derive(Clone, Debug)]
pub struct ModelArtifact {
    pub record: ModelRecord,
    pub params: Vec<u8>,
}

/// A recognizer of one kind together with the names of the people it
/// was trained on.
///
/// Starts untrained. A successful `train` or `load` makes it trained; a
/// failed `train` keeps whatever state it had, a failed `load` leaves it
/// untrained.
pub struct RecognizerModel {
    kind: AlgorithmKind,
    recognizer: Option<Box<dyn FaceRecognizer>>,
    labels: LabelDictionary,
}

impl RecognizerModel {
    pub fn new(kind: AlgorithmKind) -> Self {
        Self {
            kind,
            recognizer: None,
            labels: LabelDictionary::new(),
        }
    }

    /// Rebuilds a model of whatever kind the artifact records.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self, RecognitionError> {
        let kind = record_kind(&artifact.record)?;
        let mut model = Self::new(kind);
        model.load(artifact)?;
        Ok(model)
    }

    pub fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    pub fn is_trained(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn labels(&self) -> &LabelDictionary {
        &self.labels
    }

    /// Assigns ids `0..n` to `datasets` in order, then trains a fresh
    /// recognizer on all of their faces.
    pub fn train(&mut self, datasets: &[LabeledFaces]) -> Result<(), RecognitionError> {
        if datasets.is_empty() {
            return Err(RecognitionError::InsufficientTrainingData(
                "no datasets given".to_string(),
            ));
        }

        if let Some(empty) = datasets.iter().find(|d| d.faces.is_empty()) {
            return Err(RecognitionError::InsufficientTrainingData(format!(
                "dataset '{}' has no face images",
                empty.label
            )));
        }
        let (labels, samples) = assign_labels(datasets);

        let min_labels = self.kind.min_distinct_labels();
        if labels.len() < min_labels {
            return Err(RecognitionError::InsufficientTrainingData(format!(
                "{} needs at least {min_labels} labels, got {}",
                self.kind,
                labels.len()
            )));
        }

        let mut recognizer = create_recognizer(self.kind);
        recognizer.train(&samples)?;
        log::info!(
            "Trained {} model on {} faces of {} people",
            self.kind,
            samples.len(),
            labels.len()
        );
        self.recognizer = Some(recognizer);
        self.labels = labels;
        Ok(())
    }

    /// Identifies `face`, reporting `"Unknown"` when the score fails
    /// `threshold` or the predicted id has no name.
    pub fn predict(&self, face: &GrayImage, threshold: f64) -> Result<Identification, RecognitionError> {
        let prediction = self.predict_raw(face)?;
        Ok(self.identify(prediction, self.kind.polarity(), threshold))
    }

    fn identify(
        &self,
        prediction: Prediction,
        polarity: ScorePolarity,
        threshold: f64,
    ) -> Identification {
        let accepted = Some(prediction.label_id)
            .filter(|_| !polarity.rejects(prediction.score, threshold))
            .filter(|&id| self.labels.contains(id));
        Identification {
            label_id: accepted,
            label: accepted
                .map_or(UNKNOWN_LABEL, |id| self.labels.resolve(id))
                .to_string(),
            score: prediction.score,
        }
    }

    /// Nearest label id and score with no threshold applied.
    pub fn predict_raw(&self, face: &GrayImage) -> Result<Prediction, RecognitionError> {
        self.recognizer
            .as_ref()
            .ok_or(RecognitionError::ModelNotTrained)?
            .predict(face)
    }

    pub fn export(&self) -> Result<ModelArtifact, RecognitionError> {
        let recognizer = self.recognizer.as_ref().ok_or(RecognitionError::ModelNotTrained)?;
        Ok(ModelArtifact {
            record: ModelRecord {
                algorithm: self.kind.name().to_string(),
                labels: self.labels.clone(),
            },
            params: recognizer.export_params()?,
        })
    }

    /// Replaces the model state with `artifact`.
    pub fn load(&mut self, artifact: &ModelArtifact) -> Result<(), RecognitionError> {
        let result = self.restore(artifact);
        if result.is_err() {
            self.recognizer = None;
            self.labels = LabelDictionary::new();
        }
        result
    }

    fn restore(&mut self, artifact: &ModelArtifact) -> Result<(), RecognitionError> {
        let recorded = record_kind(&artifact.record)?;
        if recorded != self.kind {
            return Err(RecognitionError::ModelCorrupt(format!(
                "expected a {} model, found {recorded}",
                self.kind
            )));
        }

        let recognizer = restore_recognizer(self.kind, &artifact.params)?;
        let labels = &artifact.record.labels;
        if let Some(missing) = recognizer.label_ids().into_iter().find(|&id| !labels.contains(id)) {
            return Err(RecognitionError::ModelCorrupt(format!(
                "label id {missing} has no name in the model record"
            )));
        }

        self.recognizer = Some(recognizer);
        self.labels = labels.clone();
        Ok(())
    }
}

fn record_kind(record: &ModelRecord) -> Result<AlgorithmKind, RecognitionError> {
    record.algorithm.parse().map_err(|_| {
        RecognitionError::ModelCorrupt(format!("unknown algorithm '{}'", record.algorithm))
    })
}
