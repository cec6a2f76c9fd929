use std::time::Instant;

use crate::dataset::dataset_descriptor::LabeledDataset;
use crate::dataset::sample_loader::SampleLoader;
use crate::evaluation::cross_validator::{cross_validate, EvaluationReport};
use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::label_dictionary::LabelDictionary;
use crate::recognition::domain::sample::assign_labels;
use crate::recognition::infrastructure::model_store::ModelStore;
use crate::recognition::recognizer_model::RecognizerModel;

use super::evaluate_model_use_case::{load_faces, validation_rng};
use super::pipeline_logger::PipelineLogger;

/// Optional cross-validation run before the final model is trained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validation {
    pub folds: usize,
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub labels: LabelDictionary,
    pub faces: usize,
    pub evaluation: Option<EvaluationReport>,
}

/// Training pipeline: load faces → (validate) → train on everything → save.
pub struct TrainModelUseCase {
    loader: SampleLoader,
    store: ModelStore,
    logger: Box<dyn PipelineLogger>,
}

impl TrainModelUseCase {
    pub fn new(loader: SampleLoader, store: ModelStore, logger: Box<dyn PipelineLogger>) -> Self {
        Self {
            loader,
            store,
            logger,
        }
    }

    /// Trains a `kind` model on `datasets` and saves it as `name`.
    ///
    /// Nothing is written when loading, validation or training fails.
    pub fn execute(
        &mut self,
        kind: AlgorithmKind,
        datasets: &[LabeledDataset],
        name: &str,
        validation: Option<Validation>,
    ) -> Result<TrainingOutcome, Box<dyn std::error::Error>> {
        let faces = load_faces(&mut self.loader, datasets, self.logger.as_mut())?;

        let evaluation = match validation {
            Some(v) => {
                let (_, samples) = assign_labels(&faces);
                let started = Instant::now();
                let report = cross_validate(kind, &samples, v.folds, &mut validation_rng(v.seed))?;
                self.logger
                    .timing("validate", started.elapsed().as_secs_f64() * 1000.0);
                self.logger.info(&format!(
                    "{kind} cross-validation accuracy: {:.3}",
                    report.accuracy
                ));
                Some(report)
            }
            None => None,
        };

        let mut model = RecognizerModel::new(kind);
        let started = Instant::now();
        model.train(&faces)?;
        self.logger
            .timing("train", started.elapsed().as_secs_f64() * 1000.0);

        self.store.save(name, &model)?;
        self.logger.summary();

        Ok(TrainingOutcome {
            labels: model.labels().clone(),
            faces: faces.iter().map(|f| f.faces.len()).sum(),
            evaluation,
        })
    }
}
