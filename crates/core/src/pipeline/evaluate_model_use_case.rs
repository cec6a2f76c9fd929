use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::dataset_descriptor::LabeledDataset;
use crate::dataset::sample_loader::SampleLoader;
use crate::evaluation::cross_validator::{cross_validate, EvaluationReport};
use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::sample::{assign_labels, LabeledFaces};

use super::pipeline_logger::PipelineLogger;

/// Shuffling rng for cross-validation; a seed makes the folds repeatable.
pub fn validation_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Loads every dataset's faces, reporting one progress step per dataset.
pub(crate) fn load_faces(
    loader: &mut SampleLoader,
    datasets: &[LabeledDataset],
    logger: &mut dyn PipelineLogger,
) -> Result<Vec<LabeledFaces>, Box<dyn std::error::Error>> {
    let mut loaded = Vec::with_capacity(datasets.len());
    for (i, dataset) in datasets.iter().enumerate() {
        let started = Instant::now();
        let faces = loader.load_datasets(std::slice::from_ref(dataset))?;
        logger.timing("load", started.elapsed().as_secs_f64() * 1000.0);

        let face_count: usize = faces.iter().map(|f| f.faces.len()).sum();
        logger.count("faces loaded", face_count);
        logger.count("images skipped", dataset.images.len() - face_count);
        logger.progress(i + 1, datasets.len());
        loaded.extend(faces);
    }
    Ok(loaded)
}

/// K-fold cross-validation of one algorithm over labeled image folders.
pub struct EvaluateModelUseCase {
    loader: SampleLoader,
    logger: Box<dyn PipelineLogger>,
}

impl EvaluateModelUseCase {
    pub fn new(loader: SampleLoader, logger: Box<dyn PipelineLogger>) -> Self {
        Self { loader, logger }
    }

    pub fn execute(
        &mut self,
        kind: AlgorithmKind,
        datasets: &[LabeledDataset],
        folds: usize,
        seed: Option<u64>,
    ) -> Result<EvaluationReport, Box<dyn std::error::Error>> {
        let faces = load_faces(&mut self.loader, datasets, self.logger.as_mut())?;
        let (labels, samples) = assign_labels(&faces);
        self.logger.info(&format!(
            "Evaluating {kind} on {} faces of {} people with {folds} folds",
            samples.len(),
            labels.len()
        ));

        let mut rng = validation_rng(seed);
        let started = Instant::now();
        let report = cross_validate(kind, &samples, folds, &mut rng)?;
        self.logger
            .timing("validate", started.elapsed().as_secs_f64() * 1000.0);
        self.logger.summary();
        Ok(report)
    }
}
