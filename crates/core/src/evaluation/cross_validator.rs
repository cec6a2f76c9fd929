use std::ops::Range;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sample::Sample;
use crate::recognition::infrastructure::recognizer_factory::create_recognizer;

/// How `samples` are cut into `folds` equal test slices.
///
/// Each slice holds `samples / folds` items; the `samples % folds`
/// trailing items are only ever used for training.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoldPlan {
    samples: usize,
    folds: usize,
    cutoff: usize,
}

impl FoldPlan {
    /// Fails with `InsufficientTrainingData` when `samples < folds`, as
    /// folds with empty test slices have no defined accuracy.
    pub fn new(samples: usize, folds: usize) -> Result<Self, RecognitionError> {
        if folds < 2 {
            return Err(RecognitionError::InvalidFoldCount(folds));
        }
        let cutoff = samples / folds;
        if cutoff == 0 {
            return Err(RecognitionError::InsufficientTrainingData(format!(
                "{samples} samples cannot fill {folds} folds"
            )));
        }
        Ok(Self {
            samples,
            folds,
            cutoff,
        })
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Number of test samples per fold.
    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Test slice of fold `fold`; fold 0 takes the last full slice.
    pub fn test_range(&self, fold: usize) -> Range<usize> {
        let start = (self.folds - fold - 1) * self.cutoff;
        start..start + self.cutoff
    }

    /// Samples that fall in no test slice.
    pub fn untested(&self) -> usize {
        self.samples - self.folds * self.cutoff
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationReport {
    pub fold_scores: Vec<f64>,
    /// Mean of `fold_scores`.
    pub accuracy: f64,
    pub untested: usize,
}

/// K-fold cross-validation of a fresh `kind` recognizer per fold.
///
/// Samples are shuffled with `rng` first, so a seeded rng gives a
/// reproducible report. Each fold trains on everything outside its test
/// slice and scores the raw top-1 label of every test sample.
pub fn cross_validate<R: Rng + ?Sized>(
    kind: AlgorithmKind,
    samples: &[Sample],
    folds: usize,
    rng: &mut R,
) -> Result<EvaluationReport, RecognitionError> {
    let plan = FoldPlan::new(samples.len(), folds)?;
    if plan.untested() > 0 {
        log::warn!(
            "{} of {} samples fall outside every test fold and are never evaluated",
            plan.untested(),
            samples.len()
        );
    }

    let mut shuffled = samples.to_vec();
    shuffled.shuffle(rng);

    let mut fold_scores = Vec::with_capacity(folds);
    for fold in 0..folds {
        let test = plan.test_range(fold);
        let training: Vec<Sample> = shuffled[..test.start]
            .iter()
            .chain(&shuffled[test.end..])
            .cloned()
            .collect();

        let mut recognizer = create_recognizer(kind);
        recognizer.train(&training)?;

        let mut correct = 0usize;
        for sample in &shuffled[test.clone()] {
            if recognizer.predict(&sample.feature)?.label_id == sample.label_id {
                correct += 1;
            }
        }
        let score = correct as f64 / test.len() as f64;
        log::info!("{kind} fold {}/{folds}: accuracy {score:.3}", fold + 1);
        fold_scores.push(score);
    }

    let accuracy = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
    log::info!("{kind} cross-validation accuracy {accuracy:.3} over {folds} folds");
    Ok(EvaluationReport {
        fold_scores,
        accuracy,
        untested: plan.untested(),
    })
}
