use std::collections::BTreeSet;

use image::GrayImage;
use nalgebra::{DMatrix, DVector};

use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sample::Sample;

/// Checks that the training set is non-empty and uniformly sized.
///
/// Returns the shared `(width, height)`.
pub fn check_samples(samples: &[Sample]) -> Result<(u32, u32), RecognitionError> {
    let first = samples.first().ok_or_else(|| {
        RecognitionError::InsufficientTrainingData("no training samples".to_string())
    })?;
    let expected = first.feature.dimensions();
    if expected.0 == 0 || expected.1 == 0 {
        return Err(RecognitionError::InsufficientTrainingData(
            "training images are empty".to_string(),
        ));
    }
    for sample in samples {
        check_face_size(expected, &sample.feature)?;
    }
    Ok(expected)
}

pub fn check_face_size(expected: (u32, u32), face: &GrayImage) -> Result<(), RecognitionError> {
    let actual = face.dimensions();
    if actual != expected {
        return Err(RecognitionError::FeatureSize { expected, actual });
    }
    Ok(())
}

pub fn distinct_labels(samples: &[Sample]) -> usize {
    samples
        .iter()
        .map(|s| s.label_id)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Row-major pixel intensities as a column vector.
pub fn to_vector(image: &GrayImage) -> DVector<f64> {
    DVector::from_iterator(
        image.as_raw().len(),
        image.as_raw().iter().map(|&p| p as f64),
    )
}

/// One column per sample.
pub fn sample_matrix(samples: &[Sample]) -> DMatrix<f64> {
    let columns: Vec<DVector<f64>> = samples.iter().map(|s| to_vector(&s.feature)).collect();
    let rows = columns.first().map_or(0, |c| c.len());
    columns_to_matrix(rows, &columns)
}

pub fn columns_to_matrix(rows: usize, columns: &[DVector<f64>]) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(rows, columns.len());
    for (i, column) in columns.iter().enumerate() {
        matrix.set_column(i, column);
    }
    matrix
}
