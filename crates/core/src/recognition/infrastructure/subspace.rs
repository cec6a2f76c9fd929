use std::collections::BTreeMap;

use image::GrayImage;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};

use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sample::Prediction;

use super::features::{check_face_size, columns_to_matrix, to_vector};

/// Eigenvalues below this fraction of the largest are treated as zero.
const EIGEN_TOLERANCE: f64 = 1e-10;

/// Ridge added to the within-class scatter, relative to its mean variance.
const WITHIN_CLASS_RIDGE: f64 = 1e-6;

/// Principal components of a sample matrix.
pub struct Pca {
    pub mean: DVector<f64>,
    /// One unit-norm component per column, strongest first.
    pub components: DMatrix<f64>,
}

/// Computes principal components of `data` (one sample per column).
///
/// Works on the `N x N` Gram matrix so the cost depends on the number of
/// samples, not the number of pixels. Components with negligible variance
/// are dropped; at most `max_components` are kept.
pub fn pca(data: &DMatrix<f64>, max_components: Option<usize>) -> Pca {
    let mean = data.column_mean();
    let deviations = centered(data, &mean);

    let pairs = descending_eigenpairs(deviations.tr_mul(&deviations));
    let largest = pairs.first().map_or(0.0, |(value, _)| *value);
    let tolerance = largest.max(0.0) * EIGEN_TOLERANCE;
    let kept: Vec<DVector<f64>> = pairs
        .into_iter()
        .filter(|(value, _)| *value > tolerance && *value > 0.0)
        .take(max_components.unwrap_or(usize::MAX))
        .map(|(value, vector)| (&deviations * vector) / value.sqrt())
        .collect();

    Pca {
        mean,
        components: columns_to_matrix(data.nrows(), &kept),
    }
}

/// Subtracts `mean` from every column of `data`.
pub fn centered(data: &DMatrix<f64>, mean: &DVector<f64>) -> DMatrix<f64> {
    let mut result = data.clone();
    for mut column in result.column_iter_mut() {
        column -= mean;
    }
    result
}

/// Linear discriminant directions for `projected` (one sample per column).
///
/// Whitens the within-class scatter, then diagonalizes the between-class
/// scatter in the whitened space. Returns at most `max_components`
/// directions as columns.
pub fn lda(projected: &DMatrix<f64>, labels: &[i32], max_components: usize) -> DMatrix<f64> {
    let dims = projected.nrows();
    let overall = projected.column_mean();

    let mut classes: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        classes.entry(label).or_default().push(i);
    }

    let mut within = DMatrix::<f64>::zeros(dims, dims);
    let mut between = DMatrix::<f64>::zeros(dims, dims);
    for members in classes.values() {
        let mut class_mean = DVector::<f64>::zeros(dims);
        for &i in members {
            class_mean += projected.column(i);
        }
        class_mean /= members.len() as f64;

        for &i in members {
            let offset = projected.column(i) - &class_mean;
            within += &offset * offset.transpose();
        }
        let offset = &class_mean - &overall;
        between += (&offset * offset.transpose()) * members.len() as f64;
    }

    let ridge = WITHIN_CLASS_RIDGE * (within.trace() / dims.max(1) as f64).max(1.0);
    for i in 0..dims {
        within[(i, i)] += ridge;
    }

    let mut whitening = DMatrix::<f64>::zeros(dims, dims);
    for (j, (value, vector)) in descending_eigenpairs(within).into_iter().enumerate() {
        whitening.set_column(j, &(vector / value.max(ridge).sqrt()));
    }

    let whitened = whitening.transpose() * &between * &whitening;
    let symmetric = (&whitened + whitened.transpose()) * 0.5;
    let directions: Vec<DVector<f64>> = descending_eigenpairs(symmetric)
        .into_iter()
        .take(max_components.clamp(1, dims.max(1)))
        .map(|(_, vector)| &whitening * vector)
        .collect();
    columns_to_matrix(dims, &directions)
}

fn descending_eigenpairs(matrix: DMatrix<f64>) -> Vec<(f64, DVector<f64>)> {
    if matrix.is_empty() {
        return Vec::new();
    }
    let eigen = SymmetricEigen::new(matrix);
    let mut pairs: Vec<(f64, DVector<f64>)> = eigen
        .eigenvalues
        .iter()
        .copied()
        .zip(eigen.eigenvectors.column_iter().map(|c| c.into_owned()))
        .collect();
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
    pairs
}

/// Training faces projected onto a learned linear basis.
///
/// Prediction projects the query the same way and returns the label of
/// the closest training projection by Euclidean distance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubspaceProjection {
    size: (u32, u32),
    mean: DVector<f64>,
    basis: DMatrix<f64>,
    projections: Vec<DVector<f64>>,
    labels: Vec<i32>,
}

impl SubspaceProjection {
    /// Projects every column of `data` onto `basis`.
    pub fn fit(
        size: (u32, u32),
        data: &DMatrix<f64>,
        labels: &[i32],
        mean: DVector<f64>,
        basis: DMatrix<f64>,
    ) -> Self {
        let projections = data
            .column_iter()
            .map(|column| basis.tr_mul(&(column - &mean)))
            .collect();
        Self {
            size,
            mean,
            basis,
            projections,
            labels: labels.to_vec(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.basis.ncols()
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn project(&self, face: &GrayImage) -> Result<DVector<f64>, RecognitionError> {
        check_face_size(self.size, face)?;
        Ok(self.basis.tr_mul(&(to_vector(face) - &self.mean)))
    }

    pub fn predict(&self, face: &GrayImage) -> Result<Prediction, RecognitionError> {
        let query = self.project(face)?;
        self.projections
            .iter()
            .zip(&self.labels)
            .map(|(p, &label_id)| Prediction {
                label_id,
                score: (p - &query).norm(),
            })
            .fold(None, |best: Option<Prediction>, candidate| match best {
                Some(b) if b.score <= candidate.score => Some(b),
                _ => Some(candidate),
            })
            .ok_or(RecognitionError::ModelNotTrained)
    }
}
