use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::recognition::domain::algorithm_kind::AlgorithmKind;
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sample::{Prediction, Sample};

use super::features::{check_face_size, check_samples};
use super::params_codec;

/// Cells per side of the spatial histogram grid.
pub const LBPH_GRID: u32 = 8;
const BINS: usize = 256;

/// Clockwise from the top-left neighbour; the first one is the high bit.
const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LbphState {
    size: (u32, u32),
    histograms: Vec<Vec<f32>>,
    labels: Vec<i32>,
}

/// Local binary pattern histograms (radius 1, 8 neighbours, 8x8 grid),
/// compared with the chi-square distance.
#[derive(Default)]
pub struct LbphRecognizer {
    state: Option<LbphState>,
}

impl LbphRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(blob: &[u8]) -> Result<Self, RecognitionError> {
        let state: LbphState = params_codec::decode(AlgorithmKind::Lbph, blob)?;
        Ok(Self { state: Some(state) })
    }
}

impl FaceRecognizer for LbphRecognizer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Lbph
    }

    fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    fn train(&mut self, samples: &[Sample]) -> Result<(), RecognitionError> {
        let size = check_samples(samples)?;
        let min_side = LBPH_GRID + 2;
        if size.0 < min_side || size.1 < min_side {
            return Err(RecognitionError::InsufficientTrainingData(format!(
                "LBPH needs faces of at least {min_side}x{min_side}, got {}x{}",
                size.0, size.1
            )));
        }

        self.state = Some(LbphState {
            size,
            histograms: samples
                .iter()
                .map(|s| spatial_histogram(&s.feature))
                .collect(),
            labels: samples.iter().map(|s| s.label_id).collect(),
        });
        log::debug!("LBPH: {} samples", samples.len());
        Ok(())
    }

    fn predict(&self, face: &GrayImage) -> Result<Prediction, RecognitionError> {
        let state = self.state.as_ref().ok_or(RecognitionError::ModelNotTrained)?;
        check_face_size(state.size, face)?;
        let query = spatial_histogram(face);

        let mut best: Option<Prediction> = None;
        for (histogram, &label_id) in state.histograms.iter().zip(&state.labels) {
            let score = chi_square(histogram, &query);
            if best.map_or(true, |b| score < b.score) {
                best = Some(Prediction { label_id, score });
            }
        }
        best.ok_or(RecognitionError::ModelNotTrained)
    }

    fn label_ids(&self) -> Vec<i32> {
        self.state
            .as_ref()
            .map(|s| s.labels.clone())
            .unwrap_or_default()
    }

    fn export_params(&self) -> Result<Vec<u8>, RecognitionError> {
        let state = self.state.as_ref().ok_or(RecognitionError::ModelNotTrained)?;
        params_codec::encode(AlgorithmKind::Lbph, state)
    }
}

/// LBP code of every interior pixel; the result is `(w - 2) x (h - 2)`.
fn lbp_codes(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width - 2, height - 2, |x, y| {
        let (cx, cy) = (x + 1, y + 1);
        let center = image.get_pixel(cx, cy)[0];
        let mut code = 0u8;
        for (bit, (dx, dy)) in NEIGHBOURS.iter().enumerate() {
            let neighbour = image.get_pixel((cx as i32 + dx) as u32, (cy as i32 + dy) as u32)[0];
            if neighbour >= center {
                code |= 1 << (7 - bit);
            }
        }
        image::Luma([code])
    })
}

/// Concatenated per-cell code histograms, each normalized to sum to 1.
///
/// Cells are `floor(w / grid)` wide; leftover columns and rows on the
/// right and bottom edges are ignored.
fn spatial_histogram(image: &GrayImage) -> Vec<f32> {
    let codes = lbp_codes(image);
    let cell_w = codes.width() / LBPH_GRID;
    let cell_h = codes.height() / LBPH_GRID;
    let cell_area = (cell_w * cell_h) as f32;

    let mut histogram = vec![0f32; (LBPH_GRID * LBPH_GRID) as usize * BINS];
    for gy in 0..LBPH_GRID {
        for gx in 0..LBPH_GRID {
            let cell = &mut histogram[((gy * LBPH_GRID + gx) as usize) * BINS..][..BINS];
            for y in gy * cell_h..(gy + 1) * cell_h {
                for x in gx * cell_w..(gx + 1) * cell_w {
                    cell[codes.get_pixel(x, y)[0] as usize] += 1.0;
                }
            }
            for bin in cell.iter_mut() {
                *bin /= cell_area;
            }
        }
    }
    histogram
}

/// Symmetric chi-square distance: `sum 2 (a - b)^2 / (a + b)`.
fn chi_square(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .filter(|&(&x, &y)| x + y > f32::EPSILON)
        .map(|(&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            2.0 * (x - y).powi(2) / (x + y)
        })
        .sum()
}
