use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::detection::domain::face_extractor::FaceExtractor;
use crate::normalization::grayscale::to_grayscale;
use crate::recognition::domain::sample::LabeledFaces;
use crate::shared::frame::PixelFormat;
use crate::video::domain::image_reader::ImageReader;

use super::dataset_descriptor::LabeledDataset;
use super::dataset_error::DatasetError;

/// Turns image files into canonical face crops.
pub struct SampleLoader {
    reader: Box<dyn ImageReader>,
    extractor: FaceExtractor,
}

impl SampleLoader {
    pub fn new(reader: Box<dyn ImageReader>, extractor: FaceExtractor) -> Self {
        Self { reader, extractor }
    }

    /// The first face found in `path`, normalized.
    ///
    /// Grayscale images already at the canonical size are taken to be
    /// crops and only normalized, which leaves stored crops unchanged.
    /// Returns `None` when the detector finds no face.
    pub fn load_face(&mut self, path: &Path) -> Result<Option<GrayImage>, DatasetError> {
        let frame = self.reader.read(path).map_err(|e| DatasetError::Image {
            path: path.to_path_buf(),
            source: e,
        })?;

        if frame.format() == PixelFormat::Gray8 {
            let gray = to_grayscale(&frame);
            let normalizer = self.extractor.normalizer();
            if normalizer.is_canonical_size(&gray) {
                return Ok(Some(normalizer.normalize(&gray)));
            }
        }

        let faces = self
            .extractor
            .extract(&frame)
            .map_err(|e| DatasetError::Detection {
                path: path.to_path_buf(),
                source: e,
            })?;
        if faces.len() > 1 {
            log::debug!(
                "{}: {} faces found, keeping the first",
                path.display(),
                faces.len()
            );
        }
        Ok(faces.into_iter().next().map(|result| result.face))
    }

    /// Faces of every image that contains one; the others are skipped.
    pub fn load_faces(&mut self, images: &[PathBuf]) -> Result<Vec<GrayImage>, DatasetError> {
        let mut faces = Vec::with_capacity(images.len());
        for path in images {
            match self.load_face(path)? {
                Some(face) => faces.push(face),
                None => log::warn!("No face found in {}, skipping", path.display()),
            }
        }
        Ok(faces)
    }

    pub fn load_datasets(
        &mut self,
        datasets: &[LabeledDataset],
    ) -> Result<Vec<LabeledFaces>, DatasetError> {
        datasets
            .iter()
            .map(|dataset| {
                let faces = self.load_faces(&dataset.images)?;
                log::info!(
                    "Dataset '{}': {} faces from {} images",
                    dataset.label,
                    faces.len(),
                    dataset.images.len()
                );
                Ok(LabeledFaces::new(dataset.label.clone(), faces))
            })
            .collect()
    }
}
