use std::path::Path;

use image::GrayImage;
use thiserror::Error;

use crate::detection::domain::detection_params::{DetectionParams, DetectionParamsError};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::region_grouper::RegionGrouper;
use crate::shared::region::Region;

#[derive(Error, Debug)]
pub enum RustfaceDetectorError {
    #[error("invalid detection parameters: {0}")]
    Params(#[from] DetectionParamsError),
    #[error("failed to load detector model {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Frontal face detector backed by the SeetaFace funnel cascade
/// (`rustface` crate), scanning an image pyramid.
///
/// Candidate windows are clustered by [`RegionGrouper`] so the
/// `min_neighbors` setting applies uniformly on top of the cascade.
pub struct RustfaceDetector {
    inner: Box<dyn rustface::Detector>,
    grouper: RegionGrouper,
}

// Safety: RustfaceDetector is only used from a single thread at a time.
// The boxed detector owns all of its state and is never shared.
unsafe impl Send for RustfaceDetector {}

impl RustfaceDetector {
    pub fn new(model_path: &Path, params: &DetectionParams) -> Result<Self, RustfaceDetectorError> {
        params.validate()?;

        let path = model_path.to_string_lossy().into_owned();
        let mut inner = rustface::create_detector(&path)
            .map_err(|source| RustfaceDetectorError::Load { path, source })?;

        inner.set_min_face_size(params.min_face_size);
        inner.set_score_thresh(params.score_threshold);
        // rustface expects the shrink ratio between levels, not the step.
        inner.set_pyramid_scale_factor(1.0 / params.scale_factor);
        inner.set_slide_window_step(params.window_step, params.window_step);

        log::info!(
            "Loaded face detector from {} (min_face_size={}, scale_factor={}, min_neighbors={})",
            model_path.display(),
            params.min_face_size,
            params.scale_factor,
            params.min_neighbors
        );

        Ok(Self {
            inner,
            grouper: RegionGrouper::new(params.min_neighbors),
        })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let data = rustface::ImageData::new(image.as_raw(), width, height);
        let candidates: Vec<Region> = self
            .inner
            .detect(&data)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Region::new(bbox.x(), bbox.y(), bbox.width() as i32, bbox.height() as i32)
            })
            .collect();

        let faces = self.grouper.group(&candidates);
        log::debug!(
            "Detected {} faces from {} candidates",
            faces.len(),
            candidates.len()
        );
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_params_rejected_before_loading() {
        let params = DetectionParams {
            scale_factor: 0.9,
            ..Default::default()
        };
        let result = RustfaceDetector::new(Path::new("/nonexistent/model.bin"), &params);
        assert!(matches!(result, Err(RustfaceDetectorError::Params(_))));
    }

    #[test]
    fn test_missing_model_is_load_error() {
        let result = RustfaceDetector::new(
            Path::new("/nonexistent/seeta.bin"),
            &DetectionParams::default(),
        );
        match result {
            Err(RustfaceDetectorError::Load { path, .. }) => {
                assert!(path.contains("seeta.bin"))
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected load error"),
        }
    }
}
