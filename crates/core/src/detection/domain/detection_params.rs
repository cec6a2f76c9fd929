use thiserror::Error;

/// Smallest face size the cascade can scan for.
pub const MIN_SUPPORTED_FACE_SIZE: u32 = 20;

#[derive(Error, Debug, PartialEq)]
pub enum DetectionParamsError {
    #[error("scale factor must be greater than 1.0, got {0}")]
    ScaleFactor(f32),
    #[error("minimum face size must be at least {MIN_SUPPORTED_FACE_SIZE}, got {0}")]
    MinFaceSize(u32),
    #[error("window step must be positive")]
    WindowStep,
}

/// Fixed detector configuration, set once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionParams {
    /// Candidate windows that must overlap a face before it is reported.
    pub min_neighbors: usize,
    /// Size ratio between consecutive pyramid levels.
    pub scale_factor: f32,
    pub min_face_size: u32,
    /// Cascade score a window must exceed to become a candidate.
    pub score_threshold: f64,
    pub window_step: u32,
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), DetectionParamsError> {
        if self.scale_factor.is_nan() || self.scale_factor <= 1.0 {
            return Err(DetectionParamsError::ScaleFactor(self.scale_factor));
        }
        if self.min_face_size < MIN_SUPPORTED_FACE_SIZE {
            return Err(DetectionParamsError::MinFaceSize(self.min_face_size));
        }
        if self.window_step == 0 {
            return Err(DetectionParamsError::WindowStep);
        }
        Ok(())
    }
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_neighbors: 1,
            scale_factor: 1.25,
            min_face_size: 20,
            score_threshold: 2.0,
            window_step: 4,
        }
    }
}
