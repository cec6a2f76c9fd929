use image::GrayImage;

use crate::shared::constants::CANONICAL_FACE_SIZE;
use crate::shared::frame::Frame;

use super::equalization::equalize_histogram;
use super::grayscale::to_grayscale;
use super::resampling::resize;

/// Produces the canonical representation every recognizer consumes:
/// grayscale, histogram-equalized, `size` x `size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceNormalizer {
    size: u32,
}

impl FaceNormalizer {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Equalizes then resizes a grayscale crop.
    pub fn normalize(&self, face: &GrayImage) -> GrayImage {
        resize(&equalize_histogram(face), self.size, self.size)
    }

    /// Converts a frame of any pixel format, then normalizes it.
    pub fn normalize_frame(&self, frame: &Frame) -> GrayImage {
        self.normalize(&to_grayscale(frame))
    }

    pub fn is_canonical_size(&self, image: &GrayImage) -> bool {
        image.dimensions() == (self.size, self.size)
    }
}

impl Default for FaceNormalizer {
    fn default() -> Self {
        Self::new(CANONICAL_FACE_SIZE)
    }
}
