use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes a still image into a frame.
///
/// Grayscale sources come back as `Gray8`, everything else as `Rgb24`.
pub trait ImageReader: Send {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
