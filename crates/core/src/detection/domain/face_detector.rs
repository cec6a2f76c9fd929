use image::GrayImage;

use crate::shared::region::Region;

/// Domain interface for face detection on a grayscale working copy.
///
/// Implementations report every face they find, in no particular order;
/// an empty vector means no faces and is not an error. `&mut self` lets
/// backends reuse scratch buffers between calls.
pub trait FaceDetector: Send {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
