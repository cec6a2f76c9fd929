use std::path::Path;

use image::DynamicImage;

use crate::shared::frame::{Frame, PixelFormat};
use crate::video::domain::image_reader::ImageReader;

/// Decodes still images with the `image` crate.
///
/// 8-bit grayscale files keep a single channel so already normalized face
/// crops can be recognized as such; every other layout becomes RGB24.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let decoded = image::open(path)?;
        Ok(match decoded {
            DynamicImage::ImageLuma8(gray) => Frame::from_gray(gray, 0),
            other => {
                let rgb = other.into_rgb8();
                let (width, height) = rgb.dimensions();
                Frame::new(rgb.into_raw(), width, height, PixelFormat::Rgb24, 0)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_rgb(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("color.png");
        image::RgbImage::from_pixel(width, height, image::Rgb([50, 100, 200]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_color_image_is_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let frame = ImageFileReader::new().read(&write_rgb(dir.path(), 40, 30)).unwrap();
        assert_eq!((frame.width(), frame.height()), (40, 30));
        assert_eq!(frame.format(), PixelFormat::Rgb24);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_gray_image_stays_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        image::GrayImage::from_pixel(10, 10, image::Luma([77])).save(&path).unwrap();

        let frame = ImageFileReader::new().read(&path).unwrap();
        assert_eq!(frame.format(), PixelFormat::Gray8);
        assert!(frame.data().iter().all(|&v| v == 77));
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 0])).save(&path).unwrap();

        let frame = ImageFileReader::new().read(&path).unwrap();
        assert_eq!(frame.format(), PixelFormat::Rgb24);
        assert_eq!(frame.data().len(), 4 * 4 * 3);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(ImageFileReader::new().read(Path::new("/nonexistent/x.png")).is_err());
    }

    #[test]
    fn test_garbage_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(ImageFileReader::new().read(&path).is_err());
    }
}
