use std::path::Path;

use image::{GrayImage, RgbImage};

use crate::shared::frame::{Frame, PixelFormat};
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// Gray frames are saved single-channel; color frames as RGB.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (width, height) = (frame.width(), frame.height());
        match frame.format() {
            PixelFormat::Gray8 => GrayImage::from_raw(width, height, frame.data().to_vec())
                .ok_or("frame data does not match its dimensions")?
                .save(path)?,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => {
                RgbImage::from_raw(width, height, frame.to_rgb24().into_owned())
                    .ok_or("frame data does not match its dimensions")?
                    .save(path)?
            }
        }
        Ok(())
    }
}
