use image::{GrayImage, Luma};

use crate::shared::frame::{Frame, PixelFormat};

// BT.601 luma weights in 14-bit fixed point (sum = 1 << 14).
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT + (1 << (SHIFT - 1));
    (y >> SHIFT) as u8
}

/// Converts any frame to an 8-bit grayscale image.
///
/// The channel order comes from the frame's [`PixelFormat`]; gray frames
/// are copied as-is.
pub fn to_grayscale(frame: &Frame) -> GrayImage {
    let pixels = frame.as_ndarray();
    let (r, b) = match frame.format() {
        PixelFormat::Gray8 => {
            return GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
                Luma([pixels[[y as usize, x as usize, 0]]])
            });
        }
        PixelFormat::Rgb24 => (0, 2),
        PixelFormat::Bgr24 => (2, 0),
    };

    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let (row, col) = (y as usize, x as usize);
        Luma([luma(
            pixels[[row, col, r]],
            pixels[[row, col, 1]],
            pixels[[row, col, b]],
        )])
    })
}
