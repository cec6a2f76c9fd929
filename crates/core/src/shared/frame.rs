use std::borrow::Cow;

use image::GrayImage;
use ndarray::{ArrayView3, ArrayViewMut3};

/// Layout of the bytes held by a [`Frame`].
///
/// Color frames must say which channel comes first: converting a BGR
/// buffer with RGB weights silently swaps red and blue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Gray8,
    Rgb24,
    Bgr24,
}

impl PixelFormat {
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
        }
    }

    pub fn is_color(self) -> bool {
        self != PixelFormat::Gray8
    }
}

/// A single video/image frame: contiguous bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the rest of the
/// crate reads the format tag instead of guessing channel order.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (format.channels() as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
        }
    }

    pub fn from_gray(image: GrayImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, PixelFormat::Gray8, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> u8 {
        self.format.channels()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Pixel bytes in RGB order, borrowed when the frame is already RGB.
    pub fn to_rgb24(&self) -> Cow<'_, [u8]> {
        match self.format {
            PixelFormat::Rgb24 => Cow::Borrowed(&self.data),
            PixelFormat::Bgr24 => Cow::Owned(
                self.data
                    .chunks_exact(3)
                    .flat_map(|px| [px[2], px[1], px[0]])
                    .collect(),
            ),
            PixelFormat::Gray8 => Cow::Owned(self.data.iter().flat_map(|&v| [v, v, v]).collect()),
        }
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels() as usize,
        )
    }
}
