use image::{ImageBuffer, Luma, Pixel, Rgb};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::frame_annotator::{Annotation, FrameAnnotator};
use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::region::Region;

use super::glyphs;

const DEFAULT_BOX_COLOR: [u8; 3] = [0, 255, 0];
const DEFAULT_TEXT_COLOR: [u8; 3] = [0, 0, 0];
const DEFAULT_THICKNESS: u32 = 2;
const DEFAULT_TEXT_SCALE: u32 = 2;

/// Draws a hollow rectangle around each face and its label on a filled
/// strip just above the box.
///
/// When there is no room above (the face touches the top edge) the strip
/// is drawn inside the box instead. Colors are given in RGB and converted
/// to the frame's layout; grayscale frames get the brightest channel.
pub struct BoxLabelAnnotator {
    box_color: [u8; 3],
    text_color: [u8; 3],
    thickness: u32,
    scale: u32,
}

impl BoxLabelAnnotator {
    pub fn new(box_color: [u8; 3], text_color: [u8; 3]) -> Self {
        Self {
            box_color,
            text_color,
            thickness: DEFAULT_THICKNESS,
            scale: DEFAULT_TEXT_SCALE,
        }
    }

    /// Line thickness and glyph scale, both in pixels (minimum 1).
    pub fn with_style(mut self, thickness: u32, scale: u32) -> Self {
        self.thickness = thickness.max(1);
        self.scale = scale.max(1);
        self
    }
}

impl Default for BoxLabelAnnotator {
    fn default() -> Self {
        Self::new(DEFAULT_BOX_COLOR, DEFAULT_TEXT_COLOR)
    }
}

impl FrameAnnotator for BoxLabelAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        annotations: &[Annotation],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if annotations.is_empty() {
            return Ok(());
        }

        let (width, height, format) = (frame.width(), frame.height(), frame.format());
        match format {
            PixelFormat::Gray8 => {
                let mut canvas = ImageBuffer::<Luma<u8>, _>::from_raw(width, height, frame.data_mut())
                    .ok_or("frame buffer does not match its dimensions")?;
                let box_color = Luma([brightest(self.box_color)]);
                let text_color = Luma([brightest(self.text_color)]);
                for a in annotations {
                    self.draw(&mut canvas, a, box_color, text_color);
                }
            }
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => {
                let mut canvas = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, frame.data_mut())
                    .ok_or("frame buffer does not match its dimensions")?;
                let order = |[r, g, b]: [u8; 3]| {
                    if format == PixelFormat::Bgr24 {
                        Rgb([b, g, r])
                    } else {
                        Rgb([r, g, b])
                    }
                };
                let box_color = order(self.box_color);
                let text_color = order(self.text_color);
                for a in annotations {
                    self.draw(&mut canvas, a, box_color, text_color);
                }
            }
        }

        Ok(())
    }
}

impl BoxLabelAnnotator {
    fn draw<P>(
        &self,
        canvas: &mut ImageBuffer<P, &mut [u8]>,
        annotation: &Annotation,
        box_color: P,
        text_color: P,
    ) where
        P: Pixel<Subpixel = u8>,
    {
        let (w, h) = canvas.dimensions();
        let region = annotation.region.clamp(w, h);
        if region.is_empty() {
            return;
        }

        for inset in 0..self.thickness as i32 {
            let r = Region::new(
                region.x + inset,
                region.y + inset,
                region.width - 2 * inset,
                region.height - 2 * inset,
            );
            if r.is_empty() {
                break;
            }
            draw_hollow_rect_mut(canvas, to_rect(&r), box_color);
        }

        if annotation.label.is_empty() {
            return;
        }

        let pad = self.scale as i32;
        let strip_w = glyphs::text_width(&annotation.label, self.scale) as i32 + 2 * pad;
        let strip_h = glyphs::text_height(self.scale) as i32 + 2 * pad;
        let strip_y = if region.y >= strip_h {
            region.y - strip_h
        } else {
            region.y
        };
        let strip = Region::new(region.x, strip_y, strip_w, strip_h);
        draw_filled_rect_mut(canvas, to_rect(&strip), box_color);

        let mut cursor_x = strip.x + pad;
        let cursor_y = strip.y + pad;
        let advance = ((glyphs::GLYPH_WIDTH + glyphs::GLYPH_SPACING) * self.scale) as i32;
        for ch in annotation.label.chars() {
            self.draw_glyph(canvas, cursor_x, cursor_y, ch, text_color);
            cursor_x += advance;
            if cursor_x >= w as i32 {
                break;
            }
        }
    }

    fn draw_glyph<P>(
        &self,
        canvas: &mut ImageBuffer<P, &mut [u8]>,
        x: i32,
        y: i32,
        ch: char,
        color: P,
    ) where
        P: Pixel<Subpixel = u8>,
    {
        let glyph = glyphs::glyph(ch);
        let s = self.scale as i32;
        for row in 0..glyphs::GLYPH_HEIGHT {
            for col in 0..glyphs::GLYPH_WIDTH {
                if glyphs::is_set(&glyph, col, row) {
                    let px = Rect::at(x + col as i32 * s, y + row as i32 * s).of_size(self.scale, self.scale);
                    draw_filled_rect_mut(canvas, px, color);
                }
            }
        }
    }
}

fn to_rect(r: &Region) -> Rect {
    Rect::at(r.x, r.y).of_size(r.width as u32, r.height as u32)
}

fn brightest(color: [u8; 3]) -> u8 {
    color.into_iter().max().unwrap_or(0)
}
