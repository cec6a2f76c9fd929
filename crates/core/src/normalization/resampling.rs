use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};

/// Interpolation chosen by [`resize`] for a given size change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    /// Output already has the requested size.
    Identity,
    /// Coverage-weighted averaging; used when shrinking on both axes.
    Area,
    /// Catmull-Rom bicubic; used when either axis grows.
    Bicubic,
}

pub fn choose_interpolation(src: (u32, u32), dst: (u32, u32)) -> Interpolation {
    if src == dst {
        Interpolation::Identity
    } else if src.0 >= dst.0 && src.1 >= dst.1 {
        Interpolation::Area
    } else {
        Interpolation::Bicubic
    }
}

/// Deterministically resizes a grayscale image to `width` x `height`.
pub fn resize(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    if image.width() == 0 || image.height() == 0 {
        return GrayImage::new(width, height);
    }
    match choose_interpolation(image.dimensions(), (width, height)) {
        Interpolation::Identity => image.clone(),
        Interpolation::Area => resize_area(image, width, height),
        Interpolation::Bicubic => imageops::resize(image, width, height, FilterType::CatmullRom),
    }
}

/// Source pixels overlapping each destination pixel along one axis, with
/// the fraction of the destination pixel each one covers.
fn area_weights(src: u32, dst: u32) -> Vec<Vec<(usize, f64)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = start + scale;
            let mut weights = Vec::new();
            let mut s = start.floor() as usize;
            while (s as f64) < end && s < src as usize {
                let lo = start.max(s as f64);
                let hi = end.min(s as f64 + 1.0);
                if hi > lo {
                    weights.push((s, (hi - lo) / scale));
                }
                s += 1;
            }
            weights
        })
        .collect()
}

fn resize_area(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    let xw = area_weights(image.width(), width);
    let yw = area_weights(image.height(), height);

    GrayImage::from_fn(width, height, |x, y| {
        let mut acc = 0.0;
        for &(sy, wy) in &yw[y as usize] {
            for &(sx, wx) in &xw[x as usize] {
                acc += wy * wx * image.get_pixel(sx as u32, sy as u32).0[0] as f64;
            }
        }
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}
