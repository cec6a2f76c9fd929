use image::GrayImage;

/// Spreads intensities over the full 0..=255 range using the cumulative
/// histogram.
///
/// The darkest occupied level maps to 0. Every brighter level maps to at
/// least 1, so no level ever collapses onto black; with that rule a second
/// pass reproduces the same lookup table and the transform is idempotent.
/// Constant images have no range to spread and are returned unchanged.
pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let mut hist = [0u64; 256];
    for pixel in image.pixels() {
        hist[pixel.0[0] as usize] += 1;
    }

    let total: u64 = hist.iter().sum();
    let Some(first) = hist.iter().position(|&count| count > 0) else {
        return image.clone();
    };
    if hist[first] == total {
        return image.clone();
    }

    let base = hist[first];
    let scale = 255.0 / (total - base) as f64;
    let mut lut = [0u8; 256];
    let mut cumulative = base;
    for level in (first + 1)..256 {
        cumulative += hist[level];
        let mapped = ((cumulative - base) as f64 * scale).round();
        lut[level] = mapped.clamp(1.0, 255.0) as u8;
    }

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}
