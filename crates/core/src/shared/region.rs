/// Axis-aligned face bounding box in pixel coordinates.
///
/// Coordinates may fall partly outside the image; use [`Region::clamp`]
/// before indexing pixel data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    pub fn iou(&self, other: &Region) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let area_a = self.area() as f64;
        let area_b = other.area() as f64;
        inter / (area_a + area_b - inter)
    }

    /// Removes `fraction * width` from both the left and the right edge.
    ///
    /// The margin is truncated to whole pixels, so boxes narrower than
    /// `1 / fraction` pixels are left unchanged.
    pub fn trim_horizontal(&self, fraction: f64) -> Region {
        let margin = (fraction * self.width as f64) as i32;
        Region {
            x: self.x + margin,
            y: self.y,
            width: self.width - 2 * margin,
            height: self.height,
        }
    }

    /// Intersects the region with a `width` x `height` image.
    pub fn clamp(&self, width: u32, height: u32) -> Region {
        let x1 = self.x.clamp(0, width as i32);
        let y1 = self.y.clamp(0, height as i32);
        let x2 = (self.x + self.width).clamp(0, width as i32);
        let y2 = (self.y + self.height).clamp(0, height as i32);
        Region {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0),
            height: (y2 - y1).max(0),
        }
    }
}
