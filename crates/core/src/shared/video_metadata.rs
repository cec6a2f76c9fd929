use std::fmt;
use std::path::PathBuf;

/// Largest timebase denominator the MPEG-4 part 2 encoder accepts.
const MAX_TIMEBASE_DENOMINATOR: i32 = 65_535;

const FALLBACK_FRAME_RATE: FrameRate = FrameRate { num: 30, den: 1 };

/// Exact frame rate as a reduced fraction, e.g. 30000/1001 for NTSC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRate {
    num: i32,
    den: i32,
}

impl FrameRate {
    /// Reduces `num/den`; a zero or negative term yields an unknown (0/1)
    /// rate.
    pub fn new(num: i32, den: i32) -> Self {
        if num <= 0 || den <= 0 {
            return Self { num: 0, den: 1 };
        }
        let g = gcd(num, den);
        Self {
            num: num / g,
            den: den / g,
        }
    }

    pub fn num(&self) -> i32 {
        self.num
    }

    pub fn den(&self) -> i32 {
        self.den
    }

    pub fn is_known(&self) -> bool {
        self.num > 0
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{} ({:.3})", self.num, self.den, self.as_f64())
        }
    }
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Stream properties queried when a source is opened.
///
/// The writer reuses width, height and frame rate so the output lines up
/// frame for frame with the source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn fps(&self) -> f64 {
        self.frame_rate.as_f64()
    }

    /// Frame rate to encode with.
    ///
    /// The source rate is kept exactly when the encoder can represent it.
    /// Rates it cannot represent are rounded to whole frames per second,
    /// and sources that report none fall back to 30.
    pub fn output_frame_rate(&self) -> FrameRate {
        let rate = self.frame_rate;
        if !rate.is_known() {
            return FALLBACK_FRAME_RATE;
        }
        if rate.num <= MAX_TIMEBASE_DENOMINATOR {
            return rate;
        }
        let rounded = rate.as_f64().round() as i32;
        log::warn!("Frame rate {rate} cannot be encoded exactly, using {rounded}");
        if rounded > 0 {
            FrameRate::new(rounded, 1)
        } else {
            FALLBACK_FRAME_RATE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(frame_rate: FrameRate) -> VideoMetadata {
        VideoMetadata {
            width: 640,
            height: 480,
            frame_rate,
            total_frames: 100,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_clone_is_equal() {
        let m = meta(FrameRate::new(24, 1));
        assert_eq!(m.clone(), m);
    }

    #[test]
    fn test_frame_rate_is_reduced() {
        let rate = FrameRate::new(60000, 2002);
        assert_eq!((rate.num(), rate.den()), (30000, 1001));
    }

    #[test]
    fn test_ntsc_rate_is_kept_exactly() {
        let m = meta(FrameRate::new(30000, 1001));
        assert_eq!(m.output_frame_rate(), FrameRate::new(30000, 1001));
        assert!((m.fps() - 29.97).abs() < 0.001);
    }

    #[test]
    fn test_unrepresentable_rate_is_rounded() {
        let m = meta(FrameRate::new(100_003, 4000));
        assert_eq!(m.output_frame_rate(), FrameRate::new(25, 1));
    }

    #[test]
    fn test_unknown_rate_falls_back_to_30() {
        assert!(!FrameRate::new(0, 1).is_known());
        assert!(!FrameRate::new(25, 0).is_known());
        assert_eq!(meta(FrameRate::new(0, 0)).output_frame_rate(), FrameRate::new(30, 1));
    }

    #[test]
    fn test_display_shows_fraction() {
        assert_eq!(FrameRate::new(25, 1).to_string(), "25");
        assert_eq!(FrameRate::new(30000, 1001).to_string(), "30000/1001 (29.970)");
    }
}
