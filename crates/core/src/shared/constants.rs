pub const SEETA_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const SEETA_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";

/// Side length of the square grayscale image every face is normalized to.
pub const CANONICAL_FACE_SIZE: u32 = 100;

/// Fraction of the box width trimmed from each side before cropping.
///
/// Cascade detectors return loose boxes that include background at the
/// temples; 10% per side keeps the face and drops most of it.
pub const FACE_CROP_MARGIN: f64 = 0.1;

/// Label reported when a prediction fails the threshold or the id is unknown.
pub const UNKNOWN_LABEL: &str = "Unknown";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const MODEL_RECORD_EXTENSION: &str = "json";
pub const MODEL_PARAMS_EXTENSION: &str = "bin";
