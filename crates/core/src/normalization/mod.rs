//! Canonical face representation: grayscale conversion, histogram
//! equalization and fixed-size resampling.

pub mod equalization;
pub mod face_normalizer;
pub mod grayscale;
pub mod resampling;
