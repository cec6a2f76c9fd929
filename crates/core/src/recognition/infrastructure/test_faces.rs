use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::recognition::domain::sample::Sample;

/// A striped test "face" whose stripe orientation identifies the person.
///
/// Each `variant` adds different pixel noise on top of the same pattern.
pub fn striped_face(person: u32, variant: u64, size: u32) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(u64::from(person) * 10_000 + variant);
    GrayImage::from_fn(size, size, |x, y| {
        let phase = match person % 3 {
            0 => x / 3,
            1 => y / 3,
            _ => (x + y) / 3,
        };
        let base: i32 = if phase % 2 == 0 { 60 } else { 190 };
        let noise: i32 = rng.gen_range(-10..=10);
        Luma([(base + noise).clamp(0, 255) as u8])
    })
}

/// `per_person` samples for each of `people` people, labelled `0..people`.
pub fn striped_samples(people: u32, per_person: u64, size: u32) -> Vec<Sample> {
    (0..people)
        .flat_map(|person| {
            (0..per_person).map(move |v| Sample::new(striped_face(person, v, size), person as i32))
        })
        .collect()
}
