use image::{imageops, GrayImage};

use crate::normalization::face_normalizer::FaceNormalizer;
use crate::normalization::grayscale::to_grayscale;
use crate::shared::constants::FACE_CROP_MARGIN;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::face_detector::FaceDetector;

/// One detected face: where it is, and the grayscale pixels inside the
/// trimmed box.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub region: Region,
    pub face: GrayImage,
}

/// Crops `region` out of `image` after trimming the horizontal margin.
///
/// Returns `None` when nothing of the trimmed box lies inside the image.
pub fn crop_face(image: &GrayImage, region: &Region) -> Option<GrayImage> {
    let crop = region
        .trim_horizontal(FACE_CROP_MARGIN)
        .clamp(image.width(), image.height());
    if crop.is_empty() {
        return None;
    }
    Some(
        imageops::crop_imm(
            image,
            crop.x as u32,
            crop.y as u32,
            crop.width as u32,
            crop.height as u32,
        )
        .to_image(),
    )
}

/// Detection plus normalization: turns a frame into canonical face crops.
///
/// Boxes are reported in frame coordinates so callers can annotate the
/// original color frame.
pub struct FaceExtractor {
    detector: Box<dyn FaceDetector>,
    normalizer: FaceNormalizer,
}

impl FaceExtractor {
    pub fn new(detector: Box<dyn FaceDetector>, normalizer: FaceNormalizer) -> Self {
        Self {
            detector,
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &FaceNormalizer {
        &self.normalizer
    }

    /// Detects every face in the frame and returns the raw grayscale crops.
    pub fn detect_faces(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        let gray = to_grayscale(frame);
        let regions = self.detector.detect(&gray)?;
        Ok(regions
            .into_iter()
            .filter_map(|region| {
                crop_face(&gray, &region).map(|face| DetectionResult { region, face })
            })
            .collect())
    }

    /// Like [`detect_faces`](Self::detect_faces) but with each crop
    /// normalized to the canonical size.
    pub fn extract(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        let mut results = self.detect_faces(frame)?;
        for result in &mut results {
            result.face = self.normalizer.normalize(&result.face);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use image::Luma;

    struct StubDetector {
        regions: Vec<Region>,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            _image: &GrayImage,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(self.regions.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(
            &mut self,
            _image: &GrayImage,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Err("detector error".into())
        }
    }

    fn extractor(regions: Vec<Region>) -> FaceExtractor {
        FaceExtractor::new(
            Box::new(StubDetector { regions }),
            FaceNormalizer::default(),
        )
    }

    fn frame(width: u32, height: u32) -> Frame {
        Frame::new(
            vec![90; (width * height * 3) as usize],
            width,
            height,
            PixelFormat::Rgb24,
            0,
        )
    }

    #[test]
    fn test_crop_face_trims_ten_percent_each_side() {
        let image = GrayImage::from_fn(200, 200, |x, _| Luma([x as u8]));
        let crop = crop_face(&image, &Region::new(50, 20, 100, 120)).unwrap();
        assert_eq!(crop.dimensions(), (80, 120));
        // First column of the crop is source column 60.
        assert_eq!(crop.get_pixel(0, 0).0[0], 60);
    }

    #[test]
    fn test_crop_face_clamps_to_image() {
        let image = GrayImage::new(100, 100);
        let crop = crop_face(&image, &Region::new(80, 80, 50, 50)).unwrap();
        assert_eq!(crop.dimensions(), (15, 20));
    }

    #[test]
    fn test_crop_face_outside_image_is_none() {
        let image = GrayImage::new(100, 100);
        assert!(crop_face(&image, &Region::new(150, 150, 30, 30)).is_none());
    }

    #[test]
    fn test_no_faces_is_empty_not_error() {
        let mut ex = extractor(vec![]);
        assert!(ex.extract(&frame(64, 64)).unwrap().is_empty());
    }

    #[test]
    fn test_reports_every_face() {
        let regions = vec![Region::new(0, 0, 40, 40), Region::new(100, 20, 50, 60)];
        let mut ex = extractor(regions.clone());
        let results = ex.extract(&frame(200, 120)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].region, regions[0]);
        assert_eq!(results[1].region, regions[1]);
        assert!(results.iter().all(|r| r.face.dimensions() == (100, 100)));
    }

    #[test]
    fn test_detect_faces_keeps_raw_crop_size() {
        let mut ex = extractor(vec![Region::new(10, 10, 50, 30)]);
        let results = ex.detect_faces(&frame(100, 100)).unwrap();
        assert_eq!(results[0].face.dimensions(), (40, 30));
    }

    #[test]
    fn test_skips_boxes_outside_frame() {
        let mut ex = extractor(vec![Region::new(500, 500, 40, 40)]);
        assert!(ex.extract(&frame(100, 100)).unwrap().is_empty());
    }

    #[test]
    fn test_detector_error_propagates() {
        let mut ex = FaceExtractor::new(Box::new(FailingDetector), FaceNormalizer::default());
        assert!(ex.extract(&frame(32, 32)).is_err());
    }
}
