use std::path::Path;
use std::time::Instant;

use crate::annotation::domain::frame_annotator::{Annotation, FrameAnnotator};
use crate::detection::domain::face_extractor::FaceExtractor;
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::recognizer_model::RecognizerModel;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::PipelineLogger;

/// Totals for one annotation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub frames_written: usize,
    pub faces_detected: usize,
    /// Faces that passed the threshold and resolved to a name.
    pub faces_identified: usize,
}

/// Closes the source and sink when dropped, whatever path left the loop.
struct OpenStreams<'a> {
    reader: &'a mut dyn VideoReader,
    writer: &'a mut dyn VideoWriter,
    closed: bool,
}

impl OpenStreams<'_> {
    /// Closes both streams, reporting a failure to finalize the output.
    fn finish(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.closed = true;
        self.reader.close();
        self.writer.close()
    }
}

impl Drop for OpenStreams<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.reader.close();
        if let Err(e) = self.writer.close() {
            log::warn!("Failed to close output after an error: {e}");
        }
    }
}

/// Video annotation: read → detect → identify → annotate → write, one
/// frame at a time.
///
/// Every source frame is written, including frames without faces, so the
/// output lines up frame for frame with the input.
pub struct AnnotateVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    extractor: FaceExtractor,
    model: RecognizerModel,
    annotator: Box<dyn FrameAnnotator>,
    logger: Box<dyn PipelineLogger>,
    threshold: f64,
}

impl AnnotateVideoUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        extractor: FaceExtractor,
        model: RecognizerModel,
        annotator: Box<dyn FrameAnnotator>,
        logger: Box<dyn PipelineLogger>,
        threshold: f64,
    ) -> Self {
        Self {
            reader,
            writer,
            extractor,
            model,
            annotator,
            logger,
            threshold,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<AnnotationSummary, Box<dyn std::error::Error>> {
        if !self.model.is_trained() {
            return Err(RecognitionError::ModelNotTrained.into());
        }

        let metadata = self.reader.open(input_path)?;
        let mut streams = OpenStreams {
            reader: self.reader.as_mut(),
            writer: self.writer.as_mut(),
            closed: false,
        };
        streams.writer.open(output_path, &metadata)?;
        self.logger.info(&format!(
            "Annotating {}x{} @ {} fps ({} frames) with a {} model",
            metadata.width,
            metadata.height,
            metadata.frame_rate,
            metadata.total_frames,
            self.model.kind()
        ));

        let mut summary = AnnotationSummary::default();
        for frame in streams.reader.frames() {
            let mut frame = frame?;

            let started = Instant::now();
            let detections = self.extractor.extract(&frame)?;
            self.logger.timing("detect", elapsed_ms(started));

            let started = Instant::now();
            let mut annotations = Vec::with_capacity(detections.len());
            for detection in detections {
                let identification = self.model.predict(&detection.face, self.threshold)?;
                log::debug!(
                    "Frame {}: {} (score {:.2})",
                    frame.index(),
                    identification.label,
                    identification.score
                );
                if !identification.is_unknown() {
                    summary.faces_identified += 1;
                }
                annotations.push(Annotation::new(detection.region, identification.label));
            }
            self.logger.timing("identify", elapsed_ms(started));

            let started = Instant::now();
            self.annotator.annotate(&mut frame, &annotations)?;
            streams.writer.write(&frame)?;
            self.logger.timing("write", elapsed_ms(started));

            summary.faces_detected += annotations.len();
            summary.frames_written += 1;
            self.logger.progress(summary.frames_written, metadata.total_frames);
        }

        streams.finish()?;
        self.logger.count("faces detected", summary.faces_detected);
        self.logger.count("faces identified", summary.faces_identified);
        self.logger.summary();
        Ok(summary)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::infrastructure::box_label_annotator::BoxLabelAnnotator;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::normalization::face_normalizer::FaceNormalizer;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::recognition::domain::algorithm_kind::AlgorithmKind;
    use crate::recognition::domain::sample::LabeledFaces;
    use crate::recognition::infrastructure::test_faces::striped_face;
    use crate::shared::frame::{Frame, PixelFormat};
    use crate::shared::region::Region;
    use crate::shared::video_metadata::{FrameRate, VideoMetadata};
    use image::GrayImage;
    use std::sync::{Arc, Mutex};

    const FACE_SIZE: u32 = 24;

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        fail_at: Option<usize>,
        frame_rate: FrameRate,
        opened: Arc<Mutex<bool>>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(frames: Vec<Frame>) -> Self {
            Self {
                frames,
                fail_at: None,
                frame_rate: FrameRate::new(25, 1),
                opened: Arc::new(Mutex::new(false)),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            *self.opened.lock().unwrap() = true;
            Ok(VideoMetadata {
                frame_rate: self.frame_rate,
                ..metadata(self.frames.len())
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let fail_at = self.fail_at;
            Box::new(self.frames.drain(..).map(move |f| {
                if Some(f.index()) == fail_at {
                    Err("corrupt packet".into())
                } else {
                    Ok(f)
                }
            }))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<Frame>>>,
        closed: Arc<Mutex<bool>>,
        opened_with: Arc<Mutex<Option<VideoMetadata>>>,
        fail_open: bool,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
                opened_with: Arc::new(Mutex::new(None)),
                fail_open: false,
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("cannot create output".into());
            }
            *self.opened_with.lock().unwrap() = Some(metadata.clone());
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    /// Reports one face covering the middle of any frame that is not black.
    struct BrightFrameDetector;

    impl FaceDetector for BrightFrameDetector {
        fn detect(&mut self, image: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            if image.get_pixel(0, 0)[0] == 0 {
                return Ok(vec![]);
            }
            Ok(vec![Region::new(8, 8, 48, 48)])
        }
    }

    #[allow(clippy::type_complexity)]
    struct RecordingAnnotator {
        calls: Arc<Mutex<Vec<(usize, Vec<Annotation>)>>>,
    }

    impl FrameAnnotator for RecordingAnnotator {
        fn annotate(
            &self,
            frame: &mut Frame,
            annotations: &[Annotation],
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls
                .lock()
                .unwrap()
                .push((frame.index(), annotations.to_vec()));
            Ok(())
        }
    }

    // --- Helpers ---

    fn metadata(total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width: 64,
            height: 64,
            frame_rate: FrameRate::new(25, 1),
            total_frames,
            codec: String::new(),
            source_path: None,
        }
    }

    /// Every fifth frame is black, so the detector finds nothing in it.
    fn make_frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| {
                let value = if i % 5 == 0 { 0 } else { 40 + (i % 7) as u8 * 20 };
                let mut data = vec![value; 64 * 64 * 3];
                // a darker band so crops are not constant
                for px in data.chunks_exact_mut(3).skip(64 * 20).take(64 * 8) {
                    px.copy_from_slice(&[value / 2; 3]);
                }
                Frame::new(data, 64, 64, PixelFormat::Rgb24, i)
            })
            .collect()
    }

    fn trained_model() -> RecognizerModel {
        let datasets = vec![
            LabeledFaces::new("Alice", (0..3).map(|v| striped_face(0, v, FACE_SIZE)).collect()),
            LabeledFaces::new("Bob", (0..3).map(|v| striped_face(1, v, FACE_SIZE)).collect()),
        ];
        let mut model = RecognizerModel::new(AlgorithmKind::Lbph);
        model.train(&datasets).unwrap();
        model
    }

    fn extractor() -> FaceExtractor {
        FaceExtractor::new(Box::new(BrightFrameDetector), FaceNormalizer::new(FACE_SIZE))
    }

    fn use_case(
        reader: StubReader,
        writer: StubWriter,
        annotator: Box<dyn FrameAnnotator>,
        model: RecognizerModel,
        threshold: f64,
    ) -> AnnotateVideoUseCase {
        AnnotateVideoUseCase::new(
            Box::new(reader),
            Box::new(writer),
            extractor(),
            model,
            annotator,
            Box::new(NullPipelineLogger),
            threshold,
        )
    }

    fn run(
        reader: StubReader,
        writer: StubWriter,
        annotator: Box<dyn FrameAnnotator>,
        threshold: f64,
    ) -> Result<AnnotationSummary, Box<dyn std::error::Error>> {
        use_case(reader, writer, annotator, trained_model(), threshold)
            .execute(Path::new("in.mp4"), Path::new("out.mp4"))
    }

    // --- Tests ---

    #[test]
    fn test_every_frame_is_written_in_order() {
        let reader = StubReader::new(make_frames(50));
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let summary = run(reader, writer, Box::new(BoxLabelAnnotator::default()), f64::INFINITY)
            .unwrap();

        assert_eq!(summary.frames_written, 50);
        assert_eq!(summary.faces_detected, 40);
        let indices: Vec<usize> = written.lock().unwrap().iter().map(|f| f.index()).collect();
        assert_eq!(indices, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_frames_without_faces_are_written_unchanged() {
        let frames = make_frames(10);
        let originals = frames.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();

        run(
            StubReader::new(frames),
            writer,
            Box::new(BoxLabelAnnotator::default()),
            f64::INFINITY,
        )
        .unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written[0].data(), originals[0].data());
        assert_eq!(written[5].data(), originals[5].data());
        assert_ne!(written[1].data(), originals[1].data());
    }

    #[test]
    fn test_strict_threshold_labels_every_face_unknown() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let annotator = RecordingAnnotator {
            calls: calls.clone(),
        };

        let summary = run(
            StubReader::new(make_frames(10)),
            StubWriter::new(),
            Box::new(annotator),
            0.0,
        )
        .unwrap();

        assert_eq!(summary.faces_identified, 0);
        let calls = calls.lock().unwrap();
        let labels: Vec<&str> = calls
            .iter()
            .flat_map(|(_, a)| a.iter().map(|a| a.label.as_str()))
            .collect();
        assert_eq!(labels.len(), 8);
        assert!(labels.iter().all(|&l| l == "Unknown"));
    }

    #[test]
    fn test_permissive_threshold_names_every_face() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let annotator = RecordingAnnotator {
            calls: calls.clone(),
        };

        let summary = run(
            StubReader::new(make_frames(10)),
            StubWriter::new(),
            Box::new(annotator),
            f64::INFINITY,
        )
        .unwrap();

        assert_eq!(summary.faces_identified, summary.faces_detected);
        for (index, annotations) in calls.lock().unwrap().iter() {
            if index % 5 == 0 {
                assert!(annotations.is_empty());
            } else {
                assert_eq!(annotations.len(), 1);
                assert_eq!(annotations[0].region, Region::new(8, 8, 48, 48));
                assert!(["Alice", "Bob"].contains(&annotations[0].label.as_str()));
            }
        }
    }

    #[test]
    fn test_read_failure_closes_reader_and_writer() {
        let mut reader = StubReader::new(make_frames(10));
        reader.fail_at = Some(4);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let writer_closed = writer.closed.clone();
        let written = writer.written.clone();

        let err = run(reader, writer, Box::new(BoxLabelAnnotator::default()), 50.0).unwrap_err();

        assert!(err.to_string().contains("corrupt packet"));
        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
        assert_eq!(written.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_writer_open_failure_closes_reader() {
        let reader = StubReader::new(make_frames(3));
        let reader_closed = reader.closed.clone();
        let mut writer = StubWriter::new();
        writer.fail_open = true;

        let err = run(reader, writer, Box::new(BoxLabelAnnotator::default()), 50.0).unwrap_err();

        assert!(err.to_string().contains("cannot create output"));
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_untrained_model_fails_before_opening() {
        let reader = StubReader::new(make_frames(3));
        let opened = reader.opened.clone();

        let err = use_case(
            reader,
            StubWriter::new(),
            Box::new(BoxLabelAnnotator::default()),
            RecognizerModel::new(AlgorithmKind::Eigen),
            50.0,
        )
        .execute(Path::new("in.mp4"), Path::new("out.mp4"))
        .unwrap_err();

        assert!(err.to_string().contains("not been trained"));
        assert!(!*opened.lock().unwrap());
    }

    #[test]
    fn test_successful_run_closes_both_streams() {
        let reader = StubReader::new(make_frames(5));
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let writer_closed = writer.closed.clone();

        run(reader, writer, Box::new(BoxLabelAnnotator::default()), 50.0).unwrap();

        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_writer_receives_exact_source_frame_rate() {
        let mut reader = StubReader::new(make_frames(3));
        reader.frame_rate = FrameRate::new(30000, 1001);
        let writer = StubWriter::new();
        let opened_with = writer.opened_with.clone();

        run(reader, writer, Box::new(BoxLabelAnnotator::default()), 50.0).unwrap();

        let metadata = opened_with.lock().unwrap().clone().unwrap();
        assert_eq!(metadata.frame_rate, FrameRate::new(30000, 1001));
        assert_eq!((metadata.width, metadata.height), (64, 64));
    }
}
