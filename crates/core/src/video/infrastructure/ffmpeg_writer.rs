use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes frames as MPEG-4 via ffmpeg-next.
///
/// Frames of any pixel format are converted to RGB before encoding; their
/// dimensions must match the metadata the writer was opened with.
pub struct FfmpegWriter {
    encoding: Option<EncodeState>,
}

struct EncodeState {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
}

const VIDEO_STREAM_INDEX: usize = 0;

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self { encoding: None }
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Encoder timebase and frame rate for `metadata`; one pts tick per frame.
fn encoder_timing(metadata: &VideoMetadata) -> (ffmpeg_next::Rational, ffmpeg_next::Rational) {
    let rate = metadata.output_frame_rate();
    (
        ffmpeg_next::Rational(rate.den(), rate.num()),
        ffmpeg_next::Rational(rate.num(), rate.den()),
    )
}

impl EncodeState {
    /// Writes every packet the encoder has ready.
    fn drain(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let ost_time_base = self
            .octx
            .stream(VIDEO_STREAM_INDEX)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(VIDEO_STREAM_INDEX);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);

        let (time_base, frame_rate) = encoder_timing(metadata);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(frame_rate));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Writing {} ({}x{} @ {} fps)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.output_frame_rate()
        );

        self.encoding = Some(EncodeState {
            octx,
            encoder,
            scaler,
            width: metadata.width,
            height: metadata.height,
            time_base,
            frame_count: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let state = self.encoding.as_mut().ok_or("FfmpegWriter: not opened")?;
        if (frame.width(), frame.height()) != (state.width, state.height) {
            return Err(format!(
                "frame {} is {}x{}, writer expects {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                state.width,
                state.height
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            state.width,
            state.height,
        );

        let stride = rgb_frame.stride(0);
        let row_bytes = state.width as usize * 3;
        let src = frame.to_rgb24();
        let data = rgb_frame.data_mut(0);
        for row in 0..state.height as usize {
            data[row * stride..row * stride + row_bytes]
                .copy_from_slice(&src[row * row_bytes..(row + 1) * row_bytes]);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        state.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(state.frame_count as i64));

        state.encoder.send_frame(&yuv_frame)?;
        state.drain()?;
        state.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut state) = self.encoding.take() else {
            return Ok(());
        };
        state.encoder.send_eof()?;
        state.drain()?;
        state.octx.write_trailer()?;
        log::debug!("Wrote {} frames", state.frame_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use crate::shared::video_metadata::FrameRate;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

    fn metadata(w: u32, h: u32, fps: i32) -> VideoMetadata {
        metadata_at(w, h, FrameRate::new(fps, 1))
    }

    fn metadata_at(w: u32, h: u32, frame_rate: FrameRate) -> VideoMetadata {
        VideoMetadata {
            width: w,
            height: h,
            frame_rate,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        }
    }

    fn solid_frame(index: usize, w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h, PixelFormat::Rgb24, index)
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30)).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_without_open_returns_error() {
        let mut writer = FfmpegWriter::new();
        assert!(writer.write(&solid_frame(0, 160, 120, 128)).is_err());
    }

    #[test]
    fn test_write_rejects_mismatched_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FfmpegWriter::new();
        writer
            .open(&dir.path().join("out.mp4"), &metadata(160, 120, 30))
            .unwrap();
        assert!(writer.write(&solid_frame(0, 80, 60, 0)).is_err());
        writer.close().unwrap();
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FfmpegWriter::new();
        writer
            .open(&dir.path().join("out.mp4"), &metadata(160, 120, 30))
            .unwrap();
        writer.write(&solid_frame(0, 160, 120, 128)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_roundtrip_preserves_count_size_and_brightness() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 25)).unwrap();
        for i in 0..4 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        let read_meta = reader.open(&path).unwrap();
        assert_eq!((read_meta.width, read_meta.height), (160, 120));

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 4);

        // lossy codec: only the overall brightness is stable
        let first = &frames[0];
        let avg = first.data().iter().map(|&b| b as f64).sum::<f64>() / first.data().len() as f64;
        assert!((avg - 128.0).abs() < 40.0, "average {avg}");
    }

    #[test]
    fn test_gray_frames_are_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(64, 48, 0)).unwrap();
        writer
            .write(&Frame::new(vec![200; 64 * 48], 64, 48, PixelFormat::Gray8, 0))
            .unwrap();
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        assert_eq!(reader.frames().count(), 1);
    }

    #[test]
    fn test_fractional_rate_sets_exact_timebase() {
        let ntsc = metadata_at(160, 120, FrameRate::new(30000, 1001));
        let (time_base, frame_rate) = encoder_timing(&ntsc);
        assert_eq!(time_base, ffmpeg_next::Rational(1001, 30000));
        assert_eq!(frame_rate, ffmpeg_next::Rational(30000, 1001));
    }

    #[test]
    fn test_unknown_rate_encodes_at_30() {
        let (time_base, _) = encoder_timing(&metadata(160, 120, 0));
        assert_eq!(time_base, ffmpeg_next::Rational(1, 30));
    }

    #[test]
    fn test_ntsc_source_roundtrips_at_ntsc_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ntsc.mp4");

        let mut writer = FfmpegWriter::new();
        writer
            .open(&path, &metadata_at(160, 120, FrameRate::new(30000, 1001)))
            .unwrap();
        for i in 0..6 {
            writer.write(&solid_frame(i, 160, 120, 90)).unwrap();
        }
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        let read_meta = reader.open(&path).unwrap();
        assert!((read_meta.fps() - 30000.0 / 1001.0).abs() < 0.01, "fps {}", read_meta.fps());
    }
}
