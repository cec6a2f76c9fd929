use std::path::Path;

use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::video_metadata::{FrameRate, VideoMetadata};
use crate::video::domain::video_reader::VideoReader;

/// Decodes the best video stream of a file via ffmpeg-next, yielding RGB24
/// frames in decode order.
pub struct FfmpegReader {
    input: Option<OpenInput>,
}

/// Everything needed to keep decoding an opened file.
struct OpenInput {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    next_index: usize,
    eof_sent: bool,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { input: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Average frame rate of the stream, or its base rate when the container
/// does not record an average.
fn stream_frame_rate(stream: &ffmpeg_next::format::stream::Stream) -> FrameRate {
    let avg = stream.avg_frame_rate();
    let rate = FrameRate::new(avg.numerator(), avg.denominator());
    if rate.is_known() {
        return rate;
    }
    let base = stream.rate();
    FrameRate::new(base.numerator(), base.denominator())
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        self.input = None;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let frame_rate = stream_frame_rate(&stream);
        let total_frames = stream.frames().max(0) as usize;
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            frame_rate,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {} ({}x{} @ {} fps, {})",
            path.display(),
            width,
            height,
            frame_rate,
            metadata.codec
        );

        self.input = Some(OpenInput {
            ictx,
            decoder,
            scaler,
            stream_index,
            next_index: 0,
            eof_sent: false,
        });
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match self.input.as_mut() {
            Some(input) => Box::new(DecodedFrames { input }),
            None => Box::new(std::iter::once(Err("FfmpegReader: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.input = None;
    }
}

impl OpenInput {
    fn convert(&mut self, decoded: &Video) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut rgb = Video::empty();
        self.scaler.run(decoded, &mut rgb)?;

        let (width, height) = (rgb.width(), rgb.height());
        let row_bytes = width as usize * 3;
        // rows may be padded past width * 3
        let pixels: Vec<u8> = rgb
            .data(0)
            .chunks(rgb.stride(0))
            .take(height as usize)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect();

        let frame = Frame::new(pixels, width, height, PixelFormat::Rgb24, self.next_index);
        self.next_index += 1;
        Ok(frame)
    }
}

/// Pulls packets only as far as needed to produce the next frame.
struct DecodedFrames<'a> {
    input: &'a mut OpenInput,
}

impl Iterator for DecodedFrames<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let input = &mut *self.input;
        loop {
            let mut decoded = Video::empty();
            if input.decoder.receive_frame(&mut decoded).is_ok() {
                return Some(input.convert(&decoded));
            }
            if input.eof_sent {
                return None;
            }
            match input.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != input.stream_index {
                        continue;
                    }
                    if let Err(e) = input.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    // drains the frames the decoder still holds
                    let _ = input.decoder.send_eof();
                    input.eof_sent = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::video_writer::VideoWriter;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
    use std::path::PathBuf;

    /// Encodes `frames` solid frames whose brightness steps by 40.
    fn test_video(dir: &Path, frames: usize) -> PathBuf {
        let path = dir.join("test.mp4");
        let metadata = VideoMetadata {
            width: 160,
            height: 120,
            frame_rate: FrameRate::new(30, 1),
            total_frames: frames,
            codec: String::new(),
            source_path: None,
        };
        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata).unwrap();
        for i in 0..frames {
            let value = ((i * 40) % 256) as u8;
            let frame = Frame::new(vec![value; 160 * 120 * 3], 160, 120, PixelFormat::Rgb24, i);
            writer.write(&frame).unwrap();
        }
        writer.close().unwrap();
        path
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (160, 120));
        assert!((meta.fps() - 30.0).abs() < 0.01, "fps {}", meta.fps());
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let mut reader = FfmpegReader::new();
        assert!(reader.open(Path::new("/nonexistent/test.mp4")).is_err());
    }

    #[test]
    fn test_frames_arrive_in_order_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();

        let frames: Vec<Frame> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.format(), PixelFormat::Rgb24);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
        assert!(frames[0].data()[0] < frames[2].data()[0]);
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut reader = FfmpegReader::new();
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_exhausted_stream_stays_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 2);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        assert_eq!(reader.frames().count(), 2);
        assert_eq!(reader.frames().count(), 0);
    }

    #[test]
    fn test_reopen_restarts_the_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 3);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        assert_eq!(reader.frames().count(), 3);
        reader.close();

        reader.open(&path).unwrap();
        assert_eq!(reader.frames().count(), 3);
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
    }
}
