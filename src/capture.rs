//! Raw frame capture backends.
//!
//! [`RawCapture`] models a decoder the way most capture libraries expose it:
//! `grab` advances to the next frame, `retrieve` converts it into a buffer,
//! and `position_ms` reports the current stream position. Neither call says
//! *why* it failed, so a corrupt frame and the end of the file look the same.
//! [`RetryingDecoder`](crate::RetryingDecoder) turns that into an unambiguous
//! [`FrameDecoder`](crate::FrameDecoder).
//!
//! [`FfmpegCapture`] is the FFmpeg-backed implementation used by
//! [`VideoSource::open`](crate::VideoSource::open).

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::error::SamplerError;
use crate::frame::{ColorFormat, Frame};

/// A decoder with ambiguous failure reporting.
pub trait RawCapture {
    /// Advance to the next frame. Returns `false` on a decode error *or* at
    /// the end of the stream.
    fn grab(&mut self) -> bool;

    /// Convert the most recently grabbed frame into `frame`. Returns `false`
    /// if nothing was grabbed or the conversion failed.
    fn retrieve(&mut self, frame: &mut Frame) -> bool;

    /// Current stream position in milliseconds. Reports the last grabbed
    /// frame's time, or `0` before the first grab.
    fn position_ms(&self) -> i64;
}

/// FFmpeg-backed [`RawCapture`] over the best video stream of a file.
///
/// Packets are read and decoded lazily on each [`grab`](RawCapture::grab);
/// non-video packets are skipped. Once the demuxer reports end-of-file and
/// the decoder is drained, every further `grab` returns `false`.
pub struct FfmpegCapture {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    time_base: Rational,
    frame_duration_ms: Option<i64>,
    color_format: ColorFormat,
    width: u32,
    height: u32,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    position_ms: i64,
    frames_grabbed: u64,
    grabbed: bool,
    eof_sent: bool,
    finished: bool,
}

impl FfmpegCapture {
    /// Open `path` and prepare a decoder that converts to `color_format`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::OpenFailure`] if FFmpeg cannot open the file,
    /// finds no video stream, or cannot build a decoder for it.
    pub fn open<P: AsRef<Path>>(path: P, color_format: ColorFormat) -> Result<Self, SamplerError> {
        let path = path.as_ref();
        let open_failure = |reason: String| SamplerError::OpenFailure {
            path: PathBuf::from(path),
            reason,
        };

        log::debug!("Opening video file: {}", path.display());

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init()
            .map_err(|error| open_failure(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_failure(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| open_failure("No video stream found in file".to_string()))?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        let frame_duration_ms = crate::utilities::frame_duration_ms(stream.avg_frame_rate());

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_failure(format!("Unreadable codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_failure(format!("Failed to open video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            color_format.to_ffmpeg_pixel(),
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_failure(format!("Failed to create scaler: {error}")))?;

        log::debug!(
            "Video stream {} ready ({}x{}, time base {}/{})",
            video_stream_index,
            width,
            height,
            time_base.numerator(),
            time_base.denominator(),
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            time_base,
            frame_duration_ms,
            color_format,
            width,
            height,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            position_ms: 0,
            frames_grabbed: 0,
            grabbed: false,
            eof_sent: false,
            finished: false,
        })
    }

    /// Width of decoded frames in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of decoded frames in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl RawCapture for FfmpegCapture {
    fn grab(&mut self) -> bool {
        self.grabbed = false;
        if self.finished {
            return false;
        }

        loop {
            // Try to receive a frame the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let pts = self
                    .decoded_frame
                    .timestamp()
                    .or_else(|| self.decoded_frame.pts());
                self.position_ms = match pts {
                    Some(pts) => crate::utilities::pts_to_milliseconds(pts, self.time_base),
                    None => crate::utilities::position_without_pts(
                        (self.frames_grabbed > 0).then_some(self.position_ms),
                        self.frame_duration_ms,
                    ),
                };
                self.frames_grabbed += 1;
                self.grabbed = true;
                return true;
            }

            if self.eof_sent {
                self.finished = true;
                return false;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() != self.video_stream_index {
                        continue;
                    }
                    if let Err(error) = self.decoder.send_packet(&packet) {
                        log::debug!("Decoder rejected packet: {error}");
                        return false;
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        log::debug!("Failed to flush decoder: {error}");
                    }
                    self.eof_sent = true;
                }
                Err(error) => {
                    log::debug!("Packet read failed: {error}");
                    return false;
                }
            }
        }
    }

    fn retrieve(&mut self, frame: &mut Frame) -> bool {
        if !self.grabbed {
            return false;
        }

        if let Err(error) = self.scaler.run(&self.decoded_frame, &mut self.scaled_frame) {
            log::debug!("Failed to convert decoded frame: {error}");
            return false;
        }

        crate::utilities::copy_frame_into(
            &self.scaled_frame,
            self.width,
            self.height,
            self.color_format.bytes_per_pixel(),
            &mut frame.data,
        );
        frame.width = self.width;
        frame.height = self.height;
        frame.color_format = self.color_format;
        true
    }

    fn position_ms(&self) -> i64 {
        self.position_ms
    }
}
