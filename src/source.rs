//! The sampling video frame source.
//!
//! [`VideoSource`] presents a clean, monotonic, rate-limited stream of frames
//! on top of a [`FrameDecoder`]. It validates the input path before any
//! decoder is opened, drops frames that arrive faster than the requested
//! sampling rate, and reports end-of-stream by returning `None`.
//!
//! # Example
//!
//! ```no_run
//! use frame_sampler::VideoSource;
//!
//! // Keep at most 5 frames per second.
//! let mut source = VideoSource::open("input.mp4", 5)?;
//! while let Some(frame) = source.next_frame() {
//!     println!("{} ms: {}x{}", frame.timestamp_ms(), frame.width(), frame.height());
//! }
//! # Ok::<(), frame_sampler::SamplerError>(())
//! ```
//!
//! To replay a video, drop the source and open a new one; a fresh source
//! starts from the beginning with a fresh sampling gate.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use crate::capture::FfmpegCapture;
use crate::configuration::SourceOptions;
use crate::decoder::{DecodeOutcome, FrameDecoder, RetryingDecoder};
use crate::error::SamplerError;
use crate::frame::Frame;
use crate::sampling::SamplingGate;
use crate::validation::validate_extension;

/// A pull-based, rate-limited reader of decoded video frames.
///
/// Owned by a single consumer loop. Dropping the source releases the
/// underlying decoder.
pub struct VideoSource<D: FrameDecoder = RetryingDecoder<FfmpegCapture>> {
    path: PathBuf,
    decoder: D,
    gate: SamplingGate,
    frames_decoded: u64,
    frames_accepted: u64,
    exhausted: bool,
}

impl VideoSource {
    /// Open `path` with FFmpeg, keeping at most `sampling_rate_hz` frames per
    /// second (`0` keeps every frame).
    ///
    /// # Errors
    ///
    /// - [`SamplerError::InvalidArgument`] if `sampling_rate_hz` is negative.
    /// - [`SamplerError::UnsupportedFormat`] if the extension is not in
    ///   [`SUPPORTED_EXTENSIONS`](crate::validation::SUPPORTED_EXTENSIONS).
    /// - [`SamplerError::OpenFailure`] if the file cannot be decoded.
    pub fn open<P: AsRef<Path>>(path: P, sampling_rate_hz: i64) -> Result<Self, SamplerError> {
        Self::open_with_options(
            path,
            &SourceOptions::new().with_sampling_rate(sampling_rate_hz),
        )
    }

    /// Open `path` with FFmpeg using explicit [`SourceOptions`].
    ///
    /// # Errors
    ///
    /// Same as [`open`](VideoSource::open).
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: &SourceOptions,
    ) -> Result<Self, SamplerError> {
        Self::open_with(path, options, |path| {
            let capture = FfmpegCapture::open(path, options.color_format)?;
            Ok(RetryingDecoder::with_max_retries(
                capture,
                options.color_format,
                options.max_retries,
            ))
        })
    }
}

impl<D: FrameDecoder> VideoSource<D> {
    /// Open `path` with a caller-supplied decoder.
    ///
    /// The sampling rate and the extension are validated first; `open` is
    /// only invoked when both checks pass.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidArgument`] or
    /// [`SamplerError::UnsupportedFormat`] from validation, or whatever
    /// `open` returns.
    pub fn open_with<P, F>(path: P, options: &SourceOptions, open: F) -> Result<Self, SamplerError>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<D, SamplerError>,
    {
        let path = path.as_ref();
        let gate = SamplingGate::new(options.sampling_rate_hz)?;
        validate_extension(path)?;
        let decoder = open(path)?;

        log::debug!(
            "Opened video source {} (sampling {} Hz)",
            path.display(),
            gate.sampling_rate_hz(),
        );

        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            gate,
            frames_decoded: 0,
            frames_accepted: 0,
            exhausted: false,
        })
    }

    /// Pull the next frame that passes the sampling gate.
    ///
    /// Frames arriving sooner than the sampling interval are decoded and
    /// discarded. Returns `None` once the decoder has no more data; every
    /// later call returns `None` too.
    ///
    /// The returned frame borrows the source: its buffer is reused by the
    /// next pull.
    pub fn next_frame(&mut self) -> Option<&Frame> {
        if self.exhausted {
            return None;
        }

        loop {
            match self.decoder.decode() {
                DecodeOutcome::NoMoreData => {
                    self.exhausted = true;
                    log::debug!(
                        "Video source {} exhausted ({} decoded, {} accepted)",
                        self.path.display(),
                        self.frames_decoded,
                        self.frames_accepted,
                    );
                    return None;
                }
                DecodeOutcome::Decoded { timestamp_ms } => {
                    self.frames_decoded += 1;
                    if self.gate.accept(timestamp_ms) {
                        self.frames_accepted += 1;
                        return Some(self.decoder.frame());
                    }
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames per second retained, `0` when sampling is disabled.
    pub fn sampling_rate_hz(&self) -> u32 {
        self.gate.sampling_rate_hz()
    }

    /// Timestamp of the last frame returned, or the gate's starting sentinel.
    pub fn last_accepted_timestamp_ms(&self) -> i64 {
        self.gate.last_accepted_timestamp_ms()
    }

    /// Frames decoded so far, including those dropped by sampling.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Frames returned to the caller so far.
    pub fn frames_accepted(&self) -> u64 {
        self.frames_accepted
    }

    /// Frames decoded and discarded by the sampling gate.
    pub fn frames_skipped(&self) -> u64 {
        self.frames_decoded - self.frames_accepted
    }

    /// Returns `true` once [`next_frame`](VideoSource::next_frame) has
    /// reported end-of-stream.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<D: FrameDecoder> Debug for VideoSource<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("gate", &self.gate)
            .field("frames_decoded", &self.frames_decoded)
            .field("frames_accepted", &self.frames_accepted)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
