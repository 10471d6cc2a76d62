//! # frame-sampler
//!
//! Pull decoded video frames at a controlled rate, with strictly increasing
//! timestamps, and feed them to a frame detector.
//!
//! Video decoders are unreliable at the edges: a corrupt frame and the end
//! of the file often produce the same symptom (a failed fetch, or a repeated
//! timestamp). `frame-sampler` hides that behind [`VideoSource`], a
//! pull-based reader that retries ambiguous failures a bounded number of
//! times, treats replays as end-of-stream, and drops frames that arrive
//! faster than the requested sampling rate. Decoding is powered by FFmpeg
//! via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Read Every Frame
//!
//! ```no_run
//! use frame_sampler::VideoSource;
//!
//! let mut source = VideoSource::open("input.mp4", 0).unwrap();
//! while let Some(frame) = source.next_frame() {
//!     println!("{} ms", frame.timestamp_ms());
//! }
//! ```
//!
//! ### Sample at 10 fps
//!
//! ```no_run
//! use frame_sampler::{ColorFormat, SourceOptions, VideoSource};
//!
//! let options = SourceOptions::new()
//!     .with_sampling_rate(10)
//!     .with_color_format(ColorFormat::Rgb);
//! let mut source = VideoSource::open_with_options("input.mov", &options).unwrap();
//! if let Some(frame) = source.next_frame() {
//!     frame.to_image().unwrap().save("first.png").unwrap();
//! }
//! ```
//!
//! ### Run a Detector Over a Video
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use frame_sampler::{PlaybackOptions, ResultsRecorder, StubDetector, run_playback};
//!
//! let recorder = Arc::new(ResultsRecorder::create("input.csv").unwrap());
//! let mut detector = StubDetector::new(1);
//! let summary = run_playback("input.mp4", &PlaybackOptions::new(), &mut detector, &recorder).unwrap();
//! println!("{} frames processed", summary.total_frames_submitted());
//! ```
//!
//! ## Features
//!
//! - **Sampling gate**: keep at most N frames per second; `0` keeps all
//! - **Retry disambiguation**: bounded retries with a monotonic-timestamp
//!   check, configurable retry bound
//! - **Format allow-list**: `avi`, `mov`, `flv`, `webm`, `wmv`, `mp4`,
//!   checked before any decoder is opened
//! - **Pluggable decoders**: [`RawCapture`] and [`FrameDecoder`] traits
//!   for custom backends and test doubles
//! - **Detector lifecycle**: [`FrameDetector`] trait and a scope guard that
//!   stops a started detector on every exit path
//! - **CSV results**: [`ResultsRecorder`] with per-pass tallies
//! - **Progress & cancellation**: callbacks and `CancellationToken` for
//!   long or looping playback
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod capture;
pub mod configuration;
pub mod decoder;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod playback;
pub mod progress;
pub mod report;
pub mod sampling;
pub mod source;
mod utilities;
pub mod validation;

pub use capture::{FfmpegCapture, RawCapture};
pub use configuration::{PlaybackOptions, SourceOptions};
pub use decoder::{DEFAULT_MAX_RETRIES, DecodeOutcome, FrameDecoder, RetryingDecoder};
pub use detector::{
    BoundingBox, DetectionListener, DetectionResults, DetectorSession, Face, Feature,
    FrameDetector, StubDetector,
};
pub use error::SamplerError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{ColorFormat, Frame};
pub use playback::{PassSummary, PlaybackSummary, run_playback, run_playback_with};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use report::{PassTally, ResultsRecorder};
pub use sampling::SamplingGate;
pub use source::VideoSource;
pub use validation::SUPPORTED_EXTENSIONS;
