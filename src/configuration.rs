//! Source and playback configuration.
//!
//! [`SourceOptions`] controls how a [`VideoSource`](crate::VideoSource)
//! samples and decodes frames. [`PlaybackOptions`] threads source settings,
//! looping, progress callbacks, and cancellation tokens through
//! [`run_playback`](crate::run_playback) without polluting its signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use frame_sampler::{CancellationToken, PlaybackOptions, ProgressCallback, ProgressInfo, SourceOptions};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("pass {}: {} frames", info.pass, info.frames_submitted);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = PlaybackOptions::new()
//!     .with_source(SourceOptions::new().with_sampling_rate(10))
//!     .with_loop(true)
//!     .with_max_passes(3)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(25);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::decoder::DEFAULT_MAX_RETRIES;
use crate::detector::Feature;
use crate::frame::ColorFormat;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Settings for opening a [`VideoSource`](crate::VideoSource).
///
/// Defaults: sampling disabled (every frame), BGR output, two decode retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Frames per second to retain. `0` keeps every decoded frame; negative
    /// values are rejected when the source is opened.
    pub sampling_rate_hz: i64,
    /// Extra fetch attempts after a failed decode before giving up.
    pub max_retries: u32,
    /// Pixel layout of the frames handed to the caller.
    pub color_format: ColorFormat,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            color_format: ColorFormat::Bgr,
        }
    }
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target sampling rate in frames per second.
    #[must_use]
    pub fn with_sampling_rate(mut self, sampling_rate_hz: i64) -> Self {
        self.sampling_rate_hz = sampling_rate_hz;
        self
    }

    /// Set how many times a failed decode is retried before the stream is
    /// treated as finished.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the output pixel layout.
    #[must_use]
    pub fn with_color_format(mut self, color_format: ColorFormat) -> Self {
        self.color_format = color_format;
        self
    }
}

/// Configuration for [`run_playback`](crate::run_playback).
///
/// All fields have sensible defaults: one pass, every frame, the full
/// feature set, no progress callback, and no cancellation.
#[derive(Clone)]
pub struct PlaybackOptions {
    /// How each pass opens its source.
    pub(crate) source: SourceOptions,
    /// Detector features enabled before the session starts.
    pub(crate) features: Vec<Feature>,
    /// Restart from the beginning after each pass.
    pub(crate) loop_playback: bool,
    /// Upper bound on the number of passes. `None` means unbounded when
    /// looping.
    pub(crate) max_passes: Option<u32>,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for PlaybackOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PlaybackOptions")
            .field("source", &self.source)
            .field("features", &self.features)
            .field("loop_playback", &self.loop_playback)
            .field("max_passes", &self.max_passes)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            source: SourceOptions::default(),
            features: Feature::ALL.to_vec(),
            loop_playback: false,
            max_passes: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the options used to open the source on every pass.
    #[must_use]
    pub fn with_source(mut self, source: SourceOptions) -> Self {
        self.source = source;
        self
    }

    /// Set the detector features to enable.
    #[must_use]
    pub fn with_features(mut self, features: &[Feature]) -> Self {
        self.features = features.to_vec();
        self
    }

    /// Replay the video from the start after each pass.
    #[must_use]
    pub fn with_loop(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }

    /// Stop after `passes` passes even when looping. Clamped to a minimum
    /// of 1.
    #[must_use]
    pub fn with_max_passes(mut self, passes: u32) -> Self {
        self.max_passes = Some(passes.max(1));
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// The token is checked between frames; a cancelled playback stops the
    /// detector and returns a summary with
    /// [`cancelled`](crate::PlaybackSummary::cancelled) set.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn source(&self) -> &SourceOptions {
        &self.source
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
