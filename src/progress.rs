//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring playback,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use frame_sampler::{
//!     CancellationToken, PlaybackOptions, ProgressCallback, ProgressInfo, ResultsRecorder,
//!     StubDetector, run_playback,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("pass {} frame {} @ {:?} ms", info.pass, info.frames_submitted, info.timestamp_ms);
//!     }
//! }
//!
//! let recorder = Arc::new(ResultsRecorder::new(std::io::sink())?);
//! let mut detector = StubDetector::new(1);
//! let options = PlaybackOptions::new().with_progress(Arc::new(PrintProgress));
//! run_playback("input.mp4", &options, &mut detector, &recorder)?;
//! # Ok::<(), frame_sampler::SamplerError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of playback progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`PlaybackOptions::with_batch_size`](crate::PlaybackOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Zero-based index of the current pass over the video.
    pub pass: u32,
    /// Frames handed to the detector so far in this pass.
    pub frames_submitted: u64,
    /// Timestamp of the most recent frame, if any.
    pub timestamp_ms: Option<i64>,
    /// Wall-clock time elapsed since the pass started.
    pub elapsed: Duration,
    /// Throughput so far in frames per second of wall-clock time.
    pub frames_per_second: Option<f64>,
}

/// Trait for receiving progress updates during playback.
///
/// Implementations must be [`Send`] and [`Sync`] so a callback can be shared
/// with other threads (e.g. a terminal spinner).
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// playback. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during playback.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread (or a Ctrl-C
/// handler) to stop the associated playback. The playback loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) before each frame.
///
/// # Example
///
/// ```
/// use frame_sampler::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks per-pass progress and emits callbacks every `batch_size` frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    pass: u32,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
    last_timestamp_ms: Option<i64>,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, pass: u32, batch_size: u64) -> Self {
        Self {
            callback,
            pass,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
            last_timestamp_ms: None,
        }
    }

    /// Record one submitted frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, timestamp_ms: i64) {
        self.current += 1;
        self.items_since_last_report += 1;
        self.last_timestamp_ms = Some(timestamp_ms);

        if self.items_since_last_report >= self.batch_size {
            self.report();
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final progress report.
    pub(crate) fn finish(&mut self) {
        self.report();
    }

    pub(crate) fn frames_submitted(&self) -> u64 {
        self.current
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn report(&self) {
        let elapsed = self.start_time.elapsed();
        let seconds = elapsed.as_secs_f64();
        let frames_per_second = (self.current > 0 && seconds > 0.0)
            .then(|| self.current as f64 / seconds);

        let info = ProgressInfo {
            pass: self.pass,
            frames_submitted: self.current,
            timestamp_ms: self.last_timestamp_ms,
            elapsed,
            frames_per_second,
        };

        self.callback.on_progress(&info);
    }
}
