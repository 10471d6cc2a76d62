//! Playback driver.
//!
//! [`run_playback`] wires a [`VideoSource`] to a [`FrameDetector`]: it
//! configures and starts the detector, feeds it every accepted frame,
//! summarises each pass from the [`ResultsRecorder`] tallies, resets
//! per-pass state, and optionally replays the video from the start.
//!
//! The detector is stopped on every exit path. If a pass fails to open its
//! source, the [`DetectorSession`] guard stops the detector before the error
//! is returned.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use frame_sampler::{PlaybackOptions, ResultsRecorder, SourceOptions, StubDetector, run_playback};
//!
//! let recorder = Arc::new(ResultsRecorder::create("input.csv")?);
//! let mut detector = StubDetector::new(1);
//! let options = PlaybackOptions::new().with_source(SourceOptions::new().with_sampling_rate(5));
//!
//! let summary = run_playback("input.mp4", &options, &mut detector, &recorder)?;
//! for pass in &summary.passes {
//!     println!("{} frames, {:.1}% with faces", pass.tally.frames_processed, pass.tally.faces_percent());
//! }
//! # Ok::<(), frame_sampler::SamplerError>(())
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::configuration::{PlaybackOptions, SourceOptions};
use crate::decoder::FrameDecoder;
use crate::detector::{DetectorSession, FrameDetector};
use crate::error::SamplerError;
use crate::progress::ProgressTracker;
use crate::report::{PassTally, ResultsRecorder};
use crate::source::VideoSource;

/// Statistics for one pass over the video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    /// Zero-based pass index.
    pub pass: u32,
    /// Frames handed to the detector.
    pub frames_submitted: u64,
    /// Frames decoded, including those dropped by sampling.
    pub frames_decoded: u64,
    /// Frames dropped by the sampling gate.
    pub frames_skipped: u64,
    /// Detector results recorded during the pass.
    pub tally: PassTally,
    /// Wall-clock duration of the pass.
    pub elapsed: Duration,
}

/// Outcome of [`run_playback`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSummary {
    pub passes: Vec<PassSummary>,
    /// `true` if a [`CancellationToken`](crate::CancellationToken) ended the
    /// playback early.
    pub cancelled: bool,
}

impl PlaybackSummary {
    /// Frames handed to the detector across all passes.
    pub fn total_frames_submitted(&self) -> u64 {
        self.passes.iter().map(|pass| pass.frames_submitted).sum()
    }
}

/// Play `path` through `detector` using FFmpeg-backed sources.
///
/// # Errors
///
/// Returns source construction errors ([`SamplerError::InvalidArgument`],
/// [`SamplerError::UnsupportedFormat`], [`SamplerError::OpenFailure`]),
/// detector errors, and I/O errors from flushing the recorder. Cancellation
/// is not an error; see [`PlaybackSummary::cancelled`].
pub fn run_playback<P: AsRef<Path>>(
    path: P,
    options: &PlaybackOptions,
    detector: &mut dyn FrameDetector,
    recorder: &Arc<ResultsRecorder>,
) -> Result<PlaybackSummary, SamplerError> {
    run_playback_with(path, options, detector, recorder, |path, source_options| {
        VideoSource::open_with_options(path, source_options)
    })
}

/// Like [`run_playback`], with a caller-supplied way to open each pass's
/// source.
///
/// `open` is called once per pass, so every pass starts from the beginning
/// of the video with a fresh sampling gate.
///
/// # Errors
///
/// Same as [`run_playback`].
pub fn run_playback_with<P, D, F>(
    path: P,
    options: &PlaybackOptions,
    detector: &mut dyn FrameDetector,
    recorder: &Arc<ResultsRecorder>,
    mut open: F,
) -> Result<PlaybackSummary, SamplerError>
where
    P: AsRef<Path>,
    D: FrameDecoder,
    F: FnMut(&Path, &SourceOptions) -> Result<VideoSource<D>, SamplerError>,
{
    let path = path.as_ref();

    detector.configure(&options.features)?;
    detector.set_listener(recorder.clone());
    let mut session = DetectorSession::start(detector)?;

    let mut summary = PlaybackSummary::default();
    let mut pass = 0u32;

    loop {
        let mut source = open(path, &options.source)?;
        let mut tracker = ProgressTracker::new(options.progress.clone(), pass, options.batch_size);

        loop {
            if options.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let Some(frame) = source.next_frame() else {
                break;
            };
            session.process(frame)?;
            tracker.advance(frame.timestamp_ms());
        }
        tracker.finish();

        let pass_summary = PassSummary {
            pass,
            frames_submitted: tracker.frames_submitted(),
            frames_decoded: source.frames_decoded(),
            frames_skipped: source.frames_skipped(),
            tally: recorder.tally(),
            elapsed: tracker.elapsed(),
        };
        log::info!(
            "Pass {} over {}: {} frames processed, {} with faces ({:.2}%)",
            pass,
            path.display(),
            pass_summary.tally.frames_processed,
            pass_summary.tally.frames_with_faces,
            pass_summary.tally.faces_percent(),
        );
        summary.passes.push(pass_summary);

        session.reset()?;
        recorder.reset();
        pass += 1;

        if summary.cancelled || !options.loop_playback {
            break;
        }
        if pass_summary.frames_submitted == 0 {
            log::warn!("{} produced no frames, not looping", path.display());
            break;
        }
        if options.max_passes.is_some_and(|max| pass >= max) {
            break;
        }
    }

    session.finish()?;
    recorder.flush()?;
    Ok(summary)
}
