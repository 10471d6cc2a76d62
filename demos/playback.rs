//! Run a video through a detector, with progress and cancellation.
//!
//! Usage:
//!   cargo run --example playback -- <input_file>

use std::error::Error;
use std::sync::Arc;

use frame_sampler::{
    CancellationToken, Feature, PlaybackOptions, ProgressCallback, ProgressInfo,
    ResultsRecorder, SourceOptions, StubDetector, run_playback,
};

/// Prints a line every batch of frames.
struct PrintProgress;

impl ProgressCallback for PrintProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let fps = info
            .frames_per_second
            .map_or("?".to_string(), |fps| format!("{fps:.1}"));
        println!(
            "[pass {}] {} frames, at {:?} ms, {fps} frames/s",
            info.pass, info.frames_submitted, info.timestamp_ms,
        );
    }
}

/// Cancels playback once enough frames have been submitted.
struct StopAfter {
    frames: u64,
    token: CancellationToken,
}

impl ProgressCallback for StopAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.frames_submitted >= self.frames {
            self.token.cancel();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());

    // ── Two looping passes with progress ───────────────────────────
    println!("Playing two passes at 5 fps...");
    let recorder = Arc::new(ResultsRecorder::create("playback.csv")?);
    let mut detector = StubDetector::new(1);
    let options = PlaybackOptions::new()
        .with_source(SourceOptions::new().with_sampling_rate(5))
        .with_features(&[Feature::Identity, Feature::Appearances])
        .with_loop(true)
        .with_max_passes(2)
        .with_progress(Arc::new(PrintProgress))
        .with_batch_size(5);

    let summary = run_playback(&input_path, &options, &mut detector, &recorder)?;
    for pass in &summary.passes {
        println!(
            "  pass {}: {} processed, {} with faces ({:.2}%)",
            pass.pass,
            pass.tally.frames_processed,
            pass.tally.frames_with_faces,
            pass.tally.faces_percent(),
        );
    }
    println!("Results written to playback.csv\n");

    // ── Cancellation ───────────────────────────────────────────────
    println!("Looping until 20 frames have been submitted...");
    let token = CancellationToken::new();
    let options = PlaybackOptions::new()
        .with_loop(true)
        .with_cancellation(token.clone())
        .with_progress(Arc::new(StopAfter { frames: 20, token }));
    let recorder = Arc::new(ResultsRecorder::new(std::io::sink())?);

    let summary = run_playback(&input_path, &options, &mut detector, &recorder)?;
    println!(
        "  cancelled: {}, frames submitted: {}",
        summary.cancelled,
        summary.total_frames_submitted()
    );

    Ok(())
}
