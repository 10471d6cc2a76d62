//! Rate-limited frame sampling with `VideoSource`.
//!
//! Usage:
//!   cargo run --example sample_frames -- <input_file> [sampling_fps]

use std::error::Error;

use frame_sampler::{
    ColorFormat, FfmpegCapture, FfmpegLogLevel, RetryingDecoder, SourceOptions, VideoSource,
};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let input_path = args.next().unwrap_or_else(|| "input.mp4".to_string());
    let sampling_fps: i64 = args.next().map_or(Ok(5), |value| value.parse())?;

    frame_sampler::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    // ── Every frame ────────────────────────────────────────────────
    println!("Reading every frame...");
    let mut source = VideoSource::open(&input_path, 0)?;
    while source.next_frame().is_some() {}
    println!("  {} frames decoded", source.frames_decoded());

    // ── Sampled ────────────────────────────────────────────────────
    println!("\nSampling at {sampling_fps} fps...");
    let mut source = VideoSource::open(&input_path, sampling_fps)?;
    while let Some(frame) = source.next_frame() {
        println!(
            "  {:>8.3}s  {}x{}",
            frame.timestamp_ms() as f64 / 1000.0,
            frame.width(),
            frame.height(),
        );
    }
    println!(
        "  kept {}, skipped {}",
        source.frames_accepted(),
        source.frames_skipped()
    );

    // ── Custom wiring ──────────────────────────────────────────────
    println!("\nOpening the FFmpeg capture directly (grayscale, 4 retries)...");
    let options = SourceOptions::new()
        .with_sampling_rate(1)
        .with_max_retries(4)
        .with_color_format(ColorFormat::Gray);
    let mut source = VideoSource::open_with(&input_path, &options, |path| {
        let capture = FfmpegCapture::open(path, options.color_format)?;
        println!("  stream is {}x{}", capture.width(), capture.height());
        Ok(RetryingDecoder::with_max_retries(
            capture,
            options.color_format,
            options.max_retries,
        ))
    })?;

    if let Some(frame) = source.next_frame() {
        let output_path = "first_frame.png";
        frame.to_image()?.save(output_path)?;
        println!("  first frame saved to {output_path}");
    }

    Ok(())
}
