use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use frame_sampler::{
    CancellationToken, ColorFormat, FfmpegLogLevel, Frame, FrameDecoder, PlaybackOptions,
    PlaybackSummary, ProgressCallback, ProgressInfo, ResultsRecorder, SamplingGate, SourceOptions,
    StubDetector, VideoSource, run_playback, validation::validate_extension,
};

const CLI_AFTER_HELP: &str = "Examples:\n  frame-sampler run --input clip.mp4 --sfps 5\n  frame-sampler run --input clip.mp4 --loop --max-passes 3 --progress\n  frame-sampler sample clip.webm --sfps 2 --json\n  frame-sampler sample clip.mov --sfps 1 --save-dir frames\n  frame-sampler completions zsh > _frame-sampler";

#[derive(Debug, Parser)]
#[command(
    name = "frame-sampler",
    version,
    about = "Sample frames from a video and run them through a frame detector",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Extra decode attempts after a failed frame before treating it as end of stream.
    #[arg(long, global = true, default_value_t = frame_sampler::DEFAULT_MAX_RETRIES)]
    max_retries: u32,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a video through the detector and write per-frame results to CSV.
    #[command(
        about = "Process a video with the detector",
        after_help = "Examples:\n  frame-sampler run -i clip.mp4\n  frame-sampler run -i clip.mp4 --sfps 10 --num-faces 2 -o results.csv --json"
    )]
    Run {
        /// Video file to process.
        #[arg(short, long)]
        input: PathBuf,
        /// Sampling frame rate. 0 reads every frame at the video's own rate.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        sfps: i64,
        /// Number of faces to report per frame.
        #[arg(long, default_value_t = 1)]
        num_faces: u32,
        /// Replay the video until interrupted (Ctrl-C) or --max-passes is reached.
        #[arg(long = "loop")]
        loop_playback: bool,
        /// Upper bound on passes when looping.
        #[arg(long)]
        max_passes: Option<u32>,
        /// CSV output path. Defaults to the input path with a .csv extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Disable per-pass console output.
        #[arg(short, long)]
        quiet: bool,
        /// Print the playback summary as JSON.
        #[arg(long)]
        json: bool,
        /// Show a progress spinner.
        #[arg(long)]
        progress: bool,
    },

    /// List the timestamps a given sampling rate keeps.
    #[command(
        about = "List sampled frame timestamps",
        after_help = "Examples:\n  frame-sampler sample clip.mp4 --sfps 2\n  frame-sampler sample clip.mp4 --sfps 1 --save-dir frames --format rgb"
    )]
    Sample {
        /// Video file to read.
        input: PathBuf,
        /// Sampling frame rate. 0 keeps every frame.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        sfps: i64,
        /// Stop after this many frames.
        #[arg(long)]
        limit: Option<u64>,
        /// Save each sampled frame as a PNG in this directory.
        #[arg(long)]
        save_dir: Option<PathBuf>,
        /// Frame color format (bgr, rgb, gray).
        #[arg(long, default_value = "bgr")]
        format: String,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_color_format(value: &str) -> Option<ColorFormat> {
    match value.to_ascii_lowercase().as_str() {
        "bgr" | "bgr24" => Some(ColorFormat::Bgr),
        "rgb" | "rgb24" => Some(ColorFormat::Rgb),
        "gray" | "grey" | "gray8" | "grayscale" => Some(ColorFormat::Gray),
        _ => None,
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("csv")
}

/// Pick the CSV path for `run`, refusing to write over the input video.
fn resolve_output_path(input: &Path, output: Option<PathBuf>) -> Result<PathBuf, String> {
    let output = output.unwrap_or_else(|| default_output_path(input));
    let same_file = output == input
        || matches!(
            (fs::canonicalize(&output), fs::canonicalize(input)),
            (Ok(a), Ok(b)) if a == b
        );
    if same_file {
        return Err(format!(
            "output {} would overwrite the input file",
            output.display()
        ));
    }
    Ok(output)
}

/// Pull frames until the source ends or `limit` frames have been kept.
///
/// The limit is checked before each pull so no frame past it is decoded.
fn collect_sampled<D, F>(
    source: &mut VideoSource<D>,
    limit: Option<u64>,
    mut on_frame: F,
) -> Result<Vec<i64>, Box<dyn Error>>
where
    D: FrameDecoder,
    F: FnMut(&Frame) -> Result<(), Box<dyn Error>>,
{
    let mut timestamps = Vec::new();
    while limit.is_none_or(|limit| (timestamps.len() as u64) < limit) {
        let Some(frame) = source.next_frame() else {
            break;
        };
        timestamps.push(frame.timestamp_ms());
        on_frame(frame)?;
    }
    Ok(timestamps)
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        frame_sampler::set_ffmpeg_log_level(parsed);
    }
    if let Some(level) = frame_sampler::get_ffmpeg_log_level() {
        log::debug!("FFmpeg log level: {level}");
    }
    Ok(())
}

struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let timestamp = info
            .timestamp_ms
            .map(|ms| format!("{:.2}s", ms as f64 / 1000.0))
            .unwrap_or_else(|| "-".to_string());
        self.bar.set_message(format!(
            "pass {} | {} frames | at {}",
            info.pass, info.frames_submitted, timestamp
        ));
        self.bar.tick();
    }
}

fn print_summary(summary: &PlaybackSummary) {
    for pass in &summary.passes {
        println!("{}", "*".repeat(66));
        println!("{} {}", "Pass:".bold(), pass.pass);
        println!("{} {}", "Processed Frame count:".bold(), pass.tally.frames_processed);
        println!("{} {}", "Frames w/faces:".bold(), pass.tally.frames_with_faces);
        println!(
            "{} {:.2}%",
            "Percent of frames w/faces:".bold(),
            pass.tally.faces_percent()
        );
        println!(
            "{} {} decoded, {} skipped by sampling, {:.2}s",
            "Decoder:".bold(),
            pass.frames_decoded,
            pass.frames_skipped,
            pass.elapsed.as_secs_f64()
        );
    }
    println!("{}", "*".repeat(66));
    if summary.cancelled {
        println!("{}", "Playback cancelled".yellow());
    }
}

fn summary_json(
    summary: &PlaybackSummary,
    options: &PlaybackOptions,
    output: &Path,
) -> serde_json::Value {
    json!({
        "output": output.display().to_string(),
        "sampling_rate_hz": options.source().sampling_rate_hz,
        "max_retries": options.source().max_retries,
        "cancelled": summary.cancelled,
        "total_frames_submitted": summary.total_frames_submitted(),
        "passes": summary.passes.iter().map(|pass| json!({
            "pass": pass.pass,
            "frames_submitted": pass.frames_submitted,
            "frames_decoded": pass.frames_decoded,
            "frames_skipped": pass.frames_skipped,
            "frames_processed": pass.tally.frames_processed,
            "frames_with_faces": pass.tally.frames_with_faces,
            "faces_percent": pass.tally.faces_percent(),
            "elapsed_seconds": pass.elapsed.as_secs_f64(),
        })).collect::<Vec<_>>(),
    })
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Run {
            input,
            sfps,
            num_faces,
            loop_playback,
            max_passes,
            output,
            quiet,
            json,
            progress,
        } => {
            // Reject bad input before the CSV is created or truncated.
            SamplingGate::new(sfps)?;
            validate_extension(&input)?;
            let output = resolve_output_path(&input, output)?;
            let recorder = Arc::new(ResultsRecorder::create(&output)?);

            let token = CancellationToken::new();
            let handler_token = token.clone();
            ctrlc::set_handler(move || handler_token.cancel())?;

            let mut options = PlaybackOptions::new()
                .with_source(
                    SourceOptions::new()
                        .with_sampling_rate(sfps)
                        .with_max_retries(cli.global.max_retries),
                )
                .with_loop(loop_playback)
                .with_cancellation(token);
            if let Some(passes) = max_passes {
                options = options.with_max_passes(passes);
            }

            let spinner = progress.then(|| Arc::new(SpinnerProgress::new()));
            if let Some(spinner) = &spinner {
                options = options.with_progress(spinner.clone()).with_batch_size(10);
            }

            let mut detector = StubDetector::new(num_faces);
            let summary = run_playback(&input, &options, &mut detector, &recorder)?;

            if let Some(spinner) = &spinner {
                spinner.bar.finish_and_clear();
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&summary_json(&summary, &options, &output))?);
            } else {
                if !quiet {
                    print_summary(&summary);
                }
                println!("Output written to file: {}", output.display().to_string().green());
            }
        }

        Commands::Sample {
            input,
            sfps,
            limit,
            save_dir,
            format,
            json,
        } => {
            let color_format =
                parse_color_format(&format).ok_or(format!("unsupported --format: {format}"))?;
            let options = SourceOptions::new()
                .with_sampling_rate(sfps)
                .with_max_retries(cli.global.max_retries)
                .with_color_format(color_format);
            let mut source = VideoSource::open_with_options(&input, &options)?;

            if let Some(directory) = &save_dir {
                fs::create_dir_all(directory)?;
            }

            let timestamps = collect_sampled(&mut source, limit, |frame| {
                if let Some(directory) = &save_dir {
                    let path = directory.join(format!("frame_{:08}ms.png", frame.timestamp_ms()));
                    frame.to_image()?.save(&path)?;
                    log::debug!("saved frame {} -> {}", frame.timestamp_ms(), path.display());
                }
                Ok(())
            })?;

            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "sampling_rate_hz": source.sampling_rate_hz(),
                    "frames_decoded": source.frames_decoded(),
                    "frames_skipped": source.frames_skipped(),
                    "timestamps_ms": timestamps,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for timestamp_ms in &timestamps {
                    println!("{timestamp_ms}");
                }
                eprintln!(
                    "{} {} kept, {} skipped",
                    "sampled".cyan().bold(),
                    timestamps.len(),
                    source.frames_skipped()
                );
            }
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "frame-sampler", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use frame_sampler::{
        ColorFormat, Frame, RawCapture, RetryingDecoder, SourceOptions, VideoSource,
    };

    use super::{
        Cli, Commands, collect_sampled, default_output_path, parse_color_format,
        resolve_output_path,
    };

    /// Capture yielding a 1x1 frame every 40 ms.
    struct CountingCapture {
        remaining: u64,
        position_ms: i64,
        grabs: u64,
    }

    impl RawCapture for CountingCapture {
        fn grab(&mut self) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.position_ms = self.grabs as i64 * 40;
            self.grabs += 1;
            self.remaining -= 1;
            true
        }

        fn retrieve(&mut self, frame: &mut Frame) -> bool {
            match Frame::new(vec![0], 1, 1, ColorFormat::Gray, self.position_ms) {
                Ok(decoded) => {
                    *frame = decoded;
                    true
                }
                Err(_) => false,
            }
        }

        fn position_ms(&self) -> i64 {
            self.position_ms
        }
    }

    fn counting_source(frames: u64) -> VideoSource<RetryingDecoder<CountingCapture>> {
        VideoSource::open_with("clip.mp4", &SourceOptions::new(), |_| {
            Ok(RetryingDecoder::new(
                CountingCapture {
                    remaining: frames,
                    position_ms: 0,
                    grabs: 0,
                },
                ColorFormat::Gray,
            ))
        })
        .expect("scripted source should open")
    }

    #[test]
    fn parse_color_format_aliases() {
        assert!(parse_color_format("bgr").is_some());
        assert!(parse_color_format("RGB24").is_some());
        assert!(parse_color_format("grey").is_some());
        assert!(parse_color_format("yuv").is_none());
    }

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            default_output_path(Path::new("videos/clip.mp4")),
            Path::new("videos/clip.csv")
        );
    }

    #[test]
    fn run_accepts_negative_rate_for_library_validation() {
        let cli = Cli::try_parse_from(["frame-sampler", "run", "-i", "clip.mp4", "--sfps", "-1"])
            .expect("arguments should parse");
        match cli.command {
            Commands::Run { sfps, .. } => assert_eq!(sfps, -1),
            other => panic!("Expected Run, got: {other:?}"),
        }
    }

    #[test]
    fn global_retry_bound_defaults_to_two() {
        let cli = Cli::try_parse_from(["frame-sampler", "sample", "clip.mp4"])
            .expect("arguments should parse");
        assert_eq!(cli.global.max_retries, 2);
    }

    #[test]
    fn default_output_that_is_the_input_is_refused() {
        let error = resolve_output_path(Path::new("notes.csv"), None)
            .expect_err("writing over the input must be refused");
        assert!(error.contains("overwrite"), "unexpected message: {error}");
    }

    #[test]
    fn explicit_output_that_is_the_input_is_refused() {
        let result = resolve_output_path(Path::new("clip.mp4"), Some(PathBuf::from("clip.mp4")));
        assert!(result.is_err());
    }

    #[test]
    fn output_aliasing_the_input_through_another_path_is_refused() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let input = directory.path().join("clip.mp4");
        std::fs::write(&input, b"video").expect("Failed to write input");
        let alias = directory.path().join(".").join("clip.mp4");

        assert!(resolve_output_path(&input, Some(alias)).is_err());
        assert_eq!(std::fs::read(&input).expect("input must survive"), b"video");
    }

    #[test]
    fn distinct_output_is_accepted() {
        assert_eq!(
            resolve_output_path(Path::new("clip.mp4"), None).expect("distinct path"),
            Path::new("clip.csv")
        );
    }

    #[test]
    fn zero_limit_decodes_nothing() {
        let mut source = counting_source(5);
        let timestamps = collect_sampled(&mut source, Some(0), |_| Ok(())).expect("collect");

        assert!(timestamps.is_empty());
        assert_eq!(source.frames_decoded(), 0);
    }

    #[test]
    fn limit_stops_before_pulling_another_frame() {
        let mut source = counting_source(5);
        let timestamps = collect_sampled(&mut source, Some(2), |_| Ok(())).expect("collect");

        assert_eq!(timestamps, vec![0, 40]);
        assert_eq!(source.frames_decoded(), 2);
    }

    #[test]
    fn no_limit_drains_the_source() {
        let mut source = counting_source(3);
        let mut seen = 0;
        let timestamps = collect_sampled(&mut source, None, |_| {
            seen += 1;
            Ok(())
        })
        .expect("collect");

        assert_eq!(timestamps, vec![0, 40, 80]);
        assert_eq!(seen, 3);
        assert!(source.is_exhausted());
    }
}
