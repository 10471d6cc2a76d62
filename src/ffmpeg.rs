//! FFmpeg console log level.
//!
//! FFmpeg prints its own warnings to stderr (corrupt packets, missing
//! timestamps), independently of the Rust-side [`log`] output of this crate.
//! Those messages are frequent on damaged files, exactly the files the
//! retrying decoder is built to survive, so callers usually want them
//! quieter.
//!
//! # Example
//!
//! ```no_run
//! use frame_sampler::FfmpegLogLevel;
//!
//! frame_sampler::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! let level: FfmpegLogLevel = "quiet".parse().unwrap();
//! frame_sampler::set_ffmpeg_log_level(level);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

use crate::error::SamplerError;

/// FFmpeg internal log verbosity, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    Quiet,
    Panic,
    Fatal,
    Error,
    /// FFmpeg's default.
    Warning,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl FfmpegLogLevel {
    const NAMES: [(&'static str, FfmpegLogLevel); 9] = [
        ("quiet", FfmpegLogLevel::Quiet),
        ("panic", FfmpegLogLevel::Panic),
        ("fatal", FfmpegLogLevel::Fatal),
        ("error", FfmpegLogLevel::Error),
        ("warning", FfmpegLogLevel::Warning),
        ("info", FfmpegLogLevel::Info),
        ("verbose", FfmpegLogLevel::Verbose),
        ("debug", FfmpegLogLevel::Debug),
        ("trace", FfmpegLogLevel::Trace),
    ];

    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic => FfmpegLogLevel::Panic,
            Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose => FfmpegLogLevel::Verbose,
            Level::Debug => FfmpegLogLevel::Debug,
            Level::Trace => FfmpegLogLevel::Trace,
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = Self::NAMES
            .iter()
            .find(|(_, level)| level == self)
            .map_or("unknown", |(name, _)| *name);
        f.write_str(name)
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = SamplerError;

    /// Parse a level name, case-insensitively. `warn` is accepted as an
    /// alias for `warning`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        let value = if value == "warn" { "warning" } else { value.as_str() };
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, level)| *level)
            .ok_or_else(|| SamplerError::InvalidArgument(format!("Unknown FFmpeg log level: {value}")))
    }
}

/// Set FFmpeg's console verbosity. Does not affect Rust-side `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Current FFmpeg console verbosity, or `None` if FFmpeg reports a level
/// with no matching variant.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from_ffmpeg_level)
}
