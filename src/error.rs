//! Error types for the `frame-sampler` crate.
//!
//! This module defines [`SamplerError`], the unified error type returned by
//! all fallible operations in the crate. Running out of frames is **not** an
//! error: [`VideoSource::next_frame`](crate::VideoSource::next_frame) signals
//! it by returning `None`.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `frame-sampler` operations.
///
/// Construction-time failures ([`InvalidArgument`](SamplerError::InvalidArgument),
/// [`UnsupportedFormat`](SamplerError::UnsupportedFormat) and
/// [`OpenFailure`](SamplerError::OpenFailure)) abort the current playback
/// attempt. Variants carry enough context to diagnose the problem without
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SamplerError {
    /// An argument was out of its allowed range (e.g. a negative sampling
    /// rate).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The file extension is not in the container allow-list.
    #[error("Unsupported file extension {extension:?} for {path}")]
    UnsupportedFormat {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// The rejected extension, with a leading dot (empty if none).
        extension: String,
    },

    /// The video decoder could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    OpenFailure {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The frame detector rejected a call or failed to process a frame.
    #[error("Detector error: {0}")]
    Detector(String),
}

impl From<FfmpegError> for SamplerError {
    fn from(error: FfmpegError) -> Self {
        SamplerError::FfmpegError(error.to_string())
    }
}
