//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for invalid
//! arguments, rejected containers and files FFmpeg cannot open.

use frame_sampler::{ColorFormat, FfmpegCapture, SamplerError, SourceOptions, VideoSource};

#[test]
fn open_nonexistent_file() {
    let result = VideoSource::open("this_file_does_not_exist.mp4", 0);
    assert!(result.is_err());

    let error = result.unwrap_err();
    assert!(matches!(error, SamplerError::OpenFailure { .. }));
    let error_message = error.to_string();
    assert!(
        error_message.contains("Failed to open video file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    // Create a temporary file with garbage content.
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let result = VideoSource::open(&invalid_file_path, 0);
    assert!(
        matches!(result, Err(SamplerError::OpenFailure { .. })),
        "Expected OpenFailure for invalid video file",
    );
}

#[test]
fn capture_open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.webm");
    std::fs::write(&invalid_file_path, [0u8; 64]).expect("Failed to write invalid file");

    let result = FfmpegCapture::open(&invalid_file_path, ColorFormat::Bgr);
    assert!(matches!(result, Err(SamplerError::OpenFailure { .. })));
}

#[test]
fn unsupported_extension_is_checked_before_the_file() {
    // The file does not exist: the extension check must fire first.
    let result = VideoSource::open("missing/movie.mkv", 0);

    match result {
        Err(SamplerError::UnsupportedFormat { path, extension }) => {
            assert_eq!(path, std::path::Path::new("missing/movie.mkv"));
            assert_eq!(extension, ".mkv");
        }
        other => panic!("Expected UnsupportedFormat, got: {other:?}"),
    }
}

#[test]
fn extension_match_is_case_sensitive() {
    let result = VideoSource::open("CLIP.MP4", 0);
    assert!(matches!(result, Err(SamplerError::UnsupportedFormat { .. })));
}

#[test]
fn missing_extension_is_rejected() {
    let result = VideoSource::open("clip", 0);

    match result {
        Err(SamplerError::UnsupportedFormat { extension, .. }) => assert!(extension.is_empty()),
        other => panic!("Expected UnsupportedFormat, got: {other:?}"),
    }
}

#[test]
fn negative_rate_is_checked_before_the_extension() {
    let result = VideoSource::open("notes.txt", -1);
    assert!(matches!(result, Err(SamplerError::InvalidArgument(_))));

    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("negative"),
        "Error message should mention the negative rate: {error_message}",
    );
}

#[test]
fn options_reject_negative_rate() {
    let options = SourceOptions::new().with_sampling_rate(-5);
    let result = VideoSource::open_with_options("clip.mp4", &options);
    assert!(matches!(result, Err(SamplerError::InvalidArgument(_))));
}

#[test]
fn error_display() {
    let error = SamplerError::UnsupportedFormat {
        path: "a/b.txt".into(),
        extension: ".txt".to_string(),
    };
    assert_eq!(error.to_string(), "Unsupported file extension \".txt\" for a/b.txt");

    let error = SamplerError::Detector("not started".to_string());
    assert_eq!(error.to_string(), "Detector error: not started");
}

#[test]
fn io_error_converts() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: SamplerError = io_error.into();
    assert!(matches!(error, SamplerError::IoError(_)));
}
