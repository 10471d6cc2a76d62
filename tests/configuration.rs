//! SourceOptions and PlaybackOptions tests.

use frame_sampler::{ColorFormat, DEFAULT_MAX_RETRIES, Feature, PlaybackOptions, SourceOptions};

// ── SourceOptions builder ────────────────────────────────────────

#[test]
fn source_defaults() {
    let options = SourceOptions::new();
    assert_eq!(options.sampling_rate_hz, 0);
    assert_eq!(options.max_retries, DEFAULT_MAX_RETRIES);
    assert_eq!(options.color_format, ColorFormat::Bgr);
    assert_eq!(options, SourceOptions::default());
}

#[test]
fn source_builder_sets_every_field() {
    let options = SourceOptions::new()
        .with_sampling_rate(12)
        .with_max_retries(0)
        .with_color_format(ColorFormat::Gray);

    assert_eq!(options.sampling_rate_hz, 12);
    assert_eq!(options.max_retries, 0);
    assert_eq!(options.color_format, ColorFormat::Gray);
}

#[test]
fn source_builder_keeps_negative_rate_for_open_to_reject() {
    let options = SourceOptions::new().with_sampling_rate(-3);
    assert_eq!(options.sampling_rate_hz, -3);
}

// ── PlaybackOptions builder ──────────────────────────────────────

#[test]
fn playback_defaults() {
    let options = PlaybackOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("PlaybackOptions"));
    assert!(debug.contains("loop_playback: false"));
    assert!(debug.contains("max_passes: None"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("batch_size: 1"));
    assert_eq!(options.source(), &SourceOptions::default());
}

#[test]
fn playback_enables_every_feature_by_default() {
    let debug = format!("{:?}", PlaybackOptions::new());
    for feature in Feature::ALL {
        assert!(debug.contains(&format!("{feature:?}")), "{feature} missing from {debug}");
    }
}

#[test]
fn playback_with_batch_size_clamps_zero() {
    let options = PlaybackOptions::new().with_batch_size(0);
    let debug = format!("{options:?}");
    // Clamped to 1.
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn playback_with_max_passes_clamps_zero() {
    let options = PlaybackOptions::new().with_loop(true).with_max_passes(0);
    let debug = format!("{options:?}");
    assert!(debug.contains("loop_playback: true"));
    assert!(debug.contains("max_passes: Some(1)"));
}

#[test]
fn playback_with_source_is_visible() {
    let options = PlaybackOptions::new()
        .with_source(SourceOptions::new().with_sampling_rate(4));
    assert_eq!(options.source().sampling_rate_hz, 4);
}
