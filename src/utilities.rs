//! Internal utility functions.
//!
//! Helpers for pixel-data copying and timestamp conversion shared by the
//! FFmpeg capture backend.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy plane 0 of an FFmpeg video frame into `buffer`, stripping row
/// padding.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp).
/// The buffer is cleared and refilled so its allocation is reused across
/// frames.
pub(crate) fn copy_frame_into(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    buffer: &mut Vec<u8>,
) {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    buffer.clear();
    if stride == row_bytes {
        buffer.extend_from_slice(&data[..row_bytes * (height as usize)]);
    } else {
        buffer.reserve(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
    }
}

/// Rescale a PTS value from stream time base to whole milliseconds.
pub(crate) fn pts_to_milliseconds(pts: i64, time_base: Rational) -> i64 {
    let denominator = i64::from(time_base.denominator());
    if denominator == 0 {
        return 0;
    }
    let numerator = i64::from(time_base.numerator());
    ((pts as i128 * numerator as i128 * 1000) / denominator as i128) as i64
}

/// Nominal frame spacing in milliseconds for a stream frame rate, or `None`
/// when the rate is unknown.
pub(crate) fn frame_duration_ms(frame_rate: Rational) -> Option<i64> {
    let numerator = i64::from(frame_rate.numerator());
    let denominator = i64::from(frame_rate.denominator());
    if numerator <= 0 || denominator <= 0 {
        return None;
    }
    Some((denominator * 1000 / numerator).max(1))
}

/// Position for a decoded frame that carries no timestamp.
///
/// The first such frame sits at 0. Later ones advance from the previous
/// position by one nominal frame, or repeat it if the frame rate is unknown.
pub(crate) fn position_without_pts(previous_ms: Option<i64>, frame_duration_ms: Option<i64>) -> i64 {
    match previous_ms {
        None => 0,
        Some(previous_ms) => previous_ms + frame_duration_ms.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_in_millisecond_time_base() {
        assert_eq!(pts_to_milliseconds(1234, Rational::new(1, 1000)), 1234);
    }

    #[test]
    fn pts_in_mpeg_time_base() {
        // 90 kHz clock, 40 ms per frame at 25 fps.
        assert_eq!(pts_to_milliseconds(3600, Rational::new(1, 90_000)), 40);
    }

    #[test]
    fn pts_with_zero_denominator() {
        assert_eq!(pts_to_milliseconds(100, Rational::new(1, 0)), 0);
    }

    #[test]
    fn frame_duration_from_rate() {
        assert_eq!(frame_duration_ms(Rational::new(25, 1)), Some(40));
        assert_eq!(frame_duration_ms(Rational::new(30000, 1001)), Some(33));
        assert_eq!(frame_duration_ms(Rational::new(0, 1)), None);
        assert_eq!(frame_duration_ms(Rational::new(25, 0)), None);
    }

    #[test]
    fn missing_pts_advances_from_previous_frame() {
        assert_eq!(position_without_pts(None, Some(40)), 0);
        assert_eq!(position_without_pts(Some(0), Some(40)), 40);
        assert_eq!(position_without_pts(Some(120), Some(40)), 160);
    }

    #[test]
    fn missing_pts_without_rate_holds_position() {
        assert_eq!(position_without_pts(Some(80), None), 80);
    }
}
