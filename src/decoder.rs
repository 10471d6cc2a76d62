//! Unambiguous frame decoding.
//!
//! [`FrameDecoder`] is the interface [`VideoSource`](crate::VideoSource)
//! consumes: each call either yields a decoded frame with its timestamp or
//! reports that no more data is available. [`RetryingDecoder`] adapts a
//! [`RawCapture`] to that interface.
//!
//! A raw capture reports a failed grab, or a stale timestamp, both for a
//! single undecodable frame and for the end of the file. The adapter retries
//! a failed fetch a bounded number of times. A retry that "succeeds" without
//! moving the stream position forward is a replay of an earlier frame and is
//! reported as [`DecodeOutcome::NoMoreData`], so a caller never loops forever
//! or sees a duplicate timestamp at the end of a stream.

use crate::capture::RawCapture;
use crate::frame::{ColorFormat, Frame};

/// Number of extra fetch attempts [`RetryingDecoder`] makes after a failure.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Result of one [`FrameDecoder::decode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A frame was decoded; it is available through [`FrameDecoder::frame`].
    Decoded {
        /// Presentation time of the decoded frame in milliseconds.
        timestamp_ms: i64,
    },
    /// The stream is exhausted or cannot be decoded any further.
    NoMoreData,
}

/// A source of decoded frames with two well-defined outcomes.
pub trait FrameDecoder {
    /// Decode the next frame.
    fn decode(&mut self) -> DecodeOutcome;

    /// The most recently decoded frame.
    ///
    /// Only meaningful after [`decode`](FrameDecoder::decode) returned
    /// [`DecodeOutcome::Decoded`]; the buffer is overwritten by the next
    /// decode.
    fn frame(&self) -> &Frame;
}

/// [`FrameDecoder`] adapter over a [`RawCapture`] with bounded retries.
pub struct RetryingDecoder<C> {
    capture: C,
    frame: Frame,
    max_retries: u32,
}

impl<C: RawCapture> RetryingDecoder<C> {
    /// Wrap `capture` with the default retry bound.
    pub fn new(capture: C, color_format: ColorFormat) -> Self {
        Self::with_max_retries(capture, color_format, DEFAULT_MAX_RETRIES)
    }

    /// Wrap `capture`, retrying a failed fetch up to `max_retries` times.
    pub fn with_max_retries(capture: C, color_format: ColorFormat, max_retries: u32) -> Self {
        Self {
            capture,
            frame: Frame::empty(color_format),
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The wrapped capture.
    pub fn capture(&self) -> &C {
        &self.capture
    }

    fn fetch(&mut self) -> bool {
        self.capture.grab() && self.capture.retrieve(&mut self.frame)
    }
}

impl<C: RawCapture> FrameDecoder for RetryingDecoder<C> {
    fn decode(&mut self) -> DecodeOutcome {
        let previous_ms = self.capture.position_ms();
        let mut fetched = self.fetch();

        let mut retries = 0;
        while !fetched && retries < self.max_retries {
            retries += 1;
            fetched = self.fetch();
        }

        if !fetched {
            return DecodeOutcome::NoMoreData;
        }

        let timestamp_ms = self.capture.position_ms();
        if retries > 0 && timestamp_ms <= previous_ms {
            log::debug!(
                "Retry {retries} decoded a stale frame ({timestamp_ms} ms <= {previous_ms} ms), treating as end of stream"
            );
            return DecodeOutcome::NoMoreData;
        }

        self.frame.set_timestamp_ms(timestamp_ms);
        DecodeOutcome::Decoded { timestamp_ms }
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// One scripted grab: `Some(ts)` succeeds and moves the position to
    /// `ts`, `None` fails and leaves the position untouched.
    struct ScriptedCapture {
        script: VecDeque<Option<i64>>,
        position_ms: i64,
        grabbed: bool,
        grabs: usize,
    }

    impl ScriptedCapture {
        fn new(script: &[Option<i64>]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                position_ms: 0,
                grabbed: false,
                grabs: 0,
            }
        }
    }

    impl RawCapture for ScriptedCapture {
        fn grab(&mut self) -> bool {
            self.grabs += 1;
            self.grabbed = match self.script.pop_front().flatten() {
                Some(timestamp_ms) => {
                    self.position_ms = timestamp_ms;
                    true
                }
                None => false,
            };
            self.grabbed
        }

        fn retrieve(&mut self, frame: &mut Frame) -> bool {
            if self.grabbed {
                frame.data = vec![0; 3];
                frame.width = 1;
                frame.height = 1;
            }
            self.grabbed
        }

        fn position_ms(&self) -> i64 {
            self.position_ms
        }
    }

    fn decoder(script: &[Option<i64>]) -> RetryingDecoder<ScriptedCapture> {
        RetryingDecoder::new(ScriptedCapture::new(script), ColorFormat::Bgr)
    }

    #[test]
    fn decodes_in_order() {
        let mut decoder = decoder(&[Some(0), Some(40), Some(80)]);
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 0 });
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 40 });
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 80 });
        assert_eq!(decoder.frame().timestamp_ms(), 80);
        assert_eq!(decoder.decode(), DecodeOutcome::NoMoreData);
    }

    #[test]
    fn transient_failure_is_retried() {
        let mut decoder = decoder(&[Some(40), None, Some(80)]);
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 40 });
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 80 });
    }

    #[test]
    fn stale_retry_is_end_of_stream() {
        let mut decoder = decoder(&[Some(40), None, Some(40)]);
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 40 });
        assert_eq!(decoder.decode(), DecodeOutcome::NoMoreData);
    }

    #[test]
    fn gives_up_after_retry_bound() {
        let mut decoder = decoder(&[Some(40), None, None, None, Some(200)]);
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 40 });
        assert_eq!(decoder.decode(), DecodeOutcome::NoMoreData);
        // One attempt plus two retries.
        assert_eq!(decoder.capture().grabs, 4);
    }

    #[test]
    fn custom_retry_bound() {
        let capture = ScriptedCapture::new(&[None, None, None, Some(120)]);
        let mut decoder = RetryingDecoder::with_max_retries(capture, ColorFormat::Bgr, 3);
        assert_eq!(decoder.max_retries(), 3);
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 120 });
    }

    #[test]
    fn zero_retries_fails_immediately() {
        let capture = ScriptedCapture::new(&[None, Some(40)]);
        let mut decoder = RetryingDecoder::with_max_retries(capture, ColorFormat::Bgr, 0);
        assert_eq!(decoder.decode(), DecodeOutcome::NoMoreData);
        assert_eq!(decoder.capture().grabs, 1);
    }

    #[test]
    fn first_attempt_success_skips_monotonic_check() {
        // Without a retry the timestamp is passed through, even if it does
        // not advance.
        let mut decoder = decoder(&[Some(40), Some(40)]);
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 40 });
        assert_eq!(decoder.decode(), DecodeOutcome::Decoded { timestamp_ms: 40 });
    }
}
