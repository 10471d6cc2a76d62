//! Rate-based frame sampling.
//!
//! [`SamplingGate`] decides which decoded frames to keep when a caller asks
//! for fewer frames per second than the video provides. A rate of `0`
//! disables the gate and every frame is kept.
//!
//! # Example
//!
//! ```
//! use frame_sampler::SamplingGate;
//!
//! // 25 fps input sampled down to 10 fps.
//! let mut gate = SamplingGate::new(10)?;
//! let kept: Vec<i64> = (0..10)
//!     .map(|index| index * 40)
//!     .filter(|&timestamp_ms| gate.accept(timestamp_ms))
//!     .collect();
//! assert_eq!(kept, vec![0, 120, 240, 360]);
//! # Ok::<(), frame_sampler::SamplerError>(())
//! ```

use crate::error::SamplerError;

/// Accept/reject filter enforcing a minimum spacing between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingGate {
    sampling_rate_hz: u32,
    last_accepted_timestamp_ms: i64,
}

impl SamplingGate {
    /// Create a gate retaining at most `sampling_rate_hz` frames per second.
    ///
    /// The last-accepted timestamp starts at one interval before zero (or
    /// `-1` when sampling is disabled) so the first frame always passes.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidArgument`] if `sampling_rate_hz` is
    /// negative or does not fit in a `u32`.
    pub fn new(sampling_rate_hz: i64) -> Result<Self, SamplerError> {
        if sampling_rate_hz < 0 {
            return Err(SamplerError::InvalidArgument(format!(
                "Sampling rate must not be negative (got {sampling_rate_hz})"
            )));
        }
        let sampling_rate_hz = u32::try_from(sampling_rate_hz).map_err(|_| {
            SamplerError::InvalidArgument(format!("Sampling rate {sampling_rate_hz} is too large"))
        })?;

        let last_accepted_timestamp_ms = if sampling_rate_hz == 0 {
            -1
        } else {
            -(1000 / i64::from(sampling_rate_hz))
        };

        Ok(Self {
            sampling_rate_hz,
            last_accepted_timestamp_ms,
        })
    }

    pub fn sampling_rate_hz(&self) -> u32 {
        self.sampling_rate_hz
    }

    /// Minimum spacing between accepted frames, or `None` when disabled.
    pub fn min_interval_ms(&self) -> Option<i64> {
        (self.sampling_rate_hz > 0).then(|| 1000 / i64::from(self.sampling_rate_hz))
    }

    pub fn last_accepted_timestamp_ms(&self) -> i64 {
        self.last_accepted_timestamp_ms
    }

    /// Decide whether a frame at `timestamp_ms` is kept, and record it if so.
    ///
    /// A frame is rejected only when sampling is enabled, its timestamp is
    /// positive, and less than one interval has elapsed since the last kept
    /// frame.
    pub fn accept(&mut self, timestamp_ms: i64) -> bool {
        let too_close = self.min_interval_ms().is_some_and(|interval| {
            timestamp_ms > 0 && timestamp_ms - self.last_accepted_timestamp_ms < interval
        });
        if too_close {
            return false;
        }

        self.last_accepted_timestamp_ms = timestamp_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_rate_is_rejected() {
        assert!(matches!(
            SamplingGate::new(-1),
            Err(SamplerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn oversized_rate_is_rejected() {
        assert!(matches!(
            SamplingGate::new(i64::from(u32::MAX) + 1),
            Err(SamplerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn sentinel_seeding() {
        assert_eq!(SamplingGate::new(0).unwrap().last_accepted_timestamp_ms(), -1);
        assert_eq!(SamplingGate::new(10).unwrap().last_accepted_timestamp_ms(), -100);
        assert_eq!(SamplingGate::new(3).unwrap().last_accepted_timestamp_ms(), -333);
    }

    #[test]
    fn disabled_gate_accepts_everything() {
        let mut gate = SamplingGate::new(0).unwrap();
        assert_eq!(gate.min_interval_ms(), None);
        for timestamp_ms in [0, 1, 2, 2, 3] {
            assert!(gate.accept(timestamp_ms));
        }
    }

    #[test]
    fn first_frame_always_accepted() {
        for rate in [1, 5, 30, 1000] {
            let mut gate = SamplingGate::new(rate).unwrap();
            assert!(gate.accept(1), "rate {rate}");
        }
    }

    #[test]
    fn non_positive_timestamps_bypass_spacing() {
        let mut gate = SamplingGate::new(10).unwrap();
        assert!(gate.accept(0));
        assert!(gate.accept(0));
    }

    #[test]
    fn rate_above_one_khz_never_throttles() {
        let mut gate = SamplingGate::new(2000).unwrap();
        assert_eq!(gate.min_interval_ms(), Some(0));
        assert!(gate.accept(1));
        assert!(gate.accept(2));
    }

    #[test]
    fn thirty_fps_to_one_hz() {
        let mut gate = SamplingGate::new(1).unwrap();
        let kept: Vec<i64> = (0..90)
            .map(|index| index * 1000 / 30)
            .filter(|&timestamp_ms| gate.accept(timestamp_ms))
            .collect();
        assert_eq!(kept, vec![0, 1000, 2000]);
    }
}
