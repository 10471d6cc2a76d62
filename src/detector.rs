//! Frame detector interface.
//!
//! A [`FrameDetector`] consumes accepted frames and reports per-frame
//! results to a registered [`DetectionListener`]. The analysis itself is
//! opaque to this crate; [`StubDetector`] is a dependency-free backend for
//! wiring tests and demos.
//!
//! The detector lifecycle is `configure` → `start` → `process`* → `stop`,
//! with `reset` between passes. [`DetectorSession`] ties `stop` to scope so
//! a detector is never left running when a playback attempt fails midway.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::SamplerError;
use crate::frame::Frame;

/// Analysis features a detector can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Emotions,
    Expressions,
    Identity,
    Appearances,
}

impl Feature {
    /// Every feature, in a stable order.
    pub const ALL: [Feature; 4] = [
        Feature::Emotions,
        Feature::Expressions,
        Feature::Identity,
        Feature::Appearances,
    ];
}

impl Display for Feature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Feature::Emotions => "emotions",
            Feature::Expressions => "expressions",
            Feature::Identity => "identity",
            Feature::Appearances => "appearances",
        };
        f.write_str(name)
    }
}

/// Axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One face found in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Tracking id, stable across frames within a pass.
    pub id: u32,
    /// Detection confidence in `0.0..=1.0`.
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

/// Results for a single processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResults {
    /// Timestamp of the processed frame in milliseconds.
    pub timestamp_ms: i64,
    pub width: u32,
    pub height: u32,
    /// Faces found in the frame; empty when none were detected.
    pub faces: Vec<Face>,
}

/// Receives detection results as frames are processed.
///
/// Listeners are shared with the detector through an [`Arc`], so they must
/// be [`Send`] and [`Sync`] and use interior mutability for any state.
pub trait DetectionListener: Send + Sync {
    /// Called once per processed frame.
    fn on_results(&self, results: &DetectionResults);
}

/// An opaque frame-analysis service.
pub trait FrameDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Enable a set of features. Must be called before [`start`](FrameDetector::start).
    fn configure(&mut self, features: &[Feature]) -> Result<(), SamplerError>;

    /// Register the listener that receives results.
    fn set_listener(&mut self, listener: Arc<dyn DetectionListener>);

    fn start(&mut self) -> Result<(), SamplerError>;

    /// Analyse one frame. Results are delivered to the listener.
    ///
    /// Implementations must treat the frame as borrowed for the duration of
    /// the call only.
    fn process(&mut self, frame: &Frame) -> Result<(), SamplerError>;

    fn stop(&mut self) -> Result<(), SamplerError>;

    /// Clear per-pass state (e.g. tracking ids) while staying started.
    fn reset(&mut self) -> Result<(), SamplerError>;

    /// Returns `true` between a successful `start` and `stop`.
    fn is_running(&self) -> bool;
}

/// Scope guard for a started detector.
///
/// Created with [`DetectorSession::start`]. If the session is dropped
/// without [`finish`](DetectorSession::finish), for instance because a
/// source failed to open and `?` returned early, the detector is stopped in
/// `Drop` and any stop error is logged.
pub struct DetectorSession<'a> {
    detector: &'a mut dyn FrameDetector,
    finished: bool,
}

impl<'a> DetectorSession<'a> {
    /// Start `detector` and return a guard that stops it.
    ///
    /// # Errors
    ///
    /// Returns whatever [`FrameDetector::start`] returns; the detector is
    /// not stopped in that case since it never started.
    pub fn start(detector: &'a mut dyn FrameDetector) -> Result<Self, SamplerError> {
        detector.start()?;
        log::debug!("Detector '{}' started", detector.name());
        Ok(Self {
            detector,
            finished: false,
        })
    }

    pub fn process(&mut self, frame: &Frame) -> Result<(), SamplerError> {
        self.detector.process(frame)
    }

    pub fn reset(&mut self) -> Result<(), SamplerError> {
        self.detector.reset()
    }

    /// Stop the detector and consume the guard.
    pub fn finish(mut self) -> Result<(), SamplerError> {
        self.finished = true;
        log::debug!("Detector '{}' stopping", self.detector.name());
        self.detector.stop()
    }
}

impl Drop for DetectorSession<'_> {
    fn drop(&mut self) {
        if self.finished || !self.detector.is_running() {
            return;
        }
        log::debug!("Detector '{}' stopped on early exit", self.detector.name());
        if let Err(error) = self.detector.stop() {
            log::warn!("Failed to stop detector '{}': {error}", self.detector.name());
        }
    }
}

/// Intensity shift (0-255 scale) above which [`StubDetector`] reports a face.
const STUB_INTENSITY_THRESHOLD: f64 = 4.0;

/// A lightweight detector backend for demos and tests.
///
/// Reports one whole-frame "face" whenever the mean pixel intensity moves
/// by more than a fixed threshold relative to the previous frame, capped at
/// `max_faces`. It exercises the full lifecycle contract: processing before
/// `start` or after `stop` is an error.
#[derive(Default)]
pub struct StubDetector {
    max_faces: u32,
    features: Vec<Feature>,
    listener: Option<Arc<dyn DetectionListener>>,
    running: bool,
    last_mean: Option<f64>,
    next_id: u32,
}

impl StubDetector {
    pub fn new(max_faces: u32) -> Self {
        Self {
            max_faces,
            ..Self::default()
        }
    }

    /// Features enabled by the last [`configure`](FrameDetector::configure).
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    fn mean_intensity(frame: &Frame) -> f64 {
        if frame.data().is_empty() {
            return 0.0;
        }
        let sum: u64 = frame.data().iter().map(|&value| u64::from(value)).sum();
        sum as f64 / frame.data().len() as f64
    }
}

impl FrameDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn configure(&mut self, features: &[Feature]) -> Result<(), SamplerError> {
        if self.running {
            return Err(SamplerError::Detector(
                "cannot configure a running detector".to_string(),
            ));
        }
        self.features = features.to_vec();
        Ok(())
    }

    fn set_listener(&mut self, listener: Arc<dyn DetectionListener>) {
        self.listener = Some(listener);
    }

    fn start(&mut self) -> Result<(), SamplerError> {
        if self.running {
            return Err(SamplerError::Detector("detector already started".to_string()));
        }
        self.running = true;
        self.last_mean = None;
        self.next_id = 0;
        Ok(())
    }

    fn process(&mut self, frame: &Frame) -> Result<(), SamplerError> {
        if !self.running {
            return Err(SamplerError::Detector(
                "process called before start".to_string(),
            ));
        }

        let mean = Self::mean_intensity(frame);
        let changed = self
            .last_mean
            .is_some_and(|previous| (mean - previous).abs() > STUB_INTENSITY_THRESHOLD);
        self.last_mean = Some(mean);

        let mut faces = Vec::new();
        if changed && self.max_faces > 0 {
            faces.push(Face {
                id: self.next_id,
                confidence: ((mean / 255.0) as f32).clamp(0.0, 1.0),
                bounding_box: BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: frame.width() as f32,
                    height: frame.height() as f32,
                },
            });
            self.next_id += 1;
        }

        if let Some(listener) = &self.listener {
            listener.on_results(&DetectionResults {
                timestamp_ms: frame.timestamp_ms(),
                width: frame.width(),
                height: frame.height(),
                faces,
            });
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SamplerError> {
        if !self.running {
            return Err(SamplerError::Detector("detector is not running".to_string()));
        }
        self.running = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SamplerError> {
        self.last_mean = None;
        self.next_id = 0;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::frame::ColorFormat;

    #[derive(Default)]
    struct Collect(Mutex<Vec<DetectionResults>>);

    impl DetectionListener for Collect {
        fn on_results(&self, results: &DetectionResults) {
            self.0.lock().unwrap().push(results.clone());
        }
    }

    fn solid(value: u8, timestamp_ms: i64) -> Frame {
        Frame::new(vec![value; 12], 2, 2, ColorFormat::Bgr, timestamp_ms).unwrap()
    }

    #[test]
    fn process_requires_start() {
        let mut detector = StubDetector::new(1);
        assert!(matches!(
            detector.process(&solid(0, 0)),
            Err(SamplerError::Detector(_))
        ));
    }

    #[test]
    fn reports_face_on_intensity_change() {
        let listener = Arc::new(Collect::default());
        let mut detector = StubDetector::new(1);
        detector.set_listener(listener.clone());
        detector.start().unwrap();

        detector.process(&solid(10, 0)).unwrap();
        detector.process(&solid(10, 40)).unwrap();
        detector.process(&solid(200, 80)).unwrap();

        let results = listener.0.lock().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].faces.is_empty());
        assert!(results[1].faces.is_empty());
        assert_eq!(results[2].faces.len(), 1);
        assert_eq!(results[2].timestamp_ms, 80);
        assert_eq!(results[2].faces[0].bounding_box.width, 2.0);
    }

    #[test]
    fn zero_max_faces_reports_nothing() {
        let listener = Arc::new(Collect::default());
        let mut detector = StubDetector::new(0);
        detector.set_listener(listener.clone());
        detector.start().unwrap();
        detector.process(&solid(0, 0)).unwrap();
        detector.process(&solid(255, 40)).unwrap();
        assert!(listener.0.lock().unwrap().iter().all(|r| r.faces.is_empty()));
    }

    #[test]
    fn configure_rejected_while_running() {
        let mut detector = StubDetector::new(1);
        detector.configure(&Feature::ALL).unwrap();
        assert_eq!(detector.features().len(), 4);
        detector.start().unwrap();
        assert!(detector.configure(&[Feature::Emotions]).is_err());
    }

    #[test]
    fn session_stops_detector_on_drop() {
        let mut detector = StubDetector::new(1);
        {
            let _session = DetectorSession::start(&mut detector).unwrap();
        }
        assert!(!detector.is_running());
    }

    #[test]
    fn session_finish_stops_once() {
        let mut detector = StubDetector::new(1);
        let session = DetectorSession::start(&mut detector).unwrap();
        session.finish().unwrap();
        assert!(!detector.is_running());
        // A second start is allowed after a clean stop.
        assert!(detector.start().is_ok());
    }

    #[test]
    fn feature_display_names() {
        let names: Vec<String> = Feature::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["emotions", "expressions", "identity", "appearances"]);
    }
}
