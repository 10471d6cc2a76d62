//! Per-frame result recording.
//!
//! [`ResultsRecorder`] is a [`DetectionListener`] that writes one CSV row per
//! detected face (or a `nan` row for a frame without faces) and keeps the
//! per-pass tallies printed at the end of each pass.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::detector::{DetectionListener, DetectionResults};
use crate::error::SamplerError;

const CSV_HEADER: &str = "TimeStamp,faceId,confidence,upperLeftX,upperLeftY,lowerRightX,lowerRightY";

/// Frame counts for one pass over a video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassTally {
    /// Frames the detector reported results for.
    pub frames_processed: u64,
    /// Frames with at least one face.
    pub frames_with_faces: u64,
}

impl PassTally {
    /// Share of processed frames that contained a face, in percent.
    ///
    /// Returns `0.0` when no frames were processed.
    pub fn faces_percent(&self) -> f64 {
        if self.frames_processed == 0 {
            return 0.0;
        }
        self.frames_with_faces as f64 / self.frames_processed as f64 * 100.0
    }
}

struct RecorderState {
    writer: Box<dyn Write + Send>,
    tally: PassTally,
    write_error: Option<std::io::Error>,
}

/// CSV-writing [`DetectionListener`].
///
/// Timestamps are written in seconds with two decimals. Write failures
/// inside the callback cannot be returned to the detector, so the first one
/// is kept and surfaced by [`flush`](ResultsRecorder::flush).
pub struct ResultsRecorder {
    state: Mutex<RecorderState>,
}

impl ResultsRecorder {
    /// Record into any writer. The CSV header is written immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::IoError`] if the header cannot be written.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Result<Self, SamplerError> {
        let mut writer: Box<dyn Write + Send> = Box::new(writer);
        writeln!(writer, "{CSV_HEADER}")?;
        Ok(Self {
            state: Mutex::new(RecorderState {
                writer,
                tally: PassTally::default(),
                write_error: None,
            }),
        })
    }

    /// Create (or truncate) a CSV file at `path` and record into it.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::IoError`] if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SamplerError> {
        let file = File::create(path.as_ref())?;
        log::debug!("Writing results to {}", path.as_ref().display());
        Self::new(BufWriter::new(file))
    }

    /// Tallies accumulated since the last [`reset`](ResultsRecorder::reset).
    pub fn tally(&self) -> PassTally {
        self.lock().tally
    }

    /// Clear the tallies at the end of a pass. Rows already written stay.
    pub fn reset(&self) {
        self.lock().tally = PassTally::default();
    }

    /// Flush buffered rows.
    ///
    /// # Errors
    ///
    /// Returns the first write error seen by the listener, or the flush
    /// error itself.
    pub fn flush(&self) -> Result<(), SamplerError> {
        let mut state = self.lock();
        if let Some(error) = state.write_error.take() {
            return Err(error.into());
        }
        state.writer.flush()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        // Tally updates are single assignments; a poisoned lock is still consistent.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn write_rows(writer: &mut dyn Write, results: &DetectionResults) -> std::io::Result<()> {
    let seconds = results.timestamp_ms as f64 / 1000.0;

    if results.faces.is_empty() {
        return writeln!(writer, "{seconds:.2},nan,nan,nan,nan,nan,nan");
    }

    for face in &results.faces {
        let bounds = &face.bounding_box;
        writeln!(
            writer,
            "{seconds:.2},{},{:.2},{:.0},{:.0},{:.0},{:.0}",
            face.id,
            face.confidence,
            bounds.x,
            bounds.y,
            bounds.x + bounds.width,
            bounds.y + bounds.height,
        )?;
    }
    Ok(())
}

impl DetectionListener for ResultsRecorder {
    fn on_results(&self, results: &DetectionResults) {
        let mut state = self.lock();
        state.tally.frames_processed += 1;
        if !results.faces.is_empty() {
            state.tally.frames_with_faces += 1;
        }

        if state.write_error.is_some() {
            return;
        }
        if let Err(error) = write_rows(&mut state.writer, results) {
            log::warn!("Failed to write results row: {error}");
            state.write_error = Some(error);
        }
    }
}
