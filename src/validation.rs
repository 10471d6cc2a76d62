//! Input path validation.
//!
//! Only a fixed set of container formats is accepted. The check runs on the
//! path alone, before any decoder is opened, so an unsupported file never
//! reaches FFmpeg.
//!
//! # Example
//!
//! ```
//! use frame_sampler::validation::is_supported_extension;
//!
//! assert!(is_supported_extension("clip.mp4"));
//! assert!(!is_supported_extension("notes.txt"));
//! // The extension token is matched case-sensitively.
//! assert!(!is_supported_extension("CLIP.MP4"));
//! ```

use std::path::Path;

use crate::error::SamplerError;

/// Container extensions accepted by [`VideoSource`](crate::VideoSource),
/// without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["avi", "mov", "flv", "webm", "wmv", "mp4"];

/// Returns `true` if the path's extension is in [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| SUPPORTED_EXTENSIONS.contains(&extension))
}

/// Check the path's extension against the allow-list.
///
/// # Errors
///
/// Returns [`SamplerError::UnsupportedFormat`] carrying the rejected
/// extension (with its leading dot, or empty when the path has none).
pub fn validate_extension(path: &Path) -> Result<(), SamplerError> {
    if is_supported_extension(path) {
        return Ok(());
    }

    let extension = path
        .extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default();

    Err(SamplerError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension,
    })
}
