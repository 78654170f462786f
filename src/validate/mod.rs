//! Tile integrity validation.
//!
//! - [`Verdict`]: pass/fail plus the first fault's message
//! - [`ChunkValidator`]: verifies one compressed chunk
//! - [`ValidationEngine`]: walks a container and stops at the first fault
//!
//! [`check_file`] is the blocking entry point; [`check_slide`] is the same
//! thing for callers already running inside a tokio runtime.

mod chunk;
mod engine;
mod verdict;

use std::path::Path;

pub use chunk::ChunkValidator;
pub use engine::{DecodeStrategy, ValidateOptions, ValidationEngine, OPEN_FAILURE_MESSAGE};
pub use verdict::{FaultKind, TileLocation, Verdict};

/// Validate `path` with the given options.
pub async fn check_slide(path: impl AsRef<Path>, options: &ValidateOptions) -> Verdict {
    ValidationEngine::new(options.clone()).check_path(path).await
}

/// Blocking form of [`check_slide`].
///
/// Runs on a private current-thread runtime, so it must not be called from
/// inside another tokio runtime.
pub fn check_file_with(path: impl AsRef<Path>, options: &ValidateOptions) -> Verdict {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(check_slide(path, options)),
        Err(e) => Verdict::invalid(
            FaultKind::OpenFailure,
            format!("Failed to start I/O runtime: {}", e),
        ),
    }
}

/// Check a slide for corrupt JPEG tiles.
///
/// Returns `(is_valid, error_message)`; the message is empty exactly when
/// the file is valid. With `level_zero_only` only the first directory (the
/// full-resolution level) is checked.
pub fn check_file(path: impl AsRef<Path>, level_zero_only: bool) -> (bool, String) {
    let options = ValidateOptions {
        level_zero_only,
        ..ValidateOptions::default()
    };
    check_file_with(path, &options).into_tuple()
}
