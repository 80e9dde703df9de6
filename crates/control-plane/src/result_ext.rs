//! Logging helpers for fallible calls whose error is not propagated.

use std::fmt::Display;
use tracing::error;

/// Log an `Err` with its call site and pass the result through unchanged.
///
/// ```ignore
/// let _ = repository.update(&execution).await.log("persisting step start");
/// ```
pub trait ResultExt<T, E> {
    /// Log at `error` level.
    fn log<S: ToString>(self, context: S) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let location = std::panic::Location::caller();
            error!(
                target: "pipeline_control_plane",
                error = %e,
                location = %format!("{}:{}", location.file(), location.line()),
                context = %context.to_string(),
                "Operation failed"
            );
        }
        self
    }
}
