//! Fallback channel for the logging subsystem's own failures
//!
//! Anything that goes wrong inside a file sink is reported here. A fallback
//! must never route back into a [`FileSink`](super::FileSink), otherwise a
//! broken disk would feed its own error reports into the broken disk.

use tracing::{error, info};

/// Destination for reports about the logging subsystem itself
pub trait Fallback: Send + Sync {
    /// Report normal lifecycle events (file opened, old file deleted)
    fn info(&self, message: &str);

    /// Report a failure
    fn error(&self, message: &str);
}

/// Fallback that emits `tracing` events under the `daylog::fallback` target
///
/// The host decides where those end up; the bundled binary sends them to
/// stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFallback;

impl Fallback for TracingFallback {
    fn info(&self, message: &str) {
        info!(target: "daylog::fallback", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "daylog::fallback", "{}", message);
    }
}
