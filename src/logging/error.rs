//! Errors raised while the file sink touches the filesystem
//!
//! These never leave the worker thread. They exist so that every failure
//! reported through the fallback channel names the operation and the path.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A filesystem operation performed by the file sink failed
#[derive(Debug, Error)]
pub enum FileSinkError {
    #[error("failed to create log directory [{}]", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create/open log file [{}]", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to log file [{}]", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to close log file [{}]", .path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to list log directory [{}]", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to delete old log file [{}]", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{name} must be greater than zero")]
    InvalidOption { name: &'static str },
}

impl FileSinkError {
    /// Render the error with its io cause on one line
    pub fn report(&self) -> String {
        match std::error::Error::source(self) {
            Some(source) => format!("{}: {}", self, source),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_without_source() {
        let err = FileSinkError::InvalidOption {
            name: "retention_file_count",
        };
        assert_eq!(err.report(), "retention_file_count must be greater than zero");
    }

    #[test]
    fn test_report_includes_source() {
        let err = FileSinkError::Write {
            path: PathBuf::from("/var/log/daylog/2026-10-16_out.log"),
            source: io::Error::new(io::ErrorKind::Other, "disk on fire"),
        };
        let report = err.report();
        assert!(report.starts_with("failed to write to log file [/var/log/daylog/2026-10-16_out.log]"));
        assert!(report.ends_with(": disk on fire"));
    }
}
