//! Logging system for daylog
//!
//! Provides a severity-filtering dispatcher, a console sink, and a
//! background file sink that writes one file per calendar day with
//! count-based retention.

mod clock;
mod error;
mod fallback;
mod file_sink;
mod fs;
mod logger;
mod record;
mod retention;
mod sink;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::FileSinkError;
pub use fallback::{Fallback, TracingFallback};
pub use file_sink::{
    FileSink, FileSinkBuilder, FileSinkOptions, SinkState, DEFAULT_MAX_CONSECUTIVE_WRITE_ERRORS,
    DEFAULT_POLLING_INTERVAL,
};
pub use fs::{Filesystem, LogFile, StdFilesystem};
pub use logger::{Logger, LoggerBuilder, ScopedLogger};
pub use record::{LogRecord, Severity};
pub use retention::{
    apply_retention, files_to_delete, log_file_name, log_file_path, parse_log_file_date,
    DEFAULT_RETENTION_FILE_COUNT, LOG_FILE_SUFFIX,
};
pub use sink::{ConsoleSink, ConsoleStream, LogSink, Sink};
