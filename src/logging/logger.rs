//! Front-end dispatcher
//!
//! The [`Logger`] filters records by severity, renders them into a line and
//! hands that line to every registered sink. It is built once at startup and
//! shared by `Arc` with whatever needs to log.

use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::file_sink::FileSink;
use super::record::{LogRecord, Severity};
use super::sink::{ConsoleSink, LogSink, Sink};
use crate::config::LoggingConfig;

/// Builder for a [`Logger`]
pub struct LoggerBuilder {
    min_severity: Severity,
    sinks: Vec<Sink>,
    clock: Arc<dyn Clock>,
}

impl LoggerBuilder {
    /// Drop records less severe than `min_severity`
    pub fn min_severity(mut self, min_severity: Severity) -> Self {
        self.min_severity = min_severity;
        self
    }

    /// Register a sink
    pub fn sink(mut self, sink: impl Into<Sink>) -> Self {
        self.sinks.push(sink.into());
        self
    }

    /// Time source used to stamp records created through the logger
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            min_severity: self.min_severity,
            sinks: self.sinks,
            clock: self.clock,
        }
    }
}

/// Severity-filtering fan-out to a fixed set of sinks
#[derive(Debug)]
pub struct Logger {
    min_severity: Severity,
    sinks: Vec<Sink>,
    clock: Arc<dyn Clock>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder {
            min_severity: Severity::Info,
            sinks: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Build the production logger described by `config`
    ///
    /// Starts the file worker. If the log directory can't be used the file
    /// sink disables itself and the console keeps working.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::builder().min_severity(config.min_severity);

        if config.console {
            builder = builder.sink(ConsoleSink::stdout());
        }

        builder
            .sink(FileSink::spawn(config.file_sink_options()))
            .build()
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    /// Whether a record of `severity` would be dispatched
    pub fn enabled(&self, severity: Severity) -> bool {
        severity.passes(self.min_severity)
    }

    /// Dispatch a record to every sink
    pub fn log(&self, record: &LogRecord) {
        if !self.enabled(record.severity) {
            return;
        }

        let line = record.to_line();
        for sink in &self.sinks {
            sink.submit(&line);
        }
    }

    /// Create and dispatch a record stamped with the current time
    pub fn log_with(&self, severity: Severity, source: &str, text: impl Into<String>) {
        if !self.enabled(severity) {
            return;
        }

        let record = LogRecord::new(self.clock.now(), severity, source, text);
        self.log(&record);
    }

    /// Write a line to every sink as-is, bypassing formatting and filtering
    pub fn log_raw(&self, line: &str) {
        for sink in &self.sinks {
            sink.submit(line);
        }
    }

    /// A handle that logs everything under `source`
    pub fn scoped(self: &Arc<Self>, source: impl Into<String>) -> ScopedLogger {
        ScopedLogger {
            logger: Arc::clone(self),
            source: source.into(),
        }
    }

    /// Stop every sink, flushing and joining the file workers
    pub fn shutdown(&self) {
        for sink in &self.sinks {
            sink.shutdown();
        }
    }
}

/// A [`Logger`] bound to one source tag
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    logger: Arc<Logger>,
    source: String,
}

impl ScopedLogger {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn log(&self, severity: Severity, text: impl Into<String>) {
        self.logger.log_with(severity, &self.source, text);
    }

    pub fn critical(&self, text: impl Into<String>) {
        self.log(Severity::Critical, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.log(Severity::Error, text);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.log(Severity::Warning, text);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.log(Severity::Info, text);
    }

    pub fn verbose(&self, text: impl Into<String>) {
        self.log(Severity::Verbose, text);
    }

    pub fn debug(&self, text: impl Into<String>) {
        self.log(Severity::Debug, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::clock::ManualClock;
    use crate::logging::file_sink::FileSinkOptions;
    use crate::logging::retention::log_file_name;
    use crate::logging::test_support::RecordingFallback;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tempfile::TempDir;

    fn logger_with_file(temp_dir: &TempDir, min_severity: Severity) -> Arc<Logger> {
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 16)
                .unwrap()
                .and_hms_opt(8, 15, 0)
                .unwrap(),
        ));
        let options = FileSinkOptions {
            polling_interval: Duration::from_millis(10),
            ..FileSinkOptions::new(temp_dir.path())
        };
        let file = FileSink::builder(options)
            .clock(clock.clone())
            .fallback(Arc::new(RecordingFallback::default()))
            .spawn();

        Arc::new(
            Logger::builder()
                .min_severity(min_severity)
                .clock(clock)
                .sink(file)
                .build(),
        )
    }

    fn file_lines(temp_dir: &TempDir) -> Vec<String> {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        std::fs::read_to_string(temp_dir.path().join(log_file_name(date)))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_logger_filters_by_severity() {
        let temp_dir = TempDir::new().unwrap();
        let logger = logger_with_file(&temp_dir, Severity::Info);

        logger.log_with(Severity::Debug, "GEN", "too chatty");
        logger.log_with(Severity::Verbose, "GEN", "still too chatty");
        logger.log_with(Severity::Info, "GEN", "ready");
        logger.log_with(Severity::Critical, "GEN", "on fire");
        logger.shutdown();

        assert_eq!(
            file_lines(&temp_dir),
            vec![
                "[2026-10-16 08:15:00] [GEN/Info    ] ready",
                "[2026-10-16 08:15:00] [GEN/Critical] on fire",
            ]
        );
    }

    #[test]
    fn test_scoped_logger_uses_source() {
        let temp_dir = TempDir::new().unwrap();
        let logger = logger_with_file(&temp_dir, Severity::Debug);

        let cmd = logger.scoped("CMD");
        assert_eq!(cmd.source(), "CMD");
        cmd.warning("gymlog failed to execute");
        cmd.debug("details");
        logger.shutdown();

        assert_eq!(
            file_lines(&temp_dir),
            vec![
                "[2026-10-16 08:15:00] [CMD/Warning ] gymlog failed to execute",
                "[2026-10-16 08:15:00] [CMD/Debug   ] details",
            ]
        );
    }

    #[test]
    fn test_log_raw_skips_formatting() {
        let temp_dir = TempDir::new().unwrap();
        let logger = logger_with_file(&temp_dir, Severity::Critical);

        logger.log_raw("stack trace line");
        logger.shutdown();

        assert_eq!(
            file_lines(&temp_dir),
            vec!["[2026-10-16 08:15:00] stack trace line"]
        );
    }

    #[test]
    fn test_logger_without_sinks_is_harmless() {
        let logger = Logger::builder().min_severity(Severity::Debug).build();
        assert!(logger.sinks().is_empty());
        logger.log_with(Severity::Error, "GEN", "nobody listening");
        logger.shutdown();
    }

    #[test]
    fn test_console_and_file_sinks_registered() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = LoggingConfig::default();
        config.log_directory = temp_dir.path().join("logs");
        config.polling_interval_ms = 10;

        let logger = Logger::from_config(&config);
        assert_eq!(logger.sinks().len(), 2);
        assert!(matches!(logger.sinks()[0], Sink::Console(_)));

        let file = logger.sinks()[1].as_file().unwrap();
        assert_eq!(file.log_directory(), config.log_directory.as_path());

        logger.shutdown();
        assert!(config.log_directory.exists());
    }
}
