//! Background daily file sink
//!
//! Producers call [`FileSink::submit_line`], which only pushes onto a queue.
//! A dedicated worker thread owns the open file and does all of the I/O:
//! it wakes on a fixed interval, drains the queue, rolls over to a new file
//! when the calendar day changes, and prunes old files after each rollover.
//!
//! Failures never reach producers. Each one is reported through a
//! [`Fallback`] and either absorbed (a single failed write, a failed delete)
//! or turns the sink off for good (no directory, no file to write to, or too
//! many failed writes in a row). Once off, submissions are dropped before
//! they reach the queue.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};

use super::clock::{Clock, SystemClock};
use super::error::FileSinkError;
use super::fallback::{Fallback, TracingFallback};
use super::fs::{Filesystem, LogFile, StdFilesystem};
use super::retention::{self, DEFAULT_RETENTION_FILE_COUNT};

/// Default time between worker passes
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(1000);

/// Default number of back-to-back write failures before the sink gives up
pub const DEFAULT_MAX_CONSECUTIVE_WRITE_ERRORS: u32 = 10;

const WORKER_THREAD_NAME: &str = "daylog-file-worker";

const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Construction-time settings for a [`FileSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkOptions {
    /// Directory holding the daily files
    pub log_directory: PathBuf,
    /// How often the worker wakes when idle
    pub polling_interval: Duration,
    /// Consecutive write failures that disable the sink
    pub max_consecutive_write_errors: u32,
    /// Daily files kept after a rollover
    pub retention_file_count: usize,
}

impl FileSinkOptions {
    /// Check that every limit is usable
    ///
    /// A zero retention count would delete the file being written to, and a
    /// zero polling interval would spin the worker.
    pub fn validate(&self) -> Result<(), FileSinkError> {
        if self.polling_interval.is_zero() {
            return Err(FileSinkError::InvalidOption {
                name: "polling_interval",
            });
        }
        if self.max_consecutive_write_errors == 0 {
            return Err(FileSinkError::InvalidOption {
                name: "max_consecutive_write_errors",
            });
        }
        if self.retention_file_count == 0 {
            return Err(FileSinkError::InvalidOption {
                name: "retention_file_count",
            });
        }
        Ok(())
    }

    /// Options with defaults for everything but the directory
    pub fn new(log_directory: impl Into<PathBuf>) -> Self {
        Self {
            log_directory: log_directory.into(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            max_consecutive_write_errors: DEFAULT_MAX_CONSECUTIVE_WRITE_ERRORS,
            retention_file_count: DEFAULT_RETENTION_FILE_COUNT,
        }
    }
}

/// Lifecycle of the worker behind a [`FileSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SinkState {
    /// Creating the directory and opening today's file
    Starting = 0,
    /// Writing queued lines
    Running = 1,
    /// Gave up after a failure; submissions are dropped
    Disabled = 2,
    /// Shut down cleanly after a final flush
    Stopped = 3,
}

impl SinkState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SinkState::Starting,
            1 => SinkState::Running,
            2 => SinkState::Disabled,
            _ => SinkState::Stopped,
        }
    }
}

/// A line waiting for the worker
#[derive(Debug, Clone)]
struct QueuedLine {
    enqueue_time: NaiveDateTime,
    text: String,
}

impl QueuedLine {
    /// `[YYYY-MM-DD HH:MM:SS] text` plus a newline
    fn render(&self) -> String {
        format!(
            "[{}] {}\n",
            self.enqueue_time.format(LINE_TIMESTAMP_FORMAT),
            self.text
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the handle and the worker thread
struct Shared {
    queue: Mutex<VecDeque<QueuedLine>>,
    /// One-way latch, only ever set while holding `queue`
    disabled: AtomicBool,
    /// Set while holding `queue` once shutdown begins
    closing: AtomicBool,
    state: AtomicU8,
    stop: Mutex<bool>,
    wake: Condvar,
    clock: Arc<dyn Clock>,
}

impl Shared {
    fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            disabled: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            state: AtomicU8::new(SinkState::Starting as u8),
            stop: Mutex::new(false),
            wake: Condvar::new(),
            clock,
        }
    }

    fn state(&self) -> SinkState {
        SinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SinkState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn accepts_lines(&self) -> bool {
        !self.disabled.load(Ordering::Acquire) && !self.closing.load(Ordering::Acquire)
    }

    fn enqueue(&self, text: String) {
        // Cheap check first so a disabled sink doesn't contend on the lock
        if !self.accepts_lines() {
            return;
        }

        let enqueue_time = self.clock.now();
        let mut queue = lock(&self.queue);

        // Re-check under the lock; `disable` and `close` flip their flags
        // while holding it, so nothing can slip in behind them
        if !self.accepts_lines() {
            return;
        }

        queue.push_back(QueuedLine { enqueue_time, text });
    }

    fn take_queued(&self) -> VecDeque<QueuedLine> {
        std::mem::take(&mut *lock(&self.queue))
    }

    fn disable(&self) {
        let mut queue = lock(&self.queue);
        self.disabled.store(true, Ordering::Release);
        queue.clear();
        drop(queue);

        self.set_state(SinkState::Disabled);
    }

    fn close(&self) {
        {
            let _queue = lock(&self.queue);
            self.closing.store(true, Ordering::Release);
        }

        *lock(&self.stop) = true;
        self.wake.notify_all();
    }

    /// Sleep for up to `timeout`, returning `true` if a stop was requested
    fn wait_for_stop(&self, timeout: Duration) -> bool {
        let stop = lock(&self.stop);
        let (stop, _) = self
            .wake
            .wait_timeout_while(stop, timeout, |stop| !*stop)
            .unwrap_or_else(PoisonError::into_inner);
        *stop
    }
}

/// Builder for a [`FileSink`]
///
/// Everything besides the options has a production default: the system
/// clock, the real filesystem, and a `tracing` fallback.
pub struct FileSinkBuilder {
    options: FileSinkOptions,
    clock: Arc<dyn Clock>,
    fs: Arc<dyn Filesystem>,
    fallback: Arc<dyn Fallback>,
}

impl FileSinkBuilder {
    fn new(options: FileSinkOptions) -> Self {
        Self {
            options,
            clock: Arc::new(SystemClock),
            fs: Arc::new(StdFilesystem),
            fallback: Arc::new(TracingFallback),
        }
    }

    /// Use a different time source
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different filesystem
    pub fn filesystem(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Report the sink's own failures somewhere else
    pub fn fallback(mut self, fallback: Arc<dyn Fallback>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Start the worker thread and return its handle
    ///
    /// This never fails. If the worker can't be started the sink comes back
    /// already disabled and the reason goes to the fallback.
    pub fn spawn(self) -> FileSink {
        let shared = Arc::new(Shared::new(Arc::clone(&self.clock)));
        let log_directory = self.options.log_directory.clone();
        let fallback = Arc::clone(&self.fallback);

        if let Err(err) = self.options.validate() {
            fallback.error(&format!("{} - disabled file logging", err));
            shared.disable();

            return FileSink {
                shared,
                handle: Mutex::new(None),
                log_directory,
                fallback,
            };
        }

        // Read here rather than on the worker so that lines submitted before
        // it gets going can't predate the file it opens
        let today = self.clock.today();

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                let fs = self.fs;
                let fallback = self.fallback;
                let options = self.options;

                move || run_worker(&shared, options, fs, fallback, today)
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                fallback.error(&format!(
                    "Failed to start file logging worker thread - disabled file logging: {}",
                    err
                ));
                shared.disable();
                None
            }
        };

        if handle.is_some() {
            fallback.info("Initialized file logging service");
        }

        FileSink {
            shared,
            handle: Mutex::new(handle),
            log_directory,
            fallback,
        }
    }
}

/// Handle to a background daily file sink
///
/// Dropping the handle shuts the worker down and waits for it, but hosts
/// should call [`FileSink::shutdown`] explicitly on their exit path.
pub struct FileSink {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
    log_directory: PathBuf,
    fallback: Arc<dyn Fallback>,
}

impl FileSink {
    /// Start a sink with production defaults
    pub fn spawn(options: FileSinkOptions) -> Self {
        Self::builder(options).spawn()
    }

    /// Configure a sink before starting it
    pub fn builder(options: FileSinkOptions) -> FileSinkBuilder {
        FileSinkBuilder::new(options)
    }

    /// Queue a line for the worker
    ///
    /// Never blocks on I/O and never fails. Lines are silently dropped once
    /// the sink is disabled or shutting down.
    pub fn submit_line(&self, text: impl Into<String>) {
        self.shared.enqueue(text.into());
    }

    /// Current worker state
    pub fn state(&self) -> SinkState {
        self.shared.state()
    }

    /// Whether the sink has permanently stopped writing
    pub fn is_disabled(&self) -> bool {
        self.shared.disabled.load(Ordering::Acquire)
    }

    /// Number of lines waiting for the worker
    pub fn queued_len(&self) -> usize {
        lock(&self.shared.queue).len()
    }

    /// Directory the daily files are written to
    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    /// Stop the worker after a final flush and wait for it to exit
    ///
    /// Safe to call more than once; later calls return immediately.
    pub fn shutdown(&self) {
        self.shared.close();

        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                self.fallback
                    .error("File logging worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("log_directory", &self.log_directory)
            .field("state", &self.state())
            .finish()
    }
}

/// What the worker should do after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Disable,
}

fn run_worker(
    shared: &Shared,
    options: FileSinkOptions,
    fs: Arc<dyn Filesystem>,
    fallback: Arc<dyn Fallback>,
    today: NaiveDate,
) {
    fallback.info("Started file logging service worker thread");

    let polling_interval = options.polling_interval;

    let mut worker = match Worker::start(options, fs, Arc::clone(&fallback), today) {
        Ok(worker) => worker,
        Err(err) => {
            fallback.error(&format!("{} - disabled file logging", err.report()));
            shared.disable();
            return;
        }
    };

    shared.set_state(SinkState::Running);

    loop {
        let pass_started = Instant::now();

        if worker.write_pending(shared) == Flow::Disable
            || worker.rotate_if_new_day(shared.clock.today()) == Flow::Disable
        {
            shared.disable();
            return;
        }

        let wait = polling_interval.saturating_sub(pass_started.elapsed());
        if shared.wait_for_stop(wait) {
            break;
        }
    }

    // Producers can't add anything now, so this pass empties the queue
    if worker.write_pending(shared) == Flow::Disable {
        shared.disable();
        return;
    }

    worker.close();
    shared.set_state(SinkState::Stopped);
}

/// State owned exclusively by the worker thread
struct Worker {
    fs: Arc<dyn Filesystem>,
    fallback: Arc<dyn Fallback>,
    log_directory: PathBuf,
    retention_file_count: usize,
    max_consecutive_write_errors: u32,
    current_date: NaiveDate,
    current_path: PathBuf,
    file: Box<dyn LogFile>,
    consecutive_write_errors: u32,
}

impl Worker {
    fn start(
        options: FileSinkOptions,
        fs: Arc<dyn Filesystem>,
        fallback: Arc<dyn Fallback>,
        today: NaiveDate,
    ) -> Result<Self, FileSinkError> {
        fs.create_dir_all(&options.log_directory)
            .map_err(|source| FileSinkError::CreateDir {
                path: options.log_directory.clone(),
                source,
            })?;

        let current_path = retention::log_file_path(&options.log_directory, today);
        let file = open_log_file(fs.as_ref(), fallback.as_ref(), &current_path)?;

        Ok(Self {
            fs,
            fallback,
            log_directory: options.log_directory,
            retention_file_count: options.retention_file_count,
            max_consecutive_write_errors: options.max_consecutive_write_errors,
            current_date: today,
            current_path,
            file,
            consecutive_write_errors: 0,
        })
    }

    /// Write everything currently queued
    fn write_pending(&mut self, shared: &Shared) -> Flow {
        for line in shared.take_queued() {
            if self.rotate_if_new_day(line.enqueue_time.date()) == Flow::Disable {
                return Flow::Disable;
            }

            match self.write_line(&line) {
                Ok(()) => self.consecutive_write_errors = 0,
                Err(err) => {
                    self.fallback.error(&format!(
                        "{} - dropped line: {}",
                        err.report(),
                        line.render().trim_end()
                    ));

                    self.consecutive_write_errors += 1;
                    if self.consecutive_write_errors >= self.max_consecutive_write_errors {
                        self.fallback.error(&format!(
                            "Failed to write to log file {} times in a row - disabled file logging",
                            self.consecutive_write_errors
                        ));
                        return Flow::Disable;
                    }
                }
            }
        }

        Flow::Continue
    }

    fn write_line(&mut self, line: &QueuedLine) -> Result<(), FileSinkError> {
        let rendered = line.render();
        self.file
            .write_all(rendered.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| FileSinkError::Write {
                path: self.current_path.clone(),
                source,
            })
    }

    /// Switch to the file for `date` if it's later than the current one
    ///
    /// An earlier date (the clock went backwards) keeps the current file.
    fn rotate_if_new_day(&mut self, date: NaiveDate) -> Flow {
        if date <= self.current_date {
            return Flow::Continue;
        }

        let previous = std::mem::replace(&mut self.file, Box::new(io::sink()));
        self.close_file(previous);

        let path = retention::log_file_path(&self.log_directory, date);
        match open_log_file(self.fs.as_ref(), self.fallback.as_ref(), &path) {
            Ok(file) => {
                self.file = file;
                self.current_path = path;
                self.current_date = date;
            }
            Err(err) => {
                self.fallback
                    .error(&format!("{} - disabled file logging", err.report()));
                return Flow::Disable;
            }
        }

        retention::apply_retention(
            self.fs.as_ref(),
            &self.log_directory,
            self.retention_file_count,
            self.fallback.as_ref(),
        );

        Flow::Continue
    }

    fn close_file(&self, mut file: Box<dyn LogFile>) {
        if let Err(source) = file.flush() {
            let err = FileSinkError::Close {
                path: self.current_path.clone(),
                source,
            };
            self.fallback.error(&err.report());
        }
    }

    fn close(mut self) {
        let file = std::mem::replace(&mut self.file, Box::new(io::sink()));
        self.close_file(file);
    }
}

fn open_log_file(
    fs: &dyn Filesystem,
    fallback: &dyn Fallback,
    path: &Path,
) -> Result<Box<dyn LogFile>, FileSinkError> {
    let existed = fs.exists(path);

    let file = fs.open_append(path).map_err(|source| FileSinkError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    if existed {
        fallback.info(&format!("Opened log file: {}", path.display()));
    } else {
        fallback.info(&format!("Created new log file: {}", path.display()));
    }

    Ok(file)
}
