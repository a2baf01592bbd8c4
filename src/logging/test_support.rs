//! Test doubles for the logging subsystem

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::fallback::Fallback;
use super::fs::{Filesystem, LogFile, StdFilesystem};

/// Fallback that keeps every report in memory
#[derive(Debug, Default)]
pub struct RecordingFallback {
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingFallback {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn has_info_containing(&self, needle: &str) -> bool {
        self.infos.lock().unwrap().iter().any(|m| m.contains(needle))
    }

    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

impl Fallback for RecordingFallback {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_create_dir: AtomicBool,
    fail_all_writes: AtomicBool,
    fail_writes_containing: Mutex<Option<String>>,
    fail_open: Mutex<HashSet<String>>,
    fail_remove: Mutex<HashSet<String>>,
    fail_flush: Mutex<HashSet<String>>,
    write_attempts: AtomicUsize,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Real filesystem with switchable failures
#[derive(Debug, Default)]
pub struct FaultyFilesystem {
    faults: Arc<Faults>,
}

impl FaultyFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create_dir(&self) {
        self.faults.fail_create_dir.store(true, Ordering::SeqCst);
    }

    pub fn fail_all_writes(&self) {
        self.faults.fail_all_writes.store(true, Ordering::SeqCst);
    }

    /// Fail any write whose bytes contain `marker`
    pub fn fail_writes_containing(&self, marker: &str) {
        *self.faults.fail_writes_containing.lock().unwrap() = Some(marker.to_string());
    }

    /// Fail opening any file called `name`
    pub fn fail_open(&self, name: &str) {
        self.faults.fail_open.lock().unwrap().insert(name.to_string());
    }

    /// Fail removing any file called `name`
    pub fn fail_remove(&self, name: &str) {
        self.faults.fail_remove.lock().unwrap().insert(name.to_string());
    }

    /// Fail flushing any open file called `name`
    pub fn fail_flush(&self, name: &str) {
        self.faults.fail_flush.lock().unwrap().insert(name.to_string());
    }

    pub fn write_attempts(&self) -> usize {
        self.faults.write_attempts.load(Ordering::SeqCst)
    }
}

impl Filesystem for FaultyFilesystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.faults.fail_create_dir.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected"));
        }
        StdFilesystem.create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        StdFilesystem.exists(path)
    }

    fn open_append(&self, path: &Path) -> io::Result<Box<dyn LogFile>> {
        if self.faults.fail_open.lock().unwrap().contains(&file_name(path)) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected"));
        }
        let inner = StdFilesystem.open_append(path)?;
        Ok(Box::new(FaultyFile {
            name: file_name(path),
            inner,
            faults: Arc::clone(&self.faults),
        }))
    }

    fn read_dir_files(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        StdFilesystem.read_dir_files(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.faults.fail_remove.lock().unwrap().contains(&file_name(path)) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected"));
        }
        StdFilesystem.remove_file(path)
    }
}

struct FaultyFile {
    name: String,
    inner: Box<dyn LogFile>,
    faults: Arc<Faults>,
}

impl Write for FaultyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.faults.write_attempts.fetch_add(1, Ordering::SeqCst);

        if self.faults.fail_all_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }

        let marker = self.faults.fail_writes_containing.lock().unwrap().clone();
        if let Some(marker) = marker {
            if String::from_utf8_lossy(buf).contains(&marker) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
            }
        }

        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.faults.fail_flush.lock().unwrap().contains(&self.name) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected flush failure"));
        }
        self.inner.flush()
    }
}
