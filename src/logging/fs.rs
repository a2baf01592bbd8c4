//! Filesystem access used by the file sink worker

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// An open, append-only log file
pub trait LogFile: Write + Send {}

impl<W: Write + Send> LogFile for W {}

/// The filesystem operations the worker needs
pub trait Filesystem: Send + Sync {
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Open `path` for appending, creating it if missing
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn LogFile>>;

    /// List regular files directly inside `path`
    fn read_dir_files(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open_append(&self, path: &Path) -> io::Result<Box<dyn LogFile>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(file))
    }

    fn read_dir_files(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
