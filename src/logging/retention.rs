//! Daily log file naming and retention
//!
//! Each calendar day gets its own file named `YYYY-MM-DD_out.log`, so sorting
//! file names sorts by date. Retention keeps the newest N of those files.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::error::FileSinkError;
use super::fallback::Fallback;
use super::fs::Filesystem;

/// Default number of daily files to keep
pub const DEFAULT_RETENTION_FILE_COUNT: usize = 7;

/// Suffix shared by every daily log file
pub const LOG_FILE_SUFFIX: &str = "_out.log";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name for the log of `date`
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}{}", date.format(DATE_FORMAT), LOG_FILE_SUFFIX)
}

/// Full path of the log file for `date` inside `logs_dir`
pub fn log_file_path(logs_dir: &Path, date: NaiveDate) -> PathBuf {
    logs_dir.join(log_file_name(date))
}

/// Parse the date out of a daily log file name
///
/// Returns `None` for anything that isn't one of our files.
pub fn parse_log_file_date(file_name: &str) -> Option<NaiveDate> {
    let date = file_name.strip_suffix(LOG_FILE_SUFFIX)?;
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Pick the files that fall outside the newest `keep` daily logs
///
/// Files that aren't daily log files are never selected.
pub fn files_to_delete(files: &[PathBuf], keep: usize) -> Vec<PathBuf> {
    let mut logs: Vec<&PathBuf> = files
        .iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_log_file_date)
                .is_some()
        })
        .collect();

    // Newest first
    logs.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    logs.into_iter().skip(keep).cloned().collect()
}

/// Delete daily log files beyond the newest `keep`
///
/// Best effort: failures are reported through `fallback` and skipped.
/// Returns the number of files deleted.
pub fn apply_retention(
    fs: &dyn Filesystem,
    logs_dir: &Path,
    keep: usize,
    fallback: &dyn Fallback,
) -> usize {
    let files = match fs.read_dir_files(logs_dir) {
        Ok(files) => files,
        Err(source) => {
            let err = FileSinkError::ListDir {
                path: logs_dir.to_path_buf(),
                source,
            };
            fallback.error(&err.report());
            return 0;
        }
    };

    let mut deleted_count = 0;

    for path in files_to_delete(&files, keep) {
        match fs.remove_file(&path) {
            Ok(()) => {
                fallback.info(&format!("Deleted old log file: {}", path.display()));
                deleted_count += 1;
            }
            Err(source) => {
                let err = FileSinkError::Remove { path, source };
                fallback.error(&err.report());
            }
        }
    }

    deleted_count
}
