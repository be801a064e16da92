//! On-disk naming for spool files.
//!
//! One flat directory. A file's state is encoded in its extension:
//! - `<base>.tmp` staging (being written) or in-flight (being read back)
//! - `<base>.trn` committed and visible to consumers
//!
//! Base names look like `Transmission-<millis>-<process token>-<seq>`, so
//! lexical order approximates creation order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use spool_common::ProcessToken;

/// Prefix of every file the spool creates.
pub const FILE_PREFIX: &str = "Transmission";

/// Extension of committed records.
pub const COMMITTED_EXTENSION: &str = "trn";

/// Extension of staging and in-flight files.
pub const TEMP_EXTENSION: &str = "tmp";

/// Name for a new staging file.
pub fn staging_file_name(unix_millis: i64, token: &ProcessToken, sequence: u64) -> String {
    format!(
        "{}-{:013}-{}-{:06}.{}",
        FILE_PREFIX, unix_millis, token, sequence, TEMP_EXTENSION
    )
}

/// File name without its extension.
pub fn base_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// Committed path for the file with the given base name.
pub fn committed_path(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!("{}.{}", base, COMMITTED_EXTENSION))
}

/// Temporary path for the file with the given base name.
pub fn temp_path(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!("{}.{}", base, TEMP_EXTENSION))
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// Regular files directly inside `dir` with the given extension.
pub fn list_files(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if has_extension(&path, extension) && entry.file_type()?.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Total length of the regular files in `dir` with the given extension.
///
/// Files that disappear mid-scan are skipped.
pub fn total_size(dir: &Path, extension: &str) -> io::Result<u64> {
    let mut total = 0u64;
    for path in list_files(dir, extension)? {
        if let Ok(metadata) = fs::metadata(&path) {
            total = total.saturating_add(metadata.len());
        }
    }
    Ok(total)
}
