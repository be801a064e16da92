//! Directory-backed overflow queue.
//!
//! Write protocol (per record):
//! 1. Create `<base>.tmp` exclusively and write the encoded record
//! 2. `fsync` the staging file
//! 3. Rename to `<base>.trn`, which makes it visible to dequeue
//!
//! Read protocol:
//! 1. Claim a committed file through the [`OldestFileCache`]
//! 2. Rename it back to `<base>.tmp` so no other reader picks it up
//! 3. Decode, then delete under the delete [`RetryPolicy`]
//!
//! The size counter tracks committed bytes. It is added to after a commit and
//! subtracted from as soon as a record is moved out of the committed state.
//! The capacity gate is checked before writing, so concurrent writers may
//! overshoot it by the records they have in flight.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use spool_common::{Error, ProcessToken, Result};
use spool_config::{
    default_spool_dir, storage_capacity_enforcer, LimitsEnforcer, RefillOrder, SpoolConfig,
    DEFAULT_CACHE_SIZE,
};
use tracing::{debug, info, warn};

use crate::cache::OldestFileCache;
use crate::codec;
use crate::layout::{self, COMMITTED_EXTENSION, TEMP_EXTENSION};
use crate::metrics::MetricsSink;
use crate::retry::RetryPolicy;
use crate::transmission::Transmission;
use crate::BYTES_PER_MB;

/// Staging name collisions tolerated before giving up on one enqueue.
const MAX_STAGING_ATTEMPTS: u32 = 16;

/// Bounded persistent queue of transmissions.
///
/// Callers see a boolean for writes and an option for reads. Failures are
/// reported to the metrics sink (writes) or logged (reads), never returned.
pub trait OverflowQueue: Send + Sync {
    /// Persist `transmission`. Returns `false` when it was not stored.
    fn enqueue(&self, transmission: &Transmission) -> bool;

    /// Remove and return one stored transmission, if any can be recovered.
    fn dequeue(&self) -> Option<Transmission>;

    /// Change the capacity, in megabytes. Clamped to the allowed range.
    fn set_capacity(&self, megabytes: i64);
}

/// Construction options for [`DirectoryStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `None` means `<temp dir>/transmissions`.
    pub directory: Option<PathBuf>,
    /// Capacity in megabytes, as text. Parsed with closest-limit semantics.
    pub capacity_mb: Option<String>,
    pub cache_size: usize,
    pub refill_order: RefillOrder,
    pub delete_retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: None,
            capacity_mb: None,
            cache_size: DEFAULT_CACHE_SIZE,
            refill_order: RefillOrder::default(),
            delete_retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spool_config(config: &SpoolConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            capacity_mb: config.capacity_text(),
            cache_size: config.cache_size,
            refill_order: config.refill_order,
            delete_retry: RetryPolicy::new(
                config.delete_attempts,
                Duration::from_millis(config.delete_backoff_ms),
            ),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_capacity_mb(mut self, megabytes: i64) -> Self {
        self.capacity_mb = Some(megabytes.to_string());
        self
    }

    pub fn with_capacity_text(mut self, text: impl Into<String>) -> Self {
        self.capacity_mb = Some(text.into());
        self
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    pub fn with_refill_order(mut self, order: RefillOrder) -> Self {
        self.refill_order = order;
        self
    }

    pub fn with_delete_retry(mut self, policy: RetryPolicy) -> Self {
        self.delete_retry = policy;
        self
    }
}

/// Point-in-time view of the spool directory.
#[derive(Debug, Clone, Serialize)]
pub struct SpoolStatus {
    pub directory: String,
    pub committed_files: usize,
    pub committed_bytes: u64,
    /// Staging, in-flight, or abandoned files.
    pub temp_files: usize,
    pub temp_bytes: u64,
    /// Size counter maintained by this process.
    pub tracked_bytes: u64,
    pub capacity_mb: u64,
    pub capacity_bytes: u64,
    pub used_pct: f64,
    /// Files currently claimed by a dequeue in this process.
    pub claimed_files: usize,
}

/// A temporary file removed by [`DirectoryStore::sweep_temporary_files`].
#[derive(Debug, Clone, Serialize)]
pub struct SweptFile {
    pub path: String,
    pub size_bytes: u64,
    pub age_secs: u64,
}

/// Overflow queue stored as one file per transmission in a flat directory.
pub struct DirectoryStore {
    dir: PathBuf,
    token: ProcessToken,
    sequence: AtomicU64,
    capacity: LimitsEnforcer,
    capacity_mb: AtomicU64,
    size: AtomicU64,
    cache: OldestFileCache,
    delete_retry: RetryPolicy,
    remover: fn(&Path) -> io::Result<()>,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for DirectoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryStore")
            .field("dir", &self.dir)
            .field("token", &self.token)
            .field("capacity_mb", &self.capacity_mb.load(Ordering::Relaxed))
            .field("size", &self.size.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl DirectoryStore {
    /// Open (and create if needed) the spool directory.
    ///
    /// Fails with a configuration error when the directory cannot be used.
    /// The size counter starts at the total size of committed files already
    /// present.
    pub fn open(
        config: StoreConfig,
        token: ProcessToken,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        let dir = config.directory.clone().unwrap_or_else(default_spool_dir);
        ensure_accessible(&dir, &token)?;

        let capacity = storage_capacity_enforcer(config.capacity_mb.as_deref())
            .map_err(|e| Error::Config(e.to_string()))?;
        let capacity_mb = capacity.current_value();

        let size = layout::total_size(&dir, COMMITTED_EXTENSION).map_err(|source| Error::Read {
            path: dir.clone(),
            source,
        })?;

        info!(
            dir = %dir.display(),
            capacity_mb,
            existing_bytes = size,
            token = %token,
            "opened spool directory"
        );

        Ok(Self {
            cache: OldestFileCache::new(config.cache_size, config.refill_order),
            dir,
            token,
            sequence: AtomicU64::new(0),
            capacity,
            capacity_mb: AtomicU64::new(capacity_mb),
            size: AtomicU64::new(size),
            delete_retry: config.delete_retry,
            remover: remove_record,
            metrics,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn process_token(&self) -> &ProcessToken {
        &self.token
    }

    /// Tracked size of committed records, in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    pub fn capacity_mb(&self) -> u64 {
        self.capacity_mb.load(Ordering::Acquire)
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_mb().saturating_mul(BYTES_PER_MB)
    }

    /// Store `transmission`, returning the committed path.
    ///
    /// Same as [`OverflowQueue::enqueue`] but with the failure cause, and
    /// without reporting to the metrics sink.
    pub fn try_enqueue(&self, transmission: &Transmission) -> Result<PathBuf> {
        self.check_capacity()?;
        let record = codec::encode(transmission).map_err(Error::Staging)?;
        self.commit_record(&record)
    }

    /// Store a bare byte payload as a `bytes` record.
    pub fn enqueue_raw(&self, content: &[u8]) -> bool {
        let result = self.try_enqueue_raw(content);
        self.report(result)
    }

    pub fn try_enqueue_raw(&self, content: &[u8]) -> Result<PathBuf> {
        self.check_capacity()?;
        let record = codec::encode_raw(content).map_err(Error::Staging)?;
        self.commit_record(&record)
    }

    fn report(&self, result: Result<PathBuf>) -> bool {
        match result {
            Ok(_) => {
                self.metrics.record_success();
                true
            }
            Err(e) => {
                self.metrics.record_failure(&e.to_string());
                false
            }
        }
    }

    fn check_capacity(&self) -> Result<()> {
        if self.size_bytes() >= self.capacity_bytes() {
            return Err(Error::CapacityExceeded {
                capacity_mb: self.capacity_mb(),
            });
        }
        Ok(())
    }

    fn commit_record(&self, record: &[u8]) -> Result<PathBuf> {
        let (staging_path, file) = self.create_staging_file().map_err(Error::Staging)?;

        // On failure the staging file is left behind for the operator sweep.
        write_synced(file, record).map_err(Error::Staging)?;

        let base = layout::base_name(&staging_path)
            .ok_or_else(|| Error::Staging(io::Error::other("staging file has no base name")))?;
        let committed = layout::committed_path(&self.dir, base);
        fs::rename(&staging_path, &committed).map_err(Error::Commit)?;

        let len = record.len() as u64;
        self.size.fetch_add(len, Ordering::AcqRel);
        debug!(file = %committed.display(), bytes = len, "committed record");
        Ok(committed)
    }

    fn create_staging_file(&self) -> io::Result<(PathBuf, File)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            let millis = chrono::Utc::now().timestamp_millis();
            let path = self
                .dir
                .join(layout::staging_file_name(millis, &self.token, sequence));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_STAGING_ATTEMPTS => {
                    debug!(file = %path.display(), "staging name taken, trying next");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Dequeue one record, reporting why nothing was returned.
    ///
    /// `Ok(None)` means no committed record was available to this caller.
    pub fn try_dequeue(&self) -> Result<Option<Transmission>> {
        let claim = match self.cache.take_candidate(&self.dir) {
            Ok(Some(claim)) => claim,
            Ok(None) => return Ok(None),
            Err(source) => {
                return Err(Error::Read {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let committed = claim.path();
        let in_flight = layout::temp_path(&self.dir, claim.base_name());

        let len = fs::metadata(committed)
            .map_err(|source| Error::Read {
                path: committed.to_path_buf(),
                source,
            })?
            .len();
        fs::rename(committed, &in_flight).map_err(|source| Error::Read {
            path: committed.to_path_buf(),
            source,
        })?;
        self.subtract_size(len);

        // Decode failures are returned only after cleanup.
        let decoded = codec::read_record(&in_flight);
        if let Err(e) = self.delete_in_flight(&in_flight) {
            warn!(
                code = e.code(),
                file = %in_flight.display(),
                error = %e,
                "unable to delete consumed record"
            );
        }

        debug!(file = %in_flight.display(), bytes = len, "dequeued record");
        decoded.map(Some)
    }

    fn delete_in_flight(&self, path: &Path) -> Result<()> {
        self.delete_retry
            .run(|_| match (self.remover)(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            })
            .map_err(|exhausted| Error::Delete {
                path: path.to_path_buf(),
                attempts: exhausted.attempts,
                source: exhausted.last_error,
            })
    }

    fn subtract_size(&self, len: u64) {
        let _ = self
            .size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(len))
            });
    }

    /// Scan the directory and report what is on disk.
    pub fn status(&self) -> Result<SpoolStatus> {
        let scan_err = |source| Error::Read {
            path: self.dir.clone(),
            source,
        };
        let committed = layout::list_files(&self.dir, COMMITTED_EXTENSION).map_err(scan_err)?;
        let committed_bytes = layout::total_size(&self.dir, COMMITTED_EXTENSION).map_err(scan_err)?;
        let temp = layout::list_files(&self.dir, TEMP_EXTENSION).map_err(scan_err)?;
        let temp_bytes = layout::total_size(&self.dir, TEMP_EXTENSION).map_err(scan_err)?;

        let capacity_bytes = self.capacity_bytes();
        let used_pct = if capacity_bytes > 0 {
            (committed_bytes as f64 / capacity_bytes as f64) * 100.0
        } else {
            0.0
        };

        Ok(SpoolStatus {
            directory: self.dir.display().to_string(),
            committed_files: committed.len(),
            committed_bytes,
            temp_files: temp.len(),
            temp_bytes,
            tracked_bytes: self.size_bytes(),
            capacity_mb: self.capacity_mb(),
            capacity_bytes,
            used_pct,
            claimed_files: self.cache.claimed_count(),
        })
    }

    /// Delete temporary files last modified at least `min_age` ago.
    ///
    /// Files claimed by a dequeue in this process are left alone, and so are
    /// staging files carrying this store's process token, which may still be
    /// being written. Files that cannot be inspected or removed are logged and
    /// skipped.
    pub fn sweep_temporary_files(&self, min_age: Duration) -> Result<Vec<SweptFile>> {
        let files = layout::list_files(&self.dir, TEMP_EXTENSION).map_err(|source| Error::Read {
            path: self.dir.clone(),
            source,
        })?;
        let own_staging = format!("-{}-", self.token);
        let now = SystemTime::now();
        let mut swept = Vec::new();

        for path in files {
            let Some(base) = layout::base_name(&path) else {
                continue;
            };
            if self.cache.is_claimed(base) || base.contains(&own_staging) {
                continue;
            }
            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "skipping temporary file");
                    continue;
                }
            };
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < min_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(file = %path.display(), age_secs = age.as_secs(), "swept temporary file");
                    swept.push(SweptFile {
                        path: path.display().to_string(),
                        size_bytes: metadata.len(),
                        age_secs: age.as_secs(),
                    });
                }
                Err(e) => warn!(file = %path.display(), error = %e, "unable to sweep temporary file"),
            }
        }

        Ok(swept)
    }
}

impl OverflowQueue for DirectoryStore {
    fn enqueue(&self, transmission: &Transmission) -> bool {
        let result = self.try_enqueue(transmission);
        self.report(result)
    }

    fn dequeue(&self) -> Option<Transmission> {
        match self.try_dequeue() {
            Ok(found) => found,
            Err(e) => {
                warn!(code = e.code(), error = %e, "dequeue failed");
                None
            }
        }
    }

    fn set_capacity(&self, megabytes: i64) {
        let applied = self.capacity.normalize(megabytes);
        self.capacity_mb.store(applied, Ordering::Release);
        info!(capacity_mb = applied, "spool capacity updated");
    }
}

fn write_synced(file: File, record: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    writer.write_all(record)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

fn remove_record(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// The directory must exist, be listable, and accept a new file from this
/// process.
fn ensure_accessible(dir: &Path, token: &ProcessToken) -> Result<()> {
    let not_accessible = || Error::DirectoryNotAccessible {
        path: dir.to_path_buf(),
    };

    if let Err(e) = fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "unable to create spool directory");
        return Err(not_accessible());
    }

    let metadata = fs::metadata(dir).map_err(|_| not_accessible())?;
    if !metadata.is_dir() {
        return Err(not_accessible());
    }
    fs::read_dir(dir).map_err(|_| not_accessible())?;

    let check = dir.join(format!(".write-check-{}", token));
    if let Err(e) = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&check)
    {
        warn!(dir = %dir.display(), error = %e, "spool directory is not writable");
        return Err(not_accessible());
    }
    if let Err(e) = fs::remove_file(&check) {
        warn!(file = %check.display(), error = %e, "unable to remove write check file");
        return Err(not_accessible());
    }
    Ok(())
}
