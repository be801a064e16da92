//! Candidate cache for dequeue.
//!
//! Listing the spool directory on every dequeue is expensive once a backlog
//! builds up, so a batch of committed file names is kept in memory and
//! handed out one at a time. The batch and the set of names currently
//! claimed by a dequeue live behind one mutex; a name can only be claimed by
//! one caller at a time.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use spool_config::RefillOrder;
use tracing::debug;

use crate::layout::{self, COMMITTED_EXTENSION};

#[derive(Debug, Default)]
struct CacheState {
    /// Next candidate is at the end.
    candidates: Vec<PathBuf>,
    /// Base names of files claimed by an active dequeue.
    claimed: HashSet<String>,
}

/// Batch of committed files waiting to be dequeued.
#[derive(Debug)]
pub struct OldestFileCache {
    capacity: usize,
    order: RefillOrder,
    state: Mutex<CacheState>,
}

/// Exclusive claim on one committed file.
///
/// Released when dropped, whatever happens to the file in between.
#[derive(Debug)]
pub struct Claim<'a> {
    cache: &'a OldestFileCache,
    path: PathBuf,
    base: String,
}

impl Claim<'_> {
    /// Committed path of the claimed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_name(&self) -> &str {
        &self.base
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.cache.release(&self.base);
    }
}

impl OldestFileCache {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize, order: RefillOrder) -> Self {
        Self {
            capacity: capacity.max(1),
            order,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the next candidate from `dir` and claim it.
    ///
    /// Refills from a directory listing when the batch is empty. Returns
    /// `Ok(None)` when there is nothing to take, and also when the next
    /// candidate is already claimed by someone else; the caller should treat
    /// both as "nothing right now".
    pub fn take_candidate(&self, dir: &Path) -> io::Result<Option<Claim<'_>>> {
        let mut state = self.lock();

        if state.candidates.is_empty() {
            state.candidates = self.refill(dir)?;
        }

        let Some(path) = state.candidates.pop() else {
            return Ok(None);
        };
        let Some(base) = layout::base_name(&path).map(str::to_string) else {
            return Ok(None);
        };

        if state.claimed.contains(&base) {
            debug!(file = %base, "candidate already claimed");
            return Ok(None);
        }
        state.claimed.insert(base.clone());

        Ok(Some(Claim {
            cache: self,
            path,
            base,
        }))
    }

    fn refill(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = layout::list_files(dir, COMMITTED_EXTENSION)?;
        files.sort_unstable_by(|a, b| b.cmp(a));

        match self.order {
            RefillOrder::HighestNamesRetained => files.truncate(self.capacity),
            RefillOrder::LowestNamesRetained => {
                let excess = files.len().saturating_sub(self.capacity);
                files.drain(..excess);
            }
        }

        debug!(count = files.len(), order = %self.order, "refilled candidate cache");
        Ok(files)
    }

    fn release(&self, base: &str) {
        self.lock().claimed.remove(base);
    }

    /// Whether a dequeue currently holds the file with this base name.
    pub fn is_claimed(&self, base: &str) -> bool {
        self.lock().claimed.contains(base)
    }

    pub fn claimed_count(&self) -> usize {
        self.lock().claimed.len()
    }

    pub fn cached_count(&self) -> usize {
        self.lock().candidates.len()
    }
}
