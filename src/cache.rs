//! Derivative cache keys and in-process single-flight.
//!
//! Many pages of one site reference the same source image, and pages are
//! transformed in parallel. Two questions have to be answered per derivative:
//!
//! 1. **Is it already on disk?** Derivative filenames are a pure function of
//!    (source path, width, format), see [`naming`](crate::naming). A file with
//!    the expected name in the output image directory is a finished
//!    derivative. There is no manifest and no content hashing; the filesystem
//!    is the cache.
//!
//! 2. **Is another thread producing it right now?** [`SingleFlight`] maps each
//!    [`DerivativeKey`] to a once-cell. The first caller runs the work, every
//!    concurrent caller for the same key blocks on the cell and receives the
//!    same result. Later callers get the memoized result without touching the
//!    disk again. Failures are memoized too, so a bad source is not
//!    re-decoded for every page that references it.
//!
//! [`CacheStats`] counts what happened for reporting.

use crate::types::OutputFormat;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Identity of one derivative: the same triple the filename is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivativeKey {
    pub source: PathBuf,
    pub width: u32,
    pub format: OutputFormat,
}

/// Collapses concurrent executions for the same key into one.
pub struct SingleFlight<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceLock<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> SingleFlight<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, running `work` only if no other caller has.
    ///
    /// The boolean is `true` when this call executed `work`.
    pub fn run<F>(&self, key: &K, work: F) -> (V, bool)
    where
        F: FnOnce() -> V,
    {
        let cell = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut executed = false;
        let value = cell
            .get_or_init(|| {
                executed = true;
                work()
            })
            .clone();
        (value, executed)
    }

    /// Number of keys seen so far.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a derivative request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantStatus {
    /// Already on disk or produced earlier in this run.
    Cached,
    /// Encoded by this call.
    Encoded,
}

/// Summary of cache performance for a page or a whole build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub failures: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn failure(&mut self) {
        self.failures += 1;
    }

    pub fn record(&mut self, status: VariantStatus) {
        match status {
            VariantStatus::Cached => self.hit(),
            VariantStatus::Encoded => self.miss(),
        }
    }

    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.failures += other.failures;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.failures
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} encoded ({} total)",
                self.hits,
                self.misses,
                self.hits + self.misses
            )?;
        } else {
            write!(f, "{} encoded", self.misses)?;
        }
        if self.failures > 0 {
            write!(f, ", {} failed", self.failures)?;
        }
        Ok(())
    }
}
