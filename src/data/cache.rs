use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex,
    },
};

use tracing::{debug, info, warn};

use super::comments::Comment;
use crate::error::CacheError;

/// The single key the full thread snapshot lives under.
pub const SNAPSHOT_KEY: &str = "comments";

/// A string key/value cache with no expiry.
///
/// This is the seam for a networked store. A Redis or memcached client only
/// needs `GET`, `SET` and `DEL` on [`SNAPSHOT_KEY`] to back a [`ThreadCache`],
/// and replicas sharing one such store see each other's invalidations.
/// Connection errors should surface as [`CacheError`], never as panics.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn del(&self, key: &str) -> Result<(), CacheError>;
}

/// In-process cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Cache keeping one file per key in a directory.
///
/// The directory is never created; if it is missing the cache is unavailable.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheBackend for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if !self.dir.is_dir() {
            return Err(std::io::Error::from(ErrorKind::NotFound).into());
        }
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), CacheError> {
        if !self.dir.is_dir() {
            return Err(std::io::Error::from(ErrorKind::NotFound).into());
        }
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Read-through, write-invalidate cache of the full ordered comment list.
///
/// Backend failures degrade to misses. Concurrent misses may each rebuild
/// the snapshot; the last `put` wins.
///
/// Ships with [`MemoryCache`] and [`FileCache`]. Anything else implementing
/// [`CacheBackend`] can be handed to [`ThreadCache::new`].
pub struct ThreadCache {
    backend: Box<dyn CacheBackend>,

    /// Bumped by every invalidation.
    generation: AtomicU64,

    /// Set while a stale snapshot may still sit in the backend.
    poisoned: AtomicBool,
}

impl ThreadCache {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        ThreadCache {
            backend: Box::new(backend),
            generation: AtomicU64::new(0),
            poisoned: AtomicBool::new(false),
        }
    }

    /// Current generation. Record it before scanning the store and hand it to [`ThreadCache::put`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn get(&self) -> Option<Vec<Comment>> {
        if self.poisoned.load(Ordering::SeqCst) {
            return None;
        }
        let value = match self.backend.get(SNAPSHOT_KEY) {
            Ok(value) => value?,
            Err(err) => {
                warn!("Thread cache unavailable, treating as miss: {err}");
                return None;
            }
        };
        match serde_json::from_str(&value) {
            Ok(comments) => Some(comments),
            Err(err) => {
                warn!("Discarding unreadable thread snapshot: {err}");
                None
            }
        }
    }

    /// Store a snapshot read from the store at `generation`.
    ///
    /// If an invalidation landed meanwhile the snapshot may predate a write,
    /// so it is deleted again.
    pub fn put(&self, snapshot: &[Comment], generation: u64) {
        if self.poisoned.load(Ordering::SeqCst) {
            if self.backend.del(SNAPSHOT_KEY).is_err() {
                return;
            }
            self.poisoned.store(false, Ordering::SeqCst);
        }

        let value = match serde_json::to_string(snapshot) {
            Ok(value) => value,
            Err(err) => {
                warn!("Could not serialize thread snapshot: {err}");
                return;
            }
        };
        if let Err(err) = self.backend.set(SNAPSHOT_KEY, &value) {
            warn!("Could not store thread snapshot: {err}");
            return;
        }

        if self.generation() != generation {
            debug!("Snapshot raced an invalidation, dropping it");
            self.invalidate();
        }
    }

    /// Drop the snapshot. Called after every successful write.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        match self.backend.del(SNAPSHOT_KEY) {
            Ok(()) => info!("Removed thread snapshot from cache"),
            Err(err) => {
                warn!("Could not remove thread snapshot, bypassing cache until it can be: {err}");
                self.poisoned.store(true, Ordering::SeqCst);
            }
        }
    }
}
