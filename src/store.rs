//! Key-value persistence.
//!
//! `Store` is the raw device storage (one string document per key).
//! `Persistence` is the adapter the repository talks to: JSON in and out,
//! read/parse failures masked as "no data", and a write-behind queue that
//! coalesces rapid saves of the same key.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::StoreError;

/// Storage keys, compatible with datasets written by the browser dashboard.
pub mod keys {
    pub const INVOICES: &str = "loomlance-invoices";
    pub const CONTRACTS: &str = "loomlance-contracts";
    pub const CLIENTS: &str = "loomlance-clients";
    pub const ARCHIVED_INVOICES: &str = "loomlance-archived-invoices";
    pub const ARCHIVED_CONTRACTS: &str = "loomlance-archived-contracts";
    pub const ARCHIVED_CLIENTS: &str = "loomlance-archived-clients";
    pub const LAST_INVOICE_NUMBER: &str = "loomlance-last-invoice-number";
    pub const AUTO_UPDATED: &str = "loomlance-auto-updated";
    pub const BILLED_DISPLAY: &str = "loomlance-settings-invoice-billed-display";
    pub const THEME: &str = "loomlance-theme";
    pub const USER: &str = "loomlance-user";
}

pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

// ==========================================
// In-memory store
// ==========================================

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    writes: BTreeMap<String, usize>,
    reject_writes: bool,
}

/// Process-local store. Clones share the same entries, the way every tab of
/// one origin shares its storage, so a test can "reload" by opening a new
/// repository on a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `set`/`remove` fails with `StoreError::Rejected`.
    pub fn reject_writes(&self, reject: bool) {
        self.inner.borrow_mut().reject_writes = reject;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    /// Successful `set`/`remove` calls for `key` so far.
    pub fn write_count(&self, key: &str) -> usize {
        self.inner.borrow().writes.get(key).copied().unwrap_or(0)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().entries.keys().cloned().collect()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner.reject_writes {
            return Err(StoreError::Rejected { key: key.to_string() });
        }
        inner.entries.insert(key.to_string(), value.to_string());
        *inner.writes.entry(key.to_string()).or_default() += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner.reject_writes {
            return Err(StoreError::Rejected { key: key.to_string() });
        }
        inner.entries.remove(key);
        *inner.writes.entry(key.to_string()).or_default() += 1;
        Ok(())
    }
}

// ==========================================
// File store
// ==========================================

/// One `<key>.json` document per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let write = || -> io::Result<()> {
            fs::write(&tmp, value)?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                key: key.to_string(),
                source,
            }),
        }
    }
}

// ==========================================
// Persistence adapter with write-behind queue
// ==========================================

#[derive(Debug, Clone, PartialEq)]
enum PendingOp {
    Set(String),
    Remove,
}

#[derive(Debug)]
struct Pending {
    op: PendingOp,
    queued_at: Instant,
}

/// JSON adapter over a [`Store`] with a write-behind queue.
///
/// Queued writes are only drained by a later save, [`Persistence::flush`] or
/// drop. There is no background timer: if saves stop, storage stays behind
/// memory until the next flush or until the adapter is dropped.
pub struct Persistence<S: Store> {
    store: S,
    pending: BTreeMap<String, Pending>,
    write_delay: Duration,
}

impl<S: Store> Persistence<S> {
    pub fn new(store: S, write_delay: Duration) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
            write_delay,
        }
    }

    /// Saves land in storage immediately.
    pub fn write_through(store: S) -> Self {
        Self::new(store, Duration::ZERO)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Raw document for `key`, preferring a queued write over storage.
    fn read_raw(&self, key: &str) -> Option<String> {
        if let Some(pending) = self.pending.get(key) {
            return match &pending.op {
                PendingOp::Set(value) => Some(value.clone()),
                PendingOp::Remove => None,
            };
        }
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "storage read failed, treating as empty");
                None
            }
        }
    }

    pub fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.read_raw(key) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(key, error = %e, "stored collection is corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn save_collection<T: Serialize>(&mut self, key: &str, items: &[T]) {
        self.save_json(key, &items);
    }

    pub fn load_scalar<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.read_raw(key) else {
            return default;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored value is corrupt, using default");
                default
            }
        }
    }

    pub fn save_scalar<T: Serialize>(&mut self, key: &str, value: &T) {
        self.save_json(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.enqueue(key, PendingOp::Remove);
    }

    fn save_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.enqueue(key, PendingOp::Set(json)),
            Err(e) => error!(key, error = %e, "failed to serialize value, write skipped"),
        }
    }

    fn enqueue(&mut self, key: &str, op: PendingOp) {
        let now = Instant::now();
        // a newer save replaces the queued one but keeps its age, so a
        // steady stream of edits cannot postpone the write forever
        let queued_at = self
            .pending
            .get(key)
            .map(|p| p.queued_at)
            .unwrap_or(now);
        debug!(key, coalesced = self.pending.contains_key(key), "write queued");
        self.pending.insert(key.to_string(), Pending { op, queued_at });
        let delay = self.write_delay;
        self.drain(move |pending| now.duration_since(pending.queued_at) >= delay);
    }

    /// Writes every queued value now. Failures are logged; the first one is returned.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        match self.drain(|_| true) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn drain(&mut self, due: impl Fn(&Pending) -> bool) -> Option<StoreError> {
        let ready: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, pending)| due(pending))
            .map(|(key, _)| key.clone())
            .collect();

        let mut first_failure = None;
        for key in ready {
            let Some(pending) = self.pending.remove(&key) else {
                continue;
            };
            let result = match &pending.op {
                PendingOp::Set(value) => self.store.set(&key, value),
                PendingOp::Remove => self.store.remove(&key),
            };
            if let Err(e) = result {
                error!(key = %key, error = %e, "storage write failed, in-memory state kept");
                first_failure.get_or_insert(e);
            }
        }
        first_failure
    }
}

impl<S: Store> Drop for Persistence<S> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            // errors are already logged by the drain
            let _ = self.flush();
        }
    }
}
