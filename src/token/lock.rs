//! Path Locks
//!
//! Serializes lifecycle operations on the same token file within a process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};
use tokio::sync::OwnedMutexGuard;

static GLOBAL_PATH_LOCKS: LazyLock<Arc<PathLocks>> = LazyLock::new(|| Arc::new(PathLocks::new()));

/// Registry of one async mutex per token file path.
///
/// Paths are compared after `std::path::absolute`, so `tokens/a.xml` and
/// `./tokens/a.xml` share a lock. Symlinks are not resolved. An entry lives
/// only while some caller holds or waits for it.
#[derive(Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

/// Exclusive access to one path; released on drop.
pub struct PathGuard<'a> {
    registry: &'a PathLocks,
    key: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every manager in the process.
    pub fn global() -> Arc<PathLocks> {
        GLOBAL_PATH_LOCKS.clone()
    }

    /// Wait for exclusive access to `path`.
    pub async fn acquire(&self, path: &Path) -> PathGuard<'_> {
        let key = Self::key(path);
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks.entry(key.clone()).or_default().clone()
        };

        PathGuard {
            registry: self,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of paths currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(path: &Path) -> PathBuf {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }

    fn release(&self, key: &Path) {
        let mut locks = self.locks.lock().unwrap();
        // Waiters hold their own clone, so a count of one means only the map is left.
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.registry.release(&self.key);
    }
}
