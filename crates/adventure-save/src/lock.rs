//! Per-save-folder locks so two transactions never touch one folder at once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

#[derive(Default)]
pub struct SaveLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl SaveLocks {
    /// The process-wide lock table.
    pub fn global() -> &'static SaveLocks {
        static LOCKS: OnceLock<SaveLocks> = OnceLock::new();
        LOCKS.get_or_init(SaveLocks::default)
    }

    /// The lock for `folder`. Hold `lock()` on the result for the duration
    /// of the transaction.
    pub fn folder_lock(&self, folder: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(folder.to_path_buf()).or_default().clone()
    }
}

/// Lock a folder mutex, ignoring poisoning from a panicked holder.
pub fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
