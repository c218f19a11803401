use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{KeyValueStorage, StorageError};

/// In-process storage. Clones share the same map, so a test can keep a handle
/// and inspect what the session store wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    map: Arc<RwLock<BTreeMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    /// Make every subsequent write fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> { self.map.read().clone() }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory storage is read-only".into()));
        }
        Ok(())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut m = self.map.write();
        for (k, v) in entries {
            m.insert((*k).to_string(), v.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut m = self.map.write();
        for k in keys {
            m.remove(*k);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.map.read().keys().cloned().collect())
    }

    fn describe(&self) -> String { "memory".to_string() }
}
