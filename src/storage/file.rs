use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::{KeyValueStorage, StorageError};

const FILE_NAME: &str = "session.json";

/// JSON-object file under a state directory.
///
/// Every write rewrites the whole map into `<file>.tmp` and renames it over the
/// target, so readers see either the previous or the next version of the file.
pub struct FileStorage {
    dir: PathBuf,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(FILE_NAME);
        Self { dir, path, write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn tmp_path(&self) -> PathBuf { self.dir.join(format!("{}.tmp", FILE_NAME)) }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io { path: self.path.clone(), source }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice::<BTreeMap<String, String>>(&bytes)
            .map_err(|e| StorageError::Corrupt { path: self.path.clone(), reason: e.to_string() })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| self.io_err(e))?;
        let body = serde_json::to_vec_pretty(map)
            .map_err(|e| StorageError::Corrupt { path: self.path.clone(), reason: e.to_string() })?;
        let tmp = self.tmp_path();
        {
            let mut f = std::fs::File::create(&tmp).map_err(|e| self.io_err(e))?;
            f.write_all(&body).map_err(|e| self.io_err(e))?;
            f.sync_all().map_err(|e| self.io_err(e))?;
        }
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        debug!(target: "tunfin::storage", path = %self.path.display(), keys = map.len(), "session file written");
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut map = match self.read_map() {
            Ok(m) => m,
            Err(StorageError::Corrupt { reason, .. }) => {
                debug!(target: "tunfin::storage", path = %self.path.display(), %reason, "replacing corrupt session file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        for (k, v) in entries {
            map.insert((*k).to_string(), v.clone());
        }
        self.write_map(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let (mut map, corrupt) = match self.read_map() {
            Ok(m) => (m, false),
            // A corrupt file holds nothing worth keeping; overwrite it.
            Err(StorageError::Corrupt { .. }) => (BTreeMap::new(), true),
            Err(e) => return Err(e),
        };
        let mut changed = false;
        for k in keys {
            changed |= map.remove(*k).is_some();
        }
        if !changed && !corrupt {
            return Ok(());
        }
        if map.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_err(e)),
            };
        }
        self.write_map(&map)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read_map()?.into_keys().collect())
    }

    fn describe(&self) -> String { format!("file:{}", self.path.display()) }
}
