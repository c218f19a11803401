//! Durable client-side key-value storage.
//!
//! The session store persists a handful of string entries under fixed keys.
//! Backends implement [`KeyValueStorage`]; multi-key writes are all-or-nothing
//! so a session is never half-persisted by a single call.

use std::path::PathBuf;

use thiserror::Error;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write every entry or none of them.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    /// Remove the given keys; missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}
