//! Client configuration resolved from the environment.
//! Command-line flags in the `tunfin` binary override what is read here.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

pub const ENV_API_BASE: &str = "TUNFIN_API_BASE";
pub const ENV_STATE_DIR: &str = "TUNFIN_STATE_DIR";
pub const ENV_TIMEOUT_MS: &str = "TUNFIN_TIMEOUT_MS";
pub const ENV_OUTPUT: &str = "TUNFIN_OUTPUT";

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";
pub const DEFAULT_STATE_DIR: &str = ".tunfin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Table,
    Json,
}

impl OutputMode {
    pub fn parse(s: &str) -> Option<OutputMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Some(OutputMode::Table),
            "json" => Some(OutputMode::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway origin, optionally with a path prefix.
    pub api_base: String,
    /// Where the session file lives.
    pub state_dir: PathBuf,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
    pub output: OutputMode,
    /// Keep the session in memory only.
    pub ephemeral: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            timeout: None,
            output: OutputMode::Table,
            ephemeral: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = ClientConfig::default();
        if let Some(base) = lookup(ENV_API_BASE).filter(|s| !s.trim().is_empty()) {
            cfg.api_base = base.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|s| !s.trim().is_empty()) {
            cfg.state_dir = PathBuf::from(dir);
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            match ms.trim().parse::<u64>() {
                Ok(0) => cfg.timeout = None,
                Ok(n) => cfg.timeout = Some(Duration::from_millis(n)),
                Err(_) => warn!(target: "tunfin::config", value = %ms, "ignoring non-numeric {}", ENV_TIMEOUT_MS),
            }
        }
        if let Some(out) = lookup(ENV_OUTPUT) {
            match OutputMode::parse(&out) {
                Some(m) => cfg.output = m,
                None => warn!(target: "tunfin::config", value = %out, "ignoring unknown {}", ENV_OUTPUT),
            }
        }
        cfg
    }

    pub fn open_storage(&self) -> Box<dyn KeyValueStorage> {
        if self.ephemeral {
            Box::new(MemoryStorage::new())
        } else {
            Box::new(FileStorage::new(&self.state_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_when_env_empty() {
        let cfg = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.state_dir, PathBuf::from(DEFAULT_STATE_DIR));
        assert!(cfg.timeout.is_none());
        assert_eq!(cfg.output, OutputMode::Table);
    }

    #[test]
    fn env_overrides() {
        let cfg = ClientConfig::from_lookup(lookup(&[
            (ENV_API_BASE, "https://gw.example/tunfin"),
            (ENV_STATE_DIR, "/tmp/tf"),
            (ENV_TIMEOUT_MS, "2500"),
            (ENV_OUTPUT, "JSON"),
        ]));
        assert_eq!(cfg.api_base, "https://gw.example/tunfin");
        assert_eq!(cfg.state_dir, PathBuf::from("/tmp/tf"));
        assert_eq!(cfg.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(cfg.output, OutputMode::Json);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "soon"), (ENV_OUTPUT, "xml")]));
        assert!(cfg.timeout.is_none());
        assert_eq!(cfg.output, OutputMode::Table);
    }
}
