//! # Configuration
//!
//! quire keeps configuration as a flat string key/value store, the same
//! shape as `app.set()` / `app.get()`:
//!
//! ```rust
//! use quire_core::QuireConfig;
//! let mut config = QuireConfig::new();
//!
//! config.set("http.port", "8080");
//! assert_eq!(config.get("http.port"), Some("8080"));
//! ```
//!
//! ## Environment overrides
//! [`QuireConfig::load_env`] overlays environment variables that start with
//! a prefix. Double underscores become dots and keys are lower-cased:
//!
//! ```bash
//! export QUIRE__HTTP__PORT=8080          # http.port
//! export QUIRE__BANNER__CLEAR_AFTER_MS=5000
//! ```
//!
//! Components never read the environment themselves. They receive a
//! [`ConfigSnapshot`] at construction and use the typed getters.

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct QuireConfig {
    values: HashMap<String, String>,
}

impl QuireConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Create a store pre-filled with `defaults`.
    pub fn with_defaults<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self::new();
        for (k, v) in defaults {
            config.set(k, v);
        }
        config
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overlay `PREFIX__A__B=value` variables as `a.b = value`.
    /// Returns how many keys were applied.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_vars(prefix, std::env::vars())
    }

    fn load_vars<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = 0;
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(prefix) else {
                continue;
            };
            let stripped = stripped.trim_start_matches('_');
            if stripped.is_empty() {
                continue;
            }
            let normalized = stripped.to_lowercase().replace("__", ".");
            tracing::debug!(key = %normalized, "config override from environment");
            self.set(normalized, value);
            applied += 1;
        }
        applied
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.trim().parse::<u32>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }

    /// Millisecond value as a `Duration`.
    pub fn get_duration_ms(&self, key: &str) -> Option<Duration> {
        self.get_u64(key).map(Duration::from_millis)
    }
}
