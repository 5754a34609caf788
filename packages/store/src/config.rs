//! # Application configuration — `chromacards.toml`
//!
//! Defines the TOML configuration file read at startup (filename:
//! [`AppConfig::filename`] = `"chromacards.toml"`). It controls the simulated
//! authentication latency, the note color palette and where records are
//! persisted.
//!
//! ## Structure
//!
//! ```toml
//! [auth]
//! latency_ms = 1000          # simulated round trip for login/signup (0 = none)
//!
//! [notes]
//! palette = ["bg-gradient-primary", "bg-gradient-secondary"]
//! scope_to_user = false      # list() only returns notes of the session user
//!
//! [storage]
//! user_key = "user"
//! notes_key = "notes"
//! dir = ""                   # empty = platform data directory
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`AppConfig`] | Top-level config. Builder helpers, TOML (de)serialisation, file loading. |
//! | [`AuthConfig`] | Simulated login/signup latency, default **1000 ms**. |
//! | [`NotesConfig`] | Color palette (five gradient styles by default) and owner scoping. |
//! | [`StorageConfig`] | Record keys and the native storage directory. |
//!
//! All structs implement `Default` so that a missing or empty config file is
//! equivalent to the default configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kv::validate_key;

/// Palette used when a note is created without a color.
pub const DEFAULT_PALETTE: [&str; 5] = [
    "bg-gradient-primary",
    "bg-gradient-secondary",
    "bg-gradient-success",
    "bg-gradient-warning",
    "bg-gradient-danger",
];

/// Errors raised while loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("notes.palette must contain at least one color")]
    EmptyPalette,

    #[error("storage.{field} {key:?} may only contain letters, digits, '_' and '-'")]
    InvalidStorageKey { field: &'static str, key: String },

    #[error("storage.user_key and storage.notes_key must name different records")]
    SharedStorageKey,
}

/// Top-level configuration stored in `chromacards.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Authentication configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Simulated network delay for login and signup in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

fn default_latency_ms() -> u64 {
    1000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

impl AuthConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Notes-specific configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Style tags a new note picks from when created without a color.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    /// When set, `list()` only returns notes owned by the session user.
    #[serde(default)]
    pub scope_to_user: bool,
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            scope_to_user: false,
        }
    }
}

/// Persistence configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_user_key")]
    pub user_key: String,
    #[serde(default = "default_notes_key")]
    pub notes_key: String,
    /// Directory for native file storage. Empty means the platform data dir.
    #[serde(default)]
    pub dir: String,
}

fn default_user_key() -> String {
    "user".to_string()
}

fn default_notes_key() -> String {
    "notes".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            user_key: default_user_key(),
            notes_key: default_notes_key(),
            dir: String::new(),
        }
    }
}

impl AppConfig {
    /// Builder method to set the simulated auth latency.
    pub fn with_latency_ms(mut self, ms: u64) -> Self {
        self.auth.latency_ms = ms;
        self
    }

    /// Builder method to restrict `list()` to the session user's notes.
    pub fn with_scope_to_user(mut self, scoped: bool) -> Self {
        self.notes.scope_to_user = scoped;
        self
    }

    /// Builder method to set the native storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<String>) -> Self {
        self.storage.dir = dir.into();
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "chromacards.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the stores cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notes.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        let keys = [
            ("user_key", &self.storage.user_key),
            ("notes_key", &self.storage.notes_key),
        ];
        for (field, key) in keys {
            validate_key(key).map_err(|_| ConfigError::InvalidStorageKey {
                field,
                key: key.clone(),
            })?;
        }
        // The notes store also writes "<notes_key>-corrupt"
        let user_key = &self.storage.user_key;
        let notes_key = &self.storage.notes_key;
        if user_key == notes_key || *user_key == format!("{notes_key}-corrupt") {
            return Err(ConfigError::SharedStorageKey);
        }
        Ok(())
    }
}
