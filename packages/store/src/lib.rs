pub mod config;
pub mod kv;
pub mod models;

mod memory;
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store;
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStore;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local::LocalStore;

pub use config::{AppConfig, ConfigError};
pub use kv::{KeyValueStore, StoreError};
pub use models::{AuthStatus, Note, NoteDraft, NotePatch, User};
