//! Application context: the one handle passed to every consumer.
//!
//! Built once at startup. It wires both stores to the same persistence
//! backend and collaborators, restores the previous session, and is cheap to
//! clone.

use std::sync::Arc;

use store::{AppConfig, ConfigError, KeyValueStore};

use crate::notes::NotesStore;
use crate::services::Services;
use crate::session::SessionStore;

pub struct AppContext<S: KeyValueStore + Clone + 'static> {
    config: Arc<AppConfig>,
    services: Services,
    session: Arc<SessionStore<S>>,
    notes: Arc<NotesStore<S>>,
}

impl<S: KeyValueStore + Clone + 'static> Clone for AppContext<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            services: self.services.clone(),
            session: Arc::clone(&self.session),
            notes: Arc::clone(&self.notes),
        }
    }
}

impl<S: KeyValueStore + Clone + 'static> AppContext<S> {
    /// Build both stores over `kv` and restore the persisted session.
    ///
    /// Fails before touching storage if `config` does not validate.
    pub fn new(kv: S, config: AppConfig, services: Services) -> Result<Self, ConfigError> {
        config.validate()?;
        let session = Arc::new(SessionStore::new(kv.clone(), &config, services.clone()));
        session.restore();
        let notes = Arc::new(NotesStore::new(
            kv,
            &config,
            session.clone(),
            services.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            services,
            session,
            notes,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn session(&self) -> &Arc<SessionStore<S>> {
        &self.session
    }

    pub fn notes(&self) -> &Arc<NotesStore<S>> {
        &self.notes
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AppContext<store::FileStore> {
    /// Context persisted to `storage.dir`, or the platform data directory
    /// when it is empty.
    pub fn open(config: AppConfig, services: Services) -> Result<Self, ConfigError> {
        config.validate()?;
        let kv = if config.storage.dir.is_empty() {
            store::FileStore::default_location()
        } else {
            store::FileStore::new(std::path::PathBuf::from(&config.storage.dir))
        };
        tracing::debug!(dir = %kv.base().display(), "opening file storage");
        Self::new(kv, config, services)
    }
}

#[cfg(all(target_arch = "wasm32", feature = "web"))]
impl AppContext<store::LocalStore> {
    /// Context persisted to the browser's `localStorage`.
    pub fn open(config: AppConfig, services: Services) -> Result<Self, ConfigError> {
        Self::new(store::LocalStore::new(), config, services)
    }
}
