//! # Session store — who is logged in
//!
//! [`SessionStore`] owns the current [`User`] and the [`AuthStatus`] gate that
//! decides whether protected views are reachable. Authentication is a local
//! mock: any non-empty credentials are accepted after a simulated round trip
//! of [`AuthConfig::latency`](store::config::AuthConfig::latency).
//!
//! ## Lifecycle
//!
//! | Operation | Status after success | Persisted `user` record |
//! |-----------|----------------------|-------------------------|
//! | [`restore`](SessionStore::restore) | `Authenticated` if a valid record exists, else `Unauthenticated` | unchanged, or cleared when malformed |
//! | [`login`](SessionStore::login) / [`signup`](SessionStore::signup) | `Authenticated` | new user |
//! | [`update_profile`](SessionStore::update_profile) | `Authenticated` | patched user |
//! | [`logout`](SessionStore::logout) | `Unauthenticated` | removed |
//!
//! The status starts as `Loading` and never returns to it.
//!
//! ## Failures
//!
//! Every failure is reported twice: as a destructive [`Notification`] and as the
//! returned [`SessionError`], so a form can stay open on error. A failed
//! operation leaves status, user and the persisted record as they were.
//!
//! ## Concurrency
//!
//! `login`, `signup` and `update_profile` suspend for the simulated latency.
//! [`is_loading`](SessionStore::is_loading) is true while at least one of them
//! is pending. Overlapping calls are not serialised: the one that completes
//! last wins. On native targets the delay uses `tokio::time`, so these futures
//! must be polled inside a Tokio runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use store::{AppConfig, AuthStatus, KeyValueStore, User};

use crate::error::SessionError;
use crate::notify::Notification;
use crate::observe::{Observers, Subscription};
use crate::services::Services;
use crate::views::display_name_from_email;

/// Change events emitted by [`SessionStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Restored(AuthStatus),
    LoggedIn(User),
    SignedUp(User),
    ProfileUpdated(User),
    LoggedOut,
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    status: AuthStatus,
}

pub struct SessionStore<S: KeyValueStore> {
    kv: S,
    key: String,
    latency: Duration,
    services: Services,
    state: Mutex<SessionState>,
    pending: AtomicUsize,
    observers: Observers<SessionEvent>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(kv: S, config: &AppConfig, services: Services) -> Self {
        Self {
            kv,
            key: config.storage.user_key.clone(),
            latency: config.auth.latency(),
            services,
            state: Mutex::new(SessionState::default()),
            pending: AtomicUsize::new(0),
            observers: Observers::new(),
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.lock().status
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.lock().user.as_ref().map(|u| u.id.clone())
    }

    /// True while a login, signup or profile update is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    /// Load the persisted session, if any. Called once at startup.
    pub fn restore(&self) -> AuthStatus {
        let restored = match self.kv.get(&self.key) {
            None => None,
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "malformed session record, clearing it");
                    if let Err(e) = self.kv.remove(&self.key) {
                        tracing::warn!(error = %e, "failed to clear malformed session record");
                    }
                    None
                }
            },
        };

        let status = {
            let mut state = self.lock();
            state.status = if restored.is_some() {
                AuthStatus::Authenticated
            } else {
                AuthStatus::Unauthenticated
            };
            state.user = restored;
            state.status
        };
        tracing::info!(?status, "session restored");
        self.observers.emit(&SessionEvent::Restored(status));
        status
    }

    /// Log in with an email and password. Both must be non-empty; nothing else
    /// is checked.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let result = self
            .authenticate(|| {
                if email.is_empty() || password.is_empty() {
                    return Err(SessionError::InvalidCredentials);
                }
                Ok(User {
                    id: self.services.random.id(),
                    email: email.to_string(),
                    name: display_name_from_email(email).to_string(),
                    avatar: None,
                })
            })
            .await;

        match &result {
            Ok(user) => {
                self.notify(Notification::info(
                    "Login successful",
                    format!("Welcome back, {}!", user.name),
                ));
                self.observers.emit(&SessionEvent::LoggedIn(user.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.notify(Notification::failure(
                    "Login failed",
                    "Please check your credentials and try again.",
                ));
            }
        }
        result
    }

    /// Create an account. Name, email and password must all be non-empty.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        let result = self
            .authenticate(|| {
                if name.is_empty() || email.is_empty() || password.is_empty() {
                    return Err(SessionError::InvalidCredentials);
                }
                Ok(User {
                    id: self.services.random.id(),
                    email: email.to_string(),
                    name: name.to_string(),
                    avatar: None,
                })
            })
            .await;

        match &result {
            Ok(user) => {
                self.notify(Notification::info(
                    "Account created",
                    format!("Welcome to ChromaCards, {}!", user.name),
                ));
                self.observers.emit(&SessionEvent::SignedUp(user.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "signup failed");
                self.notify(Notification::failure(
                    "Signup failed",
                    "Please check your information and try again.",
                ));
            }
        }
        result
    }

    /// Change the display name and avatar of the session user.
    pub async fn update_profile(
        &self,
        name: &str,
        avatar: Option<String>,
    ) -> Result<User, SessionError> {
        let result = async {
            let _pending = Pending::enter(&self.pending);
            simulate_latency(self.latency).await;

            let name = name.trim();
            if name.is_empty() {
                return Err(SessionError::InvalidProfile("name must not be empty"));
            }
            let mut user = self.current_user().ok_or(SessionError::NotAuthenticated)?;
            user.name = name.to_string();
            user.avatar = avatar;

            self.commit(user)
        }
        .await;

        match &result {
            Ok(user) => {
                self.notify(Notification::info(
                    "Profile updated",
                    "Your profile has been updated successfully.",
                ));
                self.observers
                    .emit(&SessionEvent::ProfileUpdated(user.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile update failed");
                self.notify(Notification::failure(
                    "Profile update failed",
                    e.to_string(),
                ));
            }
        }
        result
    }

    /// End the session. Safe to call without one.
    pub fn logout(&self) {
        if let Err(e) = self.kv.remove(&self.key) {
            tracing::warn!(error = %e, "failed to remove session record");
        }
        {
            let mut state = self.lock();
            state.user = None;
            state.status = AuthStatus::Unauthenticated;
        }
        tracing::info!("logged out");
        self.notify(Notification::info(
            "Logged out",
            "You have been successfully logged out.",
        ));
        self.observers.emit(&SessionEvent::LoggedOut);
    }

    async fn authenticate(
        &self,
        make_user: impl FnOnce() -> Result<User, SessionError>,
    ) -> Result<User, SessionError> {
        let _pending = Pending::enter(&self.pending);
        simulate_latency(self.latency).await;
        let user = make_user()?;
        self.commit(user)
    }

    /// Persist `user`, then make it the session user.
    fn commit(&self, user: User) -> Result<User, SessionError> {
        let raw = serde_json::to_string(&user)?;
        self.kv.set(&self.key, &raw)?;

        let mut state = self.lock();
        state.user = Some(user.clone());
        state.status = AuthStatus::Authenticated;
        tracing::info!(user_id = %user.id, "session started");
        Ok(user)
    }

    fn notify(&self, notification: Notification) {
        self.services.notifier.notify(notification);
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read access to the session user's id, used to stamp note ownership.
pub trait CurrentUser: Send + Sync {
    fn user_id(&self) -> Option<String>;
}

impl<S: KeyValueStore> CurrentUser for SessionStore<S> {
    fn user_id(&self) -> Option<String> {
        SessionStore::user_id(self)
    }
}

/// Counts an in-flight operation for as long as it is alive.
struct Pending<'a>(&'a AtomicUsize);

impl<'a> Pending<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn simulate_latency(latency: Duration) {
    if latency.is_zero() {
        return;
    }
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(latency).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(latency).await;
}
