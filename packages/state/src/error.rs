//! Error types returned by the session and notes stores.

use store::StoreError;
use thiserror::Error;

/// Failures of [`crate::SessionStore`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Login or signup called with a missing field.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no active session")]
    NotAuthenticated,

    #[error("invalid profile: {0}")]
    InvalidProfile(&'static str),

    #[error("failed to persist session: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures of [`crate::NotesStore`] operations.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("note not found: {0}")]
    NotFound(String),

    #[error("failed to persist notes: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to encode notes: {0}")]
    Encode(#[from] serde_json::Error),
}
