//! # Domain models for users, notes and session status
//!
//! Defines the records persisted through [`crate::KeyValueStore`] and the input
//! types accepted by the note store. The persisted types are
//! `Serialize + Deserialize` and keep the browser layout: camelCase field names,
//! RFC 3339 timestamps, optional fields omitted when absent.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`User`] | The current session user, stored under the `"user"` key. |
//! | [`Note`] | One note of the collection stored under the `"notes"` key. |
//! | [`NoteDraft`] | Caller input for creating a note. Identity and timestamps are assigned by the store. |
//! | [`NotePatch`] | Caller input for updating a note. Only content fields can be patched. |
//! | [`AuthStatus`] | Tri-state session gate: `Loading`, `Authenticated`, `Unauthenticated`. |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user of the current browser profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A note owned by a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Style tag from the configured palette, e.g. `"bg-gradient-primary"`
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<DateTime<Utc>>,
    /// Id of the session user at creation, empty when created without a session
    pub user_id: String,
}

impl Note {
    pub fn has_reminder(&self) -> bool {
        self.reminder.is_some()
    }

    /// Apply the content fields of `patch`. Identity, ownership and timestamps
    /// are left to the caller.
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(reminder) = patch.reminder {
            self.reminder = reminder;
        }
    }
}

/// Input for creating a note.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    /// Empty string lets the store pick a palette color
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<DateTime<Utc>>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_reminder(mut self, reminder: DateTime<Utc>) -> Self {
        self.reminder = Some(reminder);
        self
    }
}

/// Partial update of an existing note, addressed by id.
///
/// `reminder` is two-level: `None` keeps the current reminder, `Some(None)`
/// clears it, `Some(Some(t))` sets it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub reminder: Option<Option<DateTime<Utc>>>,
}

impl NotePatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn reminder(mut self, reminder: Option<DateTime<Utc>>) -> Self {
        self.reminder = Some(reminder);
        self
    }
}

/// Session status. Starts as `Loading` and only ever moves to one of the
/// two settled states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthStatus {
    #[default]
    Loading,
    Authenticated,
    Unauthenticated,
}

impl AuthStatus {
    pub fn is_authenticated(self) -> bool {
        self == AuthStatus::Authenticated
    }

    pub fn is_settled(self) -> bool {
        self != AuthStatus::Loading
    }
}
