//! # State crate — session and notes stores for ChromaCards
//!
//! Client-side state of the note application: who is logged in, which notes
//! exist, and the views derived from them. Both stores persist through a
//! [`store::KeyValueStore`] and notify subscribers after every successful
//! mutation, so a UI layer re-derives what it shows instead of reaching into
//! global state.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`session`] | [`SessionStore`]: restore, login, signup, logout, profile update |
//! | [`notes`] | [`NotesStore`]: list, get, add, update, delete |
//! | [`views`] | Pure derivations: reminder partitioning, initials |
//! | [`notify`] | Toast-style notification side channel and its sinks |
//! | [`observe`] | Synchronous subscriber lists with unsubscribe handles |
//! | [`services`] | Injectable random source and clock |
//! | [`context`] | [`AppContext`], the handle threaded to every consumer |
//! | [`error`] | Error types returned by the stores |

pub mod context;
pub mod error;
pub mod notes;
pub mod notify;
pub mod observe;
pub mod services;
pub mod session;
pub mod views;

pub use context::AppContext;
pub use error::{NoteError, SessionError};
pub use notes::{NotesEvent, NotesStore};
pub use notify::{ActivityLog, Notification, Notifier, TracingNotifier, Variant};
pub use observe::{Observers, Subscription};
pub use services::{Clock, ManualClock, RandomSource, SequentialRandom, Services, SystemClock, ThreadRandom};
pub use session::{CurrentUser, SessionEvent, SessionStore};
pub use views::{initials, partition_reminders, user_initials, ReminderPartition};

pub use store::{AppConfig, AuthStatus, ConfigError, KeyValueStore, Note, NoteDraft, NotePatch, User};
