//! # Notes store — the note collection of the browser profile
//!
//! [`NotesStore`] owns the ordered list of [`Note`]s and persists it as one
//! JSON array under the `"notes"` key. It reads the session user's id through
//! [`CurrentUser`] to stamp ownership on new notes; it never owns the session.
//!
//! ## Operations
//!
//! | Method | Effect |
//! |--------|--------|
//! | [`list`](NotesStore::list) | All notes in insertion order (only the session user's when `notes.scope_to_user` is set) |
//! | [`list_owned`](NotesStore::list_owned) | Notes whose `user_id` is the session user's |
//! | [`get`](NotesStore::get) | One note by id |
//! | [`add`](NotesStore::add) | Assigns id, timestamps, owner and (if empty) a palette color, then appends |
//! | [`update`](NotesStore::update) | Patches content fields and refreshes `updated_at` |
//! | [`delete`](NotesStore::delete) | Removes a note |
//!
//! ## Writes
//!
//! Each mutation runs on a copy of the collection; the copy is persisted with a
//! whole-record overwrite and only then replaces the in-memory list. A failed
//! write, or an unknown id, leaves both untouched. Every outcome is reported
//! through the notifier and returned to the caller.
//!
//! ## Unreadable records
//!
//! The record is parsed entry by entry. Entries that fail to parse are
//! skipped with a warning; a record that is not a JSON array loads as empty.
//! In both cases the original text is copied to `<notes_key>-corrupt` right
//! before the first overwrite, so nothing is lost silently.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use store::config::DEFAULT_PALETTE;
use store::{AppConfig, KeyValueStore, Note, NoteDraft, NotePatch};

use crate::error::NoteError;
use crate::notify::Notification;
use crate::observe::{Observers, Subscription};
use crate::services::Services;
use crate::session::CurrentUser;

/// Change events emitted by [`NotesStore`], carrying the note id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotesEvent {
    Added(String),
    Updated(String),
    Deleted(String),
}

pub struct NotesStore<S: KeyValueStore> {
    kv: S,
    key: String,
    palette: Vec<String>,
    scope_to_user: bool,
    session: Arc<dyn CurrentUser>,
    services: Services,
    notes: Mutex<Vec<Note>>,
    /// Raw record that failed to load cleanly, kept until it is backed up.
    unreadable: Mutex<Option<String>>,
    observers: Observers<NotesEvent>,
}

impl<S: KeyValueStore> NotesStore<S> {
    /// Open the store and load the persisted collection.
    pub fn new(
        kv: S,
        config: &AppConfig,
        session: Arc<dyn CurrentUser>,
        services: Services,
    ) -> Self {
        let key = config.storage.notes_key.clone();
        let (notes, unreadable) = load_notes(&kv, &key);
        let palette = if config.notes.palette.is_empty() {
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            config.notes.palette.clone()
        };
        tracing::debug!(count = notes.len(), "notes loaded");

        Self {
            kv,
            key,
            palette,
            scope_to_user: config.notes.scope_to_user,
            session,
            services,
            notes: Mutex::new(notes),
            unreadable: Mutex::new(unreadable),
            observers: Observers::new(),
        }
    }

    pub fn list(&self) -> Vec<Note> {
        if self.scope_to_user {
            self.list_owned()
        } else {
            self.lock().clone()
        }
    }

    pub fn list_owned(&self) -> Vec<Note> {
        let owner = self.session.user_id().unwrap_or_default();
        self.lock()
            .iter()
            .filter(|n| n.user_id == owner)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        self.lock().iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&NotesEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    pub fn add(&self, draft: NoteDraft) -> Result<Note, NoteError> {
        let now = self.services.clock.now();
        let user_id = self.session.user_id().unwrap_or_default();
        let color = if draft.color.is_empty() {
            let idx = self.services.random.pick(self.palette.len());
            self.palette[idx].clone()
        } else {
            draft.color
        };

        let result = self.mutate(|notes| {
            let mut id = self.services.random.id();
            while notes.iter().any(|n| n.id == id) {
                id = self.services.random.id();
            }
            let note = Note {
                id,
                title: draft.title,
                content: draft.content,
                color,
                created_at: now,
                updated_at: now,
                reminder: draft.reminder,
                user_id,
            };
            notes.push(note.clone());
            Ok(note)
        });

        self.report(
            &result,
            ("Note created", "Your note has been created successfully."),
            ("Failed to create note", "There was an error creating your note."),
            |note| NotesEvent::Added(note.id.clone()),
        );
        result
    }

    pub fn update(&self, patch: NotePatch) -> Result<Note, NoteError> {
        let now = self.services.clock.now();

        let result = self.mutate(|notes| {
            let note = notes
                .iter_mut()
                .find(|n| n.id == patch.id)
                .ok_or_else(|| NoteError::NotFound(patch.id.clone()))?;
            note.apply(&patch);
            // Never move backwards, even if the clock does.
            note.updated_at = now.max(note.updated_at);
            Ok(note.clone())
        });

        self.report(
            &result,
            ("Note updated", "Your note has been updated successfully."),
            ("Failed to update note", "There was an error updating your note."),
            |note| NotesEvent::Updated(note.id.clone()),
        );
        result
    }

    pub fn delete(&self, id: &str) -> Result<Note, NoteError> {
        let result = self.mutate(|notes| {
            let idx = notes
                .iter()
                .position(|n| n.id == id)
                .ok_or_else(|| NoteError::NotFound(id.to_string()))?;
            Ok(notes.remove(idx))
        });

        self.report(
            &result,
            ("Note deleted", "Your note has been deleted successfully."),
            ("Failed to delete note", "There was an error deleting your note."),
            |note| NotesEvent::Deleted(note.id.clone()),
        );
        result
    }

    /// Apply `change` to a copy of the collection, persist the copy, then
    /// swap it in.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Note>) -> Result<T, NoteError>,
    ) -> Result<T, NoteError> {
        let mut notes = self.lock();
        let mut next = notes.clone();
        let out = change(&mut next)?;

        let raw = serde_json::to_string(&next)?;
        let mut unreadable = self
            .unreadable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(original) = unreadable.as_deref() {
            let backup_key = self.backup_key();
            self.kv.set(&backup_key, original)?;
            tracing::warn!(key = %backup_key, "backed up unreadable notes record");
        }
        self.kv.set(&self.key, &raw)?;
        *unreadable = None;
        *notes = next;
        Ok(out)
    }

    /// Key the original record is copied to before an unreadable record is
    /// first overwritten.
    pub fn backup_key(&self) -> String {
        format!("{}-corrupt", self.key)
    }

    fn report(
        &self,
        result: &Result<Note, NoteError>,
        success: (&str, &str),
        failure: (&str, &str),
        event: impl FnOnce(&Note) -> NotesEvent,
    ) {
        match result {
            Ok(note) => {
                tracing::debug!(note_id = %note.id, "{}", success.0);
                self.services
                    .notifier
                    .notify(Notification::info(success.0, success.1));
                self.observers.emit(&event(note));
            }
            Err(e) => {
                tracing::warn!(error = %e, "{}", failure.0);
                self.services
                    .notifier
                    .notify(Notification::failure(failure.0, failure.1));
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Note>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Load the collection entry by entry. Entries that don't parse are skipped;
/// when any are, the raw record is returned alongside for backup.
fn load_notes<S: KeyValueStore>(kv: &S, key: &str) -> (Vec<Note>, Option<String>) {
    let Some(raw) = kv.get(key) else {
        return (Vec::new(), None);
    };
    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "malformed notes record, starting empty");
            return (Vec::new(), Some(raw));
        }
    };

    let total = entries.len();
    let notes: Vec<Note> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
            Ok(note) => Some(note),
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "skipping unreadable note");
                None
            }
        })
        .collect();

    if notes.len() == total {
        (notes, None)
    } else {
        (notes, Some(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ActivityLog;
    use crate::services::{ManualClock, SequentialRandom};
    use crate::views::partition_reminders;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use store::{MemoryStore, StoreError};

    struct Fixed(Option<String>);

    impl CurrentUser for Fixed {
        fn user_id(&self) -> Option<String> {
            self.0.clone()
        }
    }

    /// MemoryStore whose writes can be switched off.
    #[derive(Clone, Default)]
    struct Flaky {
        inner: MemoryStore,
        failing: Arc<AtomicBool>,
    }

    impl KeyValueStore for Flaky {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("quota exceeded".to_string()));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    struct Fixture {
        store: NotesStore<MemoryStore>,
        kv: MemoryStore,
        log: ActivityLog,
        clock: ManualClock,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn fixture_with(kv: MemoryStore, config: AppConfig, user: Option<&str>) -> Fixture {
        let log = ActivityLog::new();
        let clock = ManualClock::new(start());
        let services = Services::default()
            .with_notifier(log.clone())
            .with_random(SequentialRandom::new("note"))
            .with_clock(clock.clone());
        let session = Arc::new(Fixed(user.map(str::to_string)));
        let store = NotesStore::new(kv.clone(), &config, session, services);
        Fixture {
            store,
            kv,
            log,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MemoryStore::new(), AppConfig::default(), Some("u-1"))
    }

    #[test]
    fn test_add_assigns_identity_and_color() {
        let f = fixture();

        let note = f
            .store
            .add(NoteDraft {
                title: "T".to_string(),
                content: "C".to_string(),
                color: String::new(),
                reminder: None,
            })
            .unwrap();

        let notes = f.store.list();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0], note);
        assert_eq!(note.title, "T");
        assert_eq!(note.content, "C");
        assert!(DEFAULT_PALETTE.contains(&note.color.as_str()));
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.created_at, start());
        assert_eq!(note.user_id, "u-1");
        assert_eq!(note.id, "note-1");

        let last = f.log.last().unwrap();
        assert_eq!(last.title, "Note created");
        assert!(!last.is_failure());
    }

    #[test]
    fn test_add_keeps_caller_color_and_reminder() {
        let f = fixture();
        let at = start() + Duration::days(2);

        let note = f
            .store
            .add(
                NoteDraft::new("Dentist", "Bring x-rays")
                    .with_color("bg-gradient-danger")
                    .with_reminder(at),
            )
            .unwrap();

        assert_eq!(note.color, "bg-gradient-danger");
        assert_eq!(note.reminder, Some(at));
    }

    #[test]
    fn test_add_without_session_has_empty_owner() {
        let f = fixture_with(MemoryStore::new(), AppConfig::default(), None);
        let note = f.store.add(NoteDraft::new("Anon", "")).unwrap();
        assert_eq!(note.user_id, "");
    }

    #[test]
    fn test_add_skips_taken_ids() {
        let kv = MemoryStore::new();
        let seeded = fixture_with(kv.clone(), AppConfig::default(), Some("u-1"));
        seeded.store.add(NoteDraft::new("first", "")).unwrap();

        // A fresh generator starts at note-1 again
        let f = fixture_with(kv, AppConfig::default(), Some("u-1"));
        let second = f.store.add(NoteDraft::new("second", "")).unwrap();

        assert_eq!(second.id, "note-2");
        assert_eq!(f.store.len(), 2);
    }

    #[test]
    fn test_list_keeps_insertion_order_and_persists() {
        let f = fixture();
        for title in ["a", "b", "c"] {
            f.store.add(NoteDraft::new(title, "")).unwrap();
            f.clock.advance(Duration::minutes(1));
        }

        let titles: Vec<String> = f.store.list().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);

        // Reopen over the same storage
        let reopened = fixture_with(f.kv.clone(), AppConfig::default(), Some("u-1"));
        assert_eq!(reopened.store.list(), f.store.list());

        let raw = f.kv.get("notes").unwrap();
        assert!(raw.contains("\"createdAt\""));
    }

    #[test]
    fn test_update_changes_only_patched_fields() {
        let f = fixture();
        let original = f.store.add(NoteDraft::new("Old", "Body")).unwrap();
        f.clock.advance(Duration::seconds(30));

        let updated = f
            .store
            .update(NotePatch::new(original.id.clone()).title("New"))
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, "Body");
        assert_eq!(updated.color, original.color);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.user_id, original.user_id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.updated_at, start() + Duration::seconds(30));
        assert_eq!(f.store.get(&original.id), Some(updated));
        assert_eq!(f.log.last().unwrap().title, "Note updated");
    }

    #[test]
    fn test_update_never_moves_updated_at_backwards() {
        let f = fixture();
        let note = f.store.add(NoteDraft::new("x", "")).unwrap();

        f.clock.set(start() - Duration::hours(1));
        let updated = f
            .store
            .update(NotePatch::new(note.id.clone()).content("y"))
            .unwrap();

        assert_eq!(updated.updated_at, note.updated_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[test]
    fn test_update_can_clear_reminder() {
        let f = fixture();
        let note = f
            .store
            .add(NoteDraft::new("x", "").with_reminder(start() + Duration::days(1)))
            .unwrap();

        let updated = f
            .store
            .update(NotePatch::new(note.id).reminder(None))
            .unwrap();
        assert!(!updated.has_reminder());
    }

    #[test]
    fn test_update_unknown_id() {
        let f = fixture();
        f.store.add(NoteDraft::new("keep", "")).unwrap();
        let before = f.store.list();
        let stored_before = f.kv.get("notes");

        let err = f
            .store
            .update(NotePatch::new("missing").title("New"))
            .unwrap_err();

        assert!(matches!(err, NoteError::NotFound(ref id) if id == "missing"));
        assert_eq!(f.store.list(), before);
        assert_eq!(f.kv.get("notes"), stored_before);
        let last = f.log.last().unwrap();
        assert_eq!(last.title, "Failed to update note");
        assert!(last.is_failure());
    }

    #[test]
    fn test_delete() {
        let f = fixture();
        let a = f.store.add(NoteDraft::new("a", "")).unwrap();
        let b = f.store.add(NoteDraft::new("b", "")).unwrap();

        let removed = f.store.delete(&a.id).unwrap();

        assert_eq!(removed.id, a.id);
        assert_eq!(f.store.list(), vec![b]);
        assert!(f.store.get(&a.id).is_none());
        assert_eq!(f.log.last().unwrap().title, "Note deleted");
    }

    #[test]
    fn test_delete_unknown_id() {
        let f = fixture();
        f.store.add(NoteDraft::new("a", "")).unwrap();
        let before = f.store.list();

        let err = f.store.delete("missing").unwrap_err();

        assert!(matches!(err, NoteError::NotFound(_)));
        assert_eq!(f.store.list(), before);
        assert_eq!(f.log.last().unwrap().title, "Failed to delete note");
    }

    #[test]
    fn test_malformed_record_starts_empty() {
        let kv = MemoryStore::new();
        kv.set("notes", "[{\"id\": 12").unwrap();

        let f = fixture_with(kv, AppConfig::default(), Some("u-1"));
        assert!(f.store.is_empty());

        f.store.add(NoteDraft::new("fresh", "")).unwrap();
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.kv.get("notes-corrupt").as_deref(), Some("[{\"id\": 12"));
    }

    #[test]
    fn test_unreadable_entry_does_not_drop_the_others() {
        let kv = MemoryStore::new();
        let raw = r#"[
            {"id":"a","title":"keep me","content":"","color":"bg-gradient-primary",
             "createdAt":"2024-05-01T00:00:00Z","updatedAt":"2024-05-01T00:00:00Z","userId":"u-1"},
            {"id":"b","title":"broken","content":"","color":"bg-gradient-primary",
             "createdAt":"2024-05-01T00:00:00Z","updatedAt":"2024-05-01T00:00:00Z",
             "reminder":"","userId":"u-1"}
        ]"#;
        kv.set("notes", raw).unwrap();

        let f = fixture_with(kv, AppConfig::default(), Some("u-1"));
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.store.get("a").unwrap().title, "keep me");
        // Nothing is written until the first mutation
        assert!(f.kv.get("notes-corrupt").is_none());

        f.store.add(NoteDraft::new("new", "")).unwrap();
        assert_eq!(f.store.len(), 2);

        let persisted: Vec<Note> = serde_json::from_str(&f.kv.get("notes").unwrap()).unwrap();
        assert!(persisted.iter().any(|n| n.title == "keep me"));
        assert_eq!(f.kv.get("notes-corrupt").as_deref(), Some(raw));

        // The backup is only taken once
        f.kv.set("notes-corrupt", "seen").unwrap();
        f.store.add(NoteDraft::new("later", "")).unwrap();
        assert_eq!(f.kv.get("notes-corrupt").as_deref(), Some("seen"));
    }

    #[test]
    fn test_failed_backup_keeps_original_record() {
        let kv = Flaky::default();
        kv.inner.set("notes", "not json").unwrap();
        let session = Arc::new(Fixed(Some("u-1".to_string())));
        let store = NotesStore::new(kv.clone(), &AppConfig::default(), session, Services::default());

        kv.failing.store(true, Ordering::SeqCst);
        assert!(store.add(NoteDraft::new("x", "")).is_err());
        assert_eq!(kv.get("notes").as_deref(), Some("not json"));

        kv.failing.store(false, Ordering::SeqCst);
        store.add(NoteDraft::new("x", "")).unwrap();
        assert_eq!(kv.get("notes-corrupt").as_deref(), Some("not json"));
    }

    #[test]
    fn test_palette_from_config() {
        let f = fixture();
        assert_eq!(f.store.palette().len(), DEFAULT_PALETTE.len());

        let mut config = AppConfig::default();
        config.notes.palette = vec!["bg-mint".to_string(), "bg-sand".to_string()];
        let f = fixture_with(MemoryStore::new(), config, Some("u-1"));
        assert_eq!(f.store.palette(), ["bg-mint", "bg-sand"]);

        let first = f.store.add(NoteDraft::new("one", "")).unwrap();
        let second = f.store.add(NoteDraft::new("two", "")).unwrap();
        assert_eq!(first.color, "bg-mint");
        assert_eq!(second.color, "bg-sand");
    }

    #[test]
    fn test_failed_write_leaves_collection_unchanged() {
        let kv = Flaky::default();
        let log = ActivityLog::new();
        let store = NotesStore::new(
            kv.clone(),
            &AppConfig::default(),
            Arc::new(Fixed(Some("u-1".to_string()))),
            Services::default().with_notifier(log.clone()),
        );
        let kept = store.add(NoteDraft::new("kept", "")).unwrap();

        kv.failing.store(true, Ordering::SeqCst);
        let err = store.add(NoteDraft::new("lost", "")).unwrap_err();
        assert!(matches!(err, NoteError::Storage(_)));
        assert!(store.delete(&kept.id).is_err());

        assert_eq!(store.list(), vec![kept]);
        assert_eq!(log.last().unwrap().title, "Failed to delete note");
    }

    #[test]
    fn test_scope_to_user() {
        let kv = MemoryStore::new();
        let ada = fixture_with(kv.clone(), AppConfig::default(), Some("ada"));
        ada.store.add(NoteDraft::new("ada's", "")).unwrap();

        let grace = fixture_with(
            kv.clone(),
            AppConfig::default().with_scope_to_user(true),
            Some("grace"),
        );
        grace.store.add(NoteDraft::new("grace's", "")).unwrap();

        let titles: Vec<String> = grace.store.list().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["grace's"]);
        assert_eq!(grace.store.len(), 2);

        // Unscoped listing still sees everything; list_owned filters regardless
        let unscoped = fixture_with(kv, AppConfig::default(), Some("ada"));
        assert_eq!(unscoped.store.list().len(), 2);
        assert_eq!(unscoped.store.list_owned().len(), 1);
    }

    #[test]
    fn test_subscribers_only_see_successes() {
        let f = fixture();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = f.store.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        let note = f.store.add(NoteDraft::new("a", "")).unwrap();
        f.store
            .update(NotePatch::new(note.id.clone()).title("b"))
            .unwrap();
        let _ = f.store.delete("missing");
        f.store.delete(&note.id).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                NotesEvent::Added(note.id.clone()),
                NotesEvent::Updated(note.id.clone()),
                NotesEvent::Deleted(note.id),
            ]
        );
    }

    #[test]
    fn test_reminder_view_over_store() {
        let f = fixture();
        let now = start();
        f.store
            .add(NoteDraft::new("past", "").with_reminder(now - Duration::days(1)))
            .unwrap();
        f.store
            .add(NoteDraft::new("future", "").with_reminder(now + Duration::days(1)))
            .unwrap();
        f.store.add(NoteDraft::new("plain", "")).unwrap();

        let notes = f.store.list();
        let parts = partition_reminders(&notes, now);
        assert_eq!(parts.upcoming.len(), 1);
        assert_eq!(parts.upcoming[0].title, "future");
        assert_eq!(parts.past.len(), 1);
        assert_eq!(parts.past[0].title, "past");
    }
}
