//! Pure view derivations over the stores' data.

use chrono::{DateTime, Utc};
use store::{Note, User};

/// Shown when there is no name to take initials from.
pub const FALLBACK_INITIAL: &str = "U";

/// Notes with a reminder, split around a reference time. Both halves are
/// sorted by reminder, earliest first.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReminderPartition<'a> {
    /// Reminder strictly after `now`
    pub upcoming: Vec<&'a Note>,
    /// Reminder at or before `now`
    pub past: Vec<&'a Note>,
}

impl ReminderPartition<'_> {
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.past.is_empty()
    }

    pub fn len(&self) -> usize {
        self.upcoming.len() + self.past.len()
    }
}

pub fn partition_reminders(notes: &[Note], now: DateTime<Utc>) -> ReminderPartition<'_> {
    let mut with_reminder: Vec<(&Note, DateTime<Utc>)> = notes
        .iter()
        .filter_map(|note| note.reminder.map(|at| (note, at)))
        .collect();
    // Stable: equal reminders keep collection order.
    with_reminder.sort_by_key(|(_, at)| *at);

    let (upcoming, past): (Vec<_>, Vec<_>) =
        with_reminder.into_iter().partition(|(_, at)| *at > now);

    ReminderPartition {
        upcoming: upcoming.into_iter().map(|(note, _)| note).collect(),
        past: past.into_iter().map(|(note, _)| note).collect(),
    }
}

/// First letter of each word, upper-cased, at most two characters.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    if letters.is_empty() {
        FALLBACK_INITIAL.to_string()
    } else {
        letters
    }
}

/// Initials of the session user, or the fallback when logged out.
pub fn user_initials(user: Option<&User>) -> String {
    user.map(|u| initials(&u.name))
        .unwrap_or_else(|| FALLBACK_INITIAL.to_string())
}

/// Display name derived from an email address: its local part.
pub fn display_name_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
