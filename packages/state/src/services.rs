//! Collaborators injected into the stores: notification sink, randomness, time.
//!
//! Production code uses [`Services::default`]. Tests swap in
//! [`SequentialRandom`] and [`ManualClock`] to get predictable ids, colors and
//! timestamps.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::notify::{Notifier, TracingNotifier};

/// Source of fresh ids and uniform choices.
pub trait RandomSource: Send + Sync {
    /// A new identifier, unique with overwhelming probability.
    fn id(&self) -> String;

    /// An index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// UUID v4 ids (32 lowercase hex chars) and `rand::thread_rng` choices.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic ids (`"<prefix>-1"`, `"<prefix>-2"`, ...) and round-robin picks.
#[derive(Debug)]
pub struct SequentialRandom {
    prefix: String,
    next_id: AtomicU64,
    next_pick: AtomicUsize,
}

impl SequentialRandom {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next_id: AtomicU64::new(1),
            next_pick: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for SequentialRandom {
    fn id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{}-{n}", self.prefix)
    }

    fn pick(&self, len: usize) -> usize {
        self.next_pick.fetch_add(1, Ordering::SeqCst) % len
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = t;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bundle of collaborators shared by both stores.
#[derive(Clone)]
pub struct Services {
    pub notifier: Arc<dyn Notifier>,
    pub random: Arc<dyn RandomSource>,
    pub clock: Arc<dyn Clock>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            notifier: Arc::new(TracingNotifier),
            random: Arc::new(ThreadRandom),
            clock: Arc::new(SystemClock),
        }
    }
}

impl Services {
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Arc::new(random);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
