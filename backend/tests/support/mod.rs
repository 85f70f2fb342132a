//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use access_dashboard::db::repositories::LocalRepository;
use access_dashboard::models::{AccessResult, AccessType, NewAccessEvent, UserId};
use access_dashboard::services::ManualClock;
use chrono::{DateTime, TimeZone, Utc};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment, since tests run in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Monday 2025-03-10 12:00 UTC.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(reference_now()))
}

pub fn entry(user: i64, timestamp: DateTime<Utc>) -> NewAccessEvent {
    NewAccessEvent::entry_at(timestamp).with_user(UserId::new(user))
}

pub fn denied_exit(user: i64, timestamp: DateTime<Utc>) -> NewAccessEvent {
    NewAccessEvent {
        access_type: AccessType::Exit,
        result: AccessResult::Denied,
        ..entry(user, timestamp)
    }
}

/// Two Monday-morning entries, one Saturday-night exit and one entry a
/// month before [`reference_now`].
pub fn sample_repository() -> LocalRepository {
    LocalRepository::with_access_events(vec![
        entry(1, at(2025, 3, 10, 9, 15)),
        entry(2, at(2025, 3, 10, 10, 45)),
        denied_exit(1, at(2025, 3, 8, 22, 30)),
        entry(3, at(2025, 2, 1, 14, 0)),
    ])
}
