//! Audit log recording with duplicate suppression.
//!
//! Dashboard actions tend to fire the same audit entry several times in a
//! row (double clicks, retried requests, re-rendered views). The recorder
//! keeps a small cache of recently recorded `(user, action)` pairs and skips
//! a write when the same pair was recorded within the dedup window.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{AuditEvent, NewAuditEvent, UserId};
use crate::services::clock::Clock;

pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 30;
pub const DEFAULT_DEDUP_CAPACITY: usize = 1024;

type DedupKey = (Option<UserId>, String);

/// Bounded map of recently recorded `(user, action)` pairs.
///
/// Entries older than the window are purged on every check. When the cache is
/// full the entry recorded longest ago is evicted to make room.
#[derive(Debug)]
pub struct AuditDedupCache {
    window: Duration,
    capacity: usize,
    seen: HashMap<DedupKey, DateTime<Utc>>,
}

impl AuditDedupCache {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            seen: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Returns `true` and remembers the pair when it was not seen within the
    /// window ending at `now`; returns `false` for a duplicate.
    pub fn check_and_insert(&mut self, user_id: Option<UserId>, action: &str, now: DateTime<Utc>) -> bool {
        let window = self.window;
        self.seen.retain(|_, at| now - *at < window);

        let key = (user_id, action.to_string());
        if self.seen.contains_key(&key) {
            return false;
        }

        if self.seen.len() >= self.capacity {
            if let Some(oldest) = self
                .seen
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(k, _)| k.clone())
            {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key, now);
        true
    }

    /// Forget a pair, used when the write it guarded failed.
    pub fn forget(&mut self, user_id: Option<UserId>, action: &str) {
        self.seen.remove(&(user_id, action.to_string()));
    }
}

impl Default for AuditDedupCache {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS as i64),
            DEFAULT_DEDUP_CAPACITY,
        )
    }
}

/// Outcome of [`AuditRecorder::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Recorded(AuditEvent),
    /// An identical entry was recorded within the dedup window.
    Suppressed,
}

impl AuditOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditOutcome::Recorded(_))
    }
}

/// Writes audit events through the repository, skipping recent duplicates.
///
/// The cache lock is held until the repository write completes, so an
/// identical request arriving meanwhile waits for the outcome: it is
/// suppressed if the first write succeeded and written itself if it failed.
pub struct AuditRecorder {
    repo: Arc<dyn FullRepository>,
    clock: Arc<dyn Clock>,
    cache: Mutex<AuditDedupCache>,
}

impl AuditRecorder {
    pub fn new(repo: Arc<dyn FullRepository>, clock: Arc<dyn Clock>, cache: AuditDedupCache) -> Self {
        Self {
            repo,
            clock,
            cache: Mutex::new(cache),
        }
    }

    /// Record `action` for `user_id`, stamped with the clock's current time.
    pub async fn record(&self, user_id: Option<UserId>, action: &str) -> RepositoryResult<AuditOutcome> {
        let action = action.trim();
        if action.is_empty() {
            return Err(RepositoryError::validation("Audit action must not be empty")
                .with_operation("record_audit_event")
                .with_entity("auditoria"));
        }

        let mut cache = self.cache.lock().await;
        let now = self.clock.now();
        if !cache.check_and_insert(user_id, action, now) {
            warn!(
                "Suppressed duplicate audit event: user={:?}, action={}",
                user_id.map(|u| u.value()),
                action
            );
            return Ok(AuditOutcome::Suppressed);
        }

        let new_event = NewAuditEvent {
            user_id,
            action: action.to_string(),
            timestamp: now,
        };
        match self.repo.insert_audit_event(new_event).await {
            Ok(event) => {
                info!("Recorded audit event {}: {}", event.id, event.action);
                Ok(AuditOutcome::Recorded(event))
            }
            Err(e) => {
                cache.forget(user_id, action);
                Err(e)
            }
        }
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder")
            .field("clock", &self.clock)
            .field("cache", &self.cache)
            .finish()
    }
}
