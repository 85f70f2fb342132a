//! In-memory repository.
//!
//! Stores access and audit events in plain maps behind a `parking_lot`
//! lock. Used for local development (optionally seeded with demo traffic)
//! and by the test suite, where it gives fast, isolated, deterministic
//! storage with the same semantics as the Postgres backend.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::{
    AccessLogRepository, AuditRepository, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{
    AccessEvent, AccessEventId, ActionCount, AuditEvent, AuditEventId, AuditFilter,
    NewAccessEvent, NewAuditEvent, Page, PageRequest, UserId,
};
use crate::services::heatmap::{RawHourlyCount, Weekday};

/// In-memory repository.
///
/// Cloning is cheap and clones share the same store.
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    access_events: HashMap<AccessEventId, AccessEvent>,
    audit_events: HashMap<AuditEventId, AuditEvent>,
    next_access_id: i64,
    next_audit_id: i64,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            access_events: HashMap::new(),
            audit_events: HashMap::new(),
            next_access_id: 1,
            next_audit_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Repository pre-populated with `events`, ids assigned in order.
    pub fn with_access_events(events: impl IntoIterator<Item = NewAccessEvent>) -> Self {
        let repo = Self::new();
        repo.extend_access_events(events);
        repo
    }

    /// Bulk insert used for seeding. Returns the number of events stored.
    pub fn extend_access_events(&self, events: impl IntoIterator<Item = NewAccessEvent>) -> usize {
        let mut data = self.data.write();
        let mut stored = 0;
        for event in events {
            let id = AccessEventId(data.next_access_id);
            data.next_access_id += 1;
            data.access_events.insert(id, event.into_event(id));
            stored += 1;
        }
        stored
    }

    /// Simulate a lost connection. While unhealthy every call fails with a
    /// retryable connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Remove all events, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    pub fn access_event_count(&self) -> usize {
        self.data.read().access_events.len()
    }

    pub fn audit_event_count(&self) -> usize {
        self.data.read().audit_events.len()
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }

    fn newest_first_access(events: impl Iterator<Item = AccessEvent>) -> Vec<AccessEvent> {
        let mut events: Vec<AccessEvent> = events.collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        events
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessLogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_access_event(&self, event: NewAccessEvent) -> RepositoryResult<AccessEvent> {
        self.check_health("insert_access_event")?;
        let mut data = self.data.write();
        let id = AccessEventId(data.next_access_id);
        data.next_access_id += 1;
        let stored = event.into_event(id);
        data.access_events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_access_event(&self, id: AccessEventId) -> RepositoryResult<AccessEvent> {
        self.check_health("get_access_event")?;
        self.data.read().access_events.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Access event {} not found", id),
                ErrorContext::new("get_access_event")
                    .with_entity("access_logs")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_access_events(&self, page: PageRequest) -> RepositoryResult<Page<AccessEvent>> {
        self.check_health("list_access_events")?;
        let data = self.data.read();
        let ordered = Self::newest_first_access(data.access_events.values().cloned());
        Ok(Page::from_ordered(ordered, page))
    }

    async fn list_access_events_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> RepositoryResult<Page<AccessEvent>> {
        self.check_health("list_access_events_for_user")?;
        let data = self.data.read();
        let ordered = Self::newest_first_access(
            data.access_events
                .values()
                .filter(|e| e.user_id == Some(user_id))
                .cloned(),
        );
        Ok(Page::from_ordered(ordered, page))
    }

    async fn fetch_hourly_access_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<RawHourlyCount>> {
        self.check_health("fetch_hourly_access_counts")?;
        let data = self.data.read();
        let mut grouped: BTreeMap<(u32, usize), i64> = BTreeMap::new();
        for event in data
            .access_events
            .values()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
        {
            let day = Weekday::from(event.timestamp.weekday());
            *grouped
                .entry((event.timestamp.hour(), day.index()))
                .or_insert(0) += 1;
        }
        Ok(grouped
            .into_iter()
            .map(|((hour, day), count)| RawHourlyCount::new(hour as i64, day as i64, count))
            .collect())
    }
}

#[async_trait]
impl AuditRepository for LocalRepository {
    async fn insert_audit_event(&self, event: NewAuditEvent) -> RepositoryResult<AuditEvent> {
        self.check_health("insert_audit_event")?;
        let mut data = self.data.write();
        let id = AuditEventId(data.next_audit_id);
        data.next_audit_id += 1;
        let stored = event.into_event(id);
        data.audit_events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_audit_event(&self, id: AuditEventId) -> RepositoryResult<AuditEvent> {
        self.check_health("get_audit_event")?;
        self.data.read().audit_events.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Audit event {} not found", id),
                ErrorContext::new("get_audit_event")
                    .with_entity("auditoria")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_audit_events(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<AuditEvent>> {
        self.check_health("list_audit_events")?;
        let data = self.data.read();
        let mut events: Vec<AuditEvent> = data
            .audit_events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(Page::from_ordered(events, page))
    }

    async fn count_audit_events(&self) -> RepositoryResult<u64> {
        self.check_health("count_audit_events")?;
        Ok(self.data.read().audit_events.len() as u64)
    }

    async fn count_audit_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<u64> {
        self.check_health("count_audit_events_between")?;
        Ok(self
            .data
            .read()
            .audit_events
            .values()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
            .count() as u64)
    }

    async fn top_audit_actions(&self, limit: usize) -> RepositoryResult<Vec<ActionCount>> {
        self.check_health("top_audit_actions")?;
        let data = self.data.read();
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for event in data.audit_events.values() {
            *counts.entry(event.action.as_str()).or_insert(0) += 1;
        }
        let mut ranked: Vec<ActionCount> = counts
            .into_iter()
            .map(|(action, count)| ActionCount {
                action: action.to_string(),
                count,
            })
            .collect();
        // Ties in byte order, matching COLLATE "C" on Postgres.
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action.cmp(&b.action)));
        ranked.truncate(limit);
        Ok(ranked)
    }
}
