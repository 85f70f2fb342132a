//! Audit log (bitácora) repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{
    ActionCount, AuditEvent, AuditEventId, AuditFilter, NewAuditEvent, Page, PageRequest,
};

/// Append-only storage for audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert_audit_event(&self, event: NewAuditEvent) -> RepositoryResult<AuditEvent>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no event has this id
    async fn get_audit_event(&self, id: AuditEventId) -> RepositoryResult<AuditEvent>;

    /// List events matching `filter`, newest first.
    async fn list_audit_events(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<AuditEvent>>;

    async fn count_audit_events(&self) -> RepositoryResult<u64>;

    /// Events with `start <= timestamp < end`.
    async fn count_audit_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<u64>;

    /// The `limit` most frequent actions, by count descending then action
    /// ascending.
    async fn top_audit_actions(&self, limit: usize) -> RepositoryResult<Vec<ActionCount>>;
}
