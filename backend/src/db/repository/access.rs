//! Access log repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{AccessEvent, AccessEventId, NewAccessEvent, Page, PageRequest, UserId};
use crate::services::heatmap::RawHourlyCount;

/// Storage for gate access events.
///
/// Events are append-only: there is no update or delete.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait AccessLogRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Persist a new event and return it with its assigned id.
    async fn insert_access_event(&self, event: NewAccessEvent) -> RepositoryResult<AccessEvent>;

    /// Fetch one event.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no event has this id
    async fn get_access_event(&self, id: AccessEventId) -> RepositoryResult<AccessEvent>;

    /// List events newest first.
    async fn list_access_events(&self, page: PageRequest) -> RepositoryResult<Page<AccessEvent>>;

    /// List one user's events newest first.
    async fn list_access_events_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> RepositoryResult<Page<AccessEvent>>;

    /// Count events grouped by UTC hour of day and day of week.
    ///
    /// Only events with `start <= timestamp <= end` are counted. Each row is
    /// `(hour 0-23, day_of_week 0-6 with 0 = Sunday, count)`; combinations
    /// with no events are omitted.
    async fn fetch_hourly_access_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<RawHourlyCount>>;
}
