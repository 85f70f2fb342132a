//! Repository-agnostic operations used by the HTTP layer.
//!
//! These functions hold the rules that must behave the same on every
//! backend: validation of incoming events, clock stamping, and how the
//! bitácora summary is assembled. Heatmap aggregation and audit
//! deduplication live in [`crate::services`].

use chrono::{Duration, DurationRound};
use log::info;

use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{
    AccessEvent, AccessEventDraft, AccessEventId, AuditEvent, AuditEventId, AuditFilter,
    AuditStatistics, Page, PageRequest, UserId,
};
use crate::services::clock::Clock;

/// Number of actions listed in [`AuditStatistics::top_actions`].
pub const TOP_ACTIONS_LIMIT: usize = 5;

// ==================== Health ====================

pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Access events ====================

/// Validate and store an access event stamped with the clock's time.
pub async fn record_access_event<R: FullRepository + ?Sized>(
    repo: &R,
    clock: &dyn Clock,
    draft: AccessEventDraft,
) -> RepositoryResult<AccessEvent> {
    let new_event = draft.stamp(clock.now()).map_err(|message| {
        RepositoryError::validation(message)
            .with_operation("record_access_event")
            .with_entity("access_logs")
    })?;
    let stored = repo.insert_access_event(new_event).await?;
    info!(
        "Recorded access event {} ({} / {})",
        stored.id, stored.access_type, stored.result
    );
    Ok(stored)
}

pub async fn get_access_event<R: FullRepository + ?Sized>(
    repo: &R,
    id: AccessEventId,
) -> RepositoryResult<AccessEvent> {
    repo.get_access_event(id).await
}

pub async fn list_access_events<R: FullRepository + ?Sized>(
    repo: &R,
    page: PageRequest,
) -> RepositoryResult<Page<AccessEvent>> {
    repo.list_access_events(page).await
}

pub async fn list_access_events_for_user<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: UserId,
    page: PageRequest,
) -> RepositoryResult<Page<AccessEvent>> {
    repo.list_access_events_for_user(user_id, page).await
}

// ==================== Audit log ====================

pub async fn list_audit_events<R: FullRepository + ?Sized>(
    repo: &R,
    filter: &AuditFilter,
    page: PageRequest,
) -> RepositoryResult<Page<AuditEvent>> {
    repo.list_audit_events(filter, page).await
}

pub async fn get_audit_event<R: FullRepository + ?Sized>(
    repo: &R,
    id: AuditEventId,
) -> RepositoryResult<AuditEvent> {
    repo.get_audit_event(id).await
}

/// Totals for the bitácora dashboard. "Today" is the current UTC day.
pub async fn audit_statistics<R: FullRepository + ?Sized>(
    repo: &R,
    clock: &dyn Clock,
) -> RepositoryResult<AuditStatistics> {
    let now = clock.now();
    let day_start = now.duration_trunc(Duration::days(1)).map_err(|e| {
        RepositoryError::internal_with_context(
            format!("Cannot compute start of day: {}", e),
            ErrorContext::new("audit_statistics"),
        )
    })?;
    let day_end = day_start + Duration::days(1);

    Ok(AuditStatistics {
        total_events: repo.count_audit_events().await?,
        events_today: repo.count_audit_events_between(day_start, day_end).await?,
        top_actions: repo.top_audit_actions(TOP_ACTIONS_LIMIT).await?,
    })
}
