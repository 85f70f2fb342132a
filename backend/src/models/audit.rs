//! Audit log (bitácora) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuditEventId, UserId};

/// A persisted audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    /// `None` for actions attributed to the system.
    pub user_id: Option<UserId>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEvent {
    pub user_id: Option<UserId>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl NewAuditEvent {
    pub fn into_event(self, id: AuditEventId) -> AuditEvent {
        AuditEvent {
            id,
            user_id: self.user_id,
            action: self.action,
            timestamp: self.timestamp,
        }
    }
}

/// Filter for audit log listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Case-insensitive substring matched against the action text.
    pub search: Option<String>,
}

impl AuditFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => event
                .action
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// Number of audit events recorded for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCount {
    pub action: String,
    pub count: u64,
}

/// Summary shown on the bitácora dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_events: u64,
    /// Events recorded since the start of the current UTC day.
    pub events_today: u64,
    pub top_actions: Vec<ActionCount>,
}
