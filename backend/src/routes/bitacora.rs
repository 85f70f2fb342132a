use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ActionCount, AuditEvent, AuditEventId, AuditStatistics, UserId};

/// Audit event as returned to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventDto {
    pub id: AuditEventId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl From<AuditEvent> for AuditEventDto {
    fn from(e: AuditEvent) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            action: e.action,
            timestamp: e.timestamp,
        }
    }
}

/// Body of `POST /api/bitacora`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditEventRequest {
    #[serde(default, alias = "usuario_id")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "accion")]
    pub action: String,
}

/// One entry of the most-frequent-actions list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCountDto {
    pub accion: String,
    pub cantidad: u64,
}

impl From<ActionCount> for ActionCountDto {
    fn from(a: ActionCount) -> Self {
        Self {
            accion: a.action,
            cantidad: a.count,
        }
    }
}

/// Bitácora summary, keyed the way the dashboard widgets expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStatisticsDto {
    pub total_eventos: u64,
    pub eventos_hoy: u64,
    pub acciones_mas_comunes: Vec<ActionCountDto>,
}

impl From<AuditStatistics> for AuditStatisticsDto {
    fn from(s: AuditStatistics) -> Self {
        Self {
            total_eventos: s.total_events,
            eventos_hoy: s.events_today,
            acciones_mas_comunes: s.top_actions.into_iter().map(Into::into).collect(),
        }
    }
}
