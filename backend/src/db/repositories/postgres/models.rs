use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Int4, Int8, Text};

use super::schema::{access_logs, auditoria};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    AccessEvent, AccessEventId, AccessResult, AccessType, AreaId, AuditEvent, AuditEventId,
    ActionCount, DeviceId, NewAccessEvent, NewAuditEvent, UserId,
};
use crate::services::heatmap::RawHourlyCount;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = access_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccessLogRow {
    pub id: i64,
    pub usuario_id: Option<i64>,
    pub area_id: Option<i64>,
    pub dispositivo_id: Option<i64>,
    pub tipo_acceso: String,
    pub resultado: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = access_logs)]
pub struct NewAccessLogRow {
    pub usuario_id: Option<i64>,
    pub area_id: Option<i64>,
    pub dispositivo_id: Option<i64>,
    pub tipo_acceso: String,
    pub resultado: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&NewAccessEvent> for NewAccessLogRow {
    fn from(event: &NewAccessEvent) -> Self {
        Self {
            usuario_id: event.user_id.map(|u| u.value()),
            area_id: event.area_id.map(|a| a.value()),
            dispositivo_id: event.device_id.map(|d| d.value()),
            tipo_acceso: event.access_type.as_db_str().to_string(),
            resultado: event.result.as_db_str().to_string(),
            timestamp: event.timestamp,
        }
    }
}

impl TryFrom<AccessLogRow> for AccessEvent {
    type Error = RepositoryError;

    fn try_from(row: AccessLogRow) -> RepositoryResult<Self> {
        let id = row.id;
        let corrupt = move |message: String| {
            RepositoryError::internal_with_context(
                message,
                ErrorContext::new("decode_access_log")
                    .with_entity("access_logs")
                    .with_entity_id(id),
            )
        };
        let access_type = row.tipo_acceso.parse::<AccessType>().map_err(corrupt)?;
        let result = row.resultado.parse::<AccessResult>().map_err(corrupt)?;
        Ok(AccessEvent {
            id: AccessEventId(row.id),
            user_id: row.usuario_id.map(UserId),
            area_id: row.area_id.map(AreaId),
            device_id: row.dispositivo_id.map(DeviceId),
            access_type,
            result,
            timestamp: row.timestamp,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = auditoria)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditRow {
    pub id: i64,
    pub usuario_id: Option<i64>,
    pub accion: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auditoria)]
pub struct NewAuditRow {
    pub usuario_id: Option<i64>,
    pub accion: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&NewAuditEvent> for NewAuditRow {
    fn from(event: &NewAuditEvent) -> Self {
        Self {
            usuario_id: event.user_id.map(|u| u.value()),
            accion: event.action.clone(),
            timestamp: event.timestamp,
        }
    }
}

impl From<AuditRow> for AuditEvent {
    fn from(row: AuditRow) -> Self {
        Self {
            id: AuditEventId(row.id),
            user_id: row.usuario_id.map(UserId),
            action: row.accion,
            timestamp: row.timestamp,
        }
    }
}

/// One row of the grouped hour/day-of-week query.
#[derive(Debug, Clone, QueryableByName)]
pub struct HourlyCountRow {
    #[diesel(sql_type = Int4)]
    pub hour: i32,
    #[diesel(sql_type = Int4)]
    pub day_of_week: i32,
    #[diesel(sql_type = Int8)]
    pub count: i64,
}

impl From<HourlyCountRow> for RawHourlyCount {
    fn from(row: HourlyCountRow) -> Self {
        RawHourlyCount::new(row.hour as i64, row.day_of_week as i64, row.count)
    }
}

/// One row of the most-frequent-actions query.
#[derive(Debug, Clone, QueryableByName)]
pub struct ActionCountRow {
    #[diesel(sql_type = Text)]
    pub action: String,
    #[diesel(sql_type = Int8)]
    pub count: i64,
}

impl From<ActionCountRow> for ActionCount {
    fn from(row: ActionCountRow) -> Self {
        ActionCount {
            action: row.action,
            count: row.count.max(0) as u64,
        }
    }
}
