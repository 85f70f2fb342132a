use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    AccessEvent, AccessEventDraft, AccessEventId, AccessResult, AccessType, AreaId, DeviceId,
    UserId,
};

/// Access event as returned to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEventDto {
    pub id: AccessEventId,
    pub user_id: Option<UserId>,
    pub area_id: Option<AreaId>,
    pub device_id: Option<DeviceId>,
    pub access_type: AccessType,
    pub result: AccessResult,
    pub timestamp: DateTime<Utc>,
}

impl From<AccessEvent> for AccessEventDto {
    fn from(e: AccessEvent) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            area_id: e.area_id,
            device_id: e.device_id,
            access_type: e.access_type,
            result: e.result,
            timestamp: e.timestamp,
        }
    }
}

/// Body of `POST /api/access`.
///
/// Accepts the dashboard's camelCase keys and the legacy column names.
/// Enum values are kept as text so a bad value is reported as a validation
/// error instead of a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessEventRequest {
    #[serde(default, alias = "usuario_id")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "area_id")]
    pub area_id: Option<i64>,
    #[serde(default, alias = "dispositivo_id")]
    pub device_id: Option<i64>,
    #[serde(default, alias = "tipo_acceso")]
    pub access_type: Option<String>,
    #[serde(default, alias = "resultado")]
    pub result: Option<String>,
}

impl CreateAccessEventRequest {
    pub fn into_draft(self) -> Result<AccessEventDraft, String> {
        let access_type = self
            .access_type
            .as_deref()
            .map(str::parse::<AccessType>)
            .transpose()?;
        let result = self
            .result
            .as_deref()
            .map(str::parse::<AccessResult>)
            .transpose()?;
        Ok(AccessEventDraft {
            user_id: self.user_id.map(UserId),
            area_id: self.area_id.map(AreaId),
            device_id: self.device_id.map(DeviceId),
            access_type,
            result,
        })
    }
}
