//! Access events produced by the gate hardware.
//!
//! Events are immutable once written. The legacy schema stores the enum
//! values in Spanish (`entrada`/`salida`, `exitoso`/`denegado`); the API
//! speaks English and accepts either spelling on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AccessEventId, AreaId, DeviceId, UserId};

/// Direction of an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    #[serde(alias = "entrada")]
    Entry,
    #[serde(alias = "salida")]
    Exit,
}

impl AccessType {
    /// Value stored in `access_logs.tipo_acceso`.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AccessType::Entry => "entrada",
            AccessType::Exit => "salida",
        }
    }
}

impl FromStr for AccessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" | "entrada" => Ok(Self::Entry),
            "exit" | "salida" => Ok(Self::Exit),
            other => Err(format!("Unknown access type: {}", other)),
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessType::Entry => write!(f, "entry"),
            AccessType::Exit => write!(f, "exit"),
        }
    }
}

/// Outcome reported by the access device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessResult {
    #[default]
    #[serde(alias = "exitoso")]
    Success,
    #[serde(alias = "denegado")]
    Denied,
}

impl AccessResult {
    /// Value stored in `access_logs.resultado`.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AccessResult::Success => "exitoso",
            AccessResult::Denied => "denegado",
        }
    }
}

impl FromStr for AccessResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" | "exitoso" => Ok(Self::Success),
            "denied" | "denegado" => Ok(Self::Denied),
            other => Err(format!("Unknown access result: {}", other)),
        }
    }
}

impl fmt::Display for AccessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessResult::Success => write!(f, "success"),
            AccessResult::Denied => write!(f, "denied"),
        }
    }
}

/// A persisted access event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub id: AccessEventId,
    pub user_id: Option<UserId>,
    pub area_id: Option<AreaId>,
    pub device_id: Option<DeviceId>,
    pub access_type: AccessType,
    pub result: AccessResult,
    pub timestamp: DateTime<Utc>,
}

/// An access event that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccessEvent {
    pub user_id: Option<UserId>,
    pub area_id: Option<AreaId>,
    pub device_id: Option<DeviceId>,
    pub access_type: AccessType,
    pub result: AccessResult,
    pub timestamp: DateTime<Utc>,
}

impl NewAccessEvent {
    /// Successful entry with no user, area or device attached.
    pub fn entry_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id: None,
            area_id: None,
            device_id: None,
            access_type: AccessType::Entry,
            result: AccessResult::Success,
            timestamp,
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn into_event(self, id: AccessEventId) -> AccessEvent {
        AccessEvent {
            id,
            user_id: self.user_id,
            area_id: self.area_id,
            device_id: self.device_id,
            access_type: self.access_type,
            result: self.result,
            timestamp: self.timestamp,
        }
    }
}

/// Client-supplied fields of an access event before validation.
///
/// The timestamp is never client-supplied; the recorder stamps it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessEventDraft {
    pub user_id: Option<UserId>,
    pub area_id: Option<AreaId>,
    pub device_id: Option<DeviceId>,
    pub access_type: Option<AccessType>,
    pub result: Option<AccessResult>,
}

impl AccessEventDraft {
    /// Stamp the draft. Fails when `access_type` is missing.
    pub fn stamp(self, timestamp: DateTime<Utc>) -> Result<NewAccessEvent, String> {
        let access_type = self
            .access_type
            .ok_or_else(|| "tipo_acceso is required".to_string())?;
        Ok(NewAccessEvent {
            user_id: self.user_id,
            area_id: self.area_id,
            device_id: self.device_id,
            access_type,
            result: self.result.unwrap_or_default(),
            timestamp,
        })
    }
}
