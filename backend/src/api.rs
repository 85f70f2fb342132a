//! Public API surface.
//!
//! Consolidates the DTO types served by the HTTP API together with the
//! domain types they are built from. Everything here derives
//! `Serialize`/`Deserialize`.

pub use crate::routes::access::{AccessEventDto, CreateAccessEventRequest};
pub use crate::routes::bitacora::{
    ActionCountDto, AuditEventDto, AuditStatisticsDto, CreateAuditEventRequest,
};
pub use crate::routes::heatmap::{DateRange, HeatmapData, HeatmapMetadata, HeatmapRow};

pub use crate::models::{
    AccessEvent, AccessEventId, AccessResult, AccessType, ActionCount, AreaId, AuditEvent,
    AuditEventId, AuditStatistics, DeviceId, PageInfo, UserId,
};
