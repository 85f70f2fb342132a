//! HTTP handlers for the REST API.
//!
//! Handlers parse the request, call into the service layer and map results
//! onto the response envelopes in [`super::dto`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    ApiResponse, AuditListQuery, HealthResponse, HeatmapQuery, HeatmapResponse, PageQuery,
    PaginatedResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    AccessEventDto, AuditEventDto, AuditStatisticsDto, CreateAccessEventRequest,
    CreateAuditEventRequest,
};
use crate::db::services as db_services;
use crate::models::{AccessEventId, AuditEventId, AuditFilter, UserId};
use crate::services::audit::AuditOutcome;
use crate::services::heatmap::{get_heatmap_data, parse_window_days};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

const ACCESS_NOT_FOUND: &str = "Acceso no encontrado";
const EVENT_NOT_FOUND: &str = "Evento no encontrado";

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Access events
// =============================================================================

/// GET /api/access/heatmap?days=N
pub async fn get_access_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> HandlerResult<HeatmapResponse> {
    let days = parse_window_days(query.days.as_deref(), state.config.heatmap_default_days);
    let data = get_heatmap_data(
        state.repository.as_ref(),
        state.clock.as_ref(),
        days,
        state.config.heatmap_out_of_range,
    )
    .await?;

    Ok(Json(HeatmapResponse {
        success: true,
        data: data.rows,
        metadata: data.metadata,
    }))
}

/// GET /api/access?page=&limit=
pub async fn list_access_events(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> HandlerResult<PaginatedResponse<AccessEventDto>> {
    let page = db_services::list_access_events(state.repository.as_ref(), query.to_request())
        .await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// GET /api/access/{id}
pub async fn get_access_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ApiResponse<AccessEventDto>> {
    let event = db_services::get_access_event(state.repository.as_ref(), AccessEventId::new(id))
        .await
        .map_err(|e| AppError::from(e).not_found_as(ACCESS_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok(event.into())))
}

/// GET /api/access/user/{user_id}?page=&limit=
pub async fn list_user_access_events(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> HandlerResult<PaginatedResponse<AccessEventDto>> {
    let page = db_services::list_access_events_for_user(
        state.repository.as_ref(),
        UserId::new(user_id),
        query.to_request(),
    )
    .await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// POST /api/access
pub async fn record_access_event(
    State(state): State<AppState>,
    Json(request): Json<CreateAccessEventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccessEventDto>>), AppError> {
    let draft = request.into_draft().map_err(AppError::BadRequest)?;
    let event =
        db_services::record_access_event(state.repository.as_ref(), state.clock.as_ref(), draft)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(event.into()).with_message("Acceso registrado exitosamente")),
    ))
}

// =============================================================================
// Bitácora
// =============================================================================

/// GET /api/bitacora?page=&limit=&search=
pub async fn list_audit_events(
    State(state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> HandlerResult<PaginatedResponse<AuditEventDto>> {
    let filter = AuditFilter {
        search: query.search.clone(),
    };
    let page =
        db_services::list_audit_events(state.repository.as_ref(), &filter, query.to_request())
            .await?;
    Ok(Json(PaginatedResponse::from_page(page)))
}

/// GET /api/bitacora/estadisticas
pub async fn get_audit_statistics(
    State(state): State<AppState>,
) -> HandlerResult<ApiResponse<AuditStatisticsDto>> {
    let stats =
        db_services::audit_statistics(state.repository.as_ref(), state.clock.as_ref()).await?;
    Ok(Json(ApiResponse::ok(stats.into())))
}

/// GET /api/bitacora/{id}
pub async fn get_audit_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ApiResponse<AuditEventDto>> {
    let event = db_services::get_audit_event(state.repository.as_ref(), AuditEventId::new(id))
        .await
        .map_err(|e| AppError::from(e).not_found_as(EVENT_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok(event.into())))
}

/// POST /api/bitacora
///
/// 201 with the stored event, or 200 with `data: null` when an identical
/// entry was recorded moments ago.
pub async fn record_audit_event(
    State(state): State<AppState>,
    Json(request): Json<CreateAuditEventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Option<AuditEventDto>>>), AppError> {
    let outcome = state
        .audit
        .record(request.user_id.map(UserId::new), &request.action)
        .await?;
    Ok(match outcome {
        AuditOutcome::Recorded(event) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(Some(event.into())).with_message("Evento creado exitosamente")),
        ),
        AuditOutcome::Suppressed => (
            StatusCode::OK,
            Json(ApiResponse::ok(None).with_message("Evento duplicado omitido")),
        ),
    })
}
