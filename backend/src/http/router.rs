//! Router configuration for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
    Router,
};
use log::warn;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// JSON body limit.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match frontend_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(_)) => {
            warn!("FRONTEND_URL is not a valid origin; allowing any origin");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.frontend_url.as_deref());

    let access = Router::new()
        .route(
            "/",
            get(handlers::list_access_events).post(handlers::record_access_event),
        )
        .route("/heatmap", get(handlers::get_access_heatmap))
        .route("/user/{user_id}", get(handlers::list_user_access_events))
        .route("/{id}", get(handlers::get_access_event));

    let bitacora = Router::new()
        .route(
            "/",
            get(handlers::list_audit_events).post(handlers::record_audit_event),
        )
        .route("/estadisticas", get(handlers::get_audit_statistics))
        .route("/{id}", get(handlers::get_audit_event));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/access", access)
        .nest("/api/bitacora", bitacora)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
