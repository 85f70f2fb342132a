//! End-to-end tests of the REST API over the in-memory repository.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use access_dashboard::config::ServerConfig;
use access_dashboard::db::repositories::LocalRepository;
use access_dashboard::db::FullRepository;
use access_dashboard::http::{create_router, AppState};
use access_dashboard::services::{Clock, ManualClock};

use support::{at, entry, manual_clock, reference_now, sample_repository};

struct TestApp {
    router: Router,
    repo: Arc<LocalRepository>,
    clock: Arc<ManualClock>,
}

fn app_with(repo: LocalRepository) -> TestApp {
    let repo = Arc::new(repo);
    let clock = manual_clock();
    let state = AppState::with_clock(
        Arc::clone(&repo) as Arc<dyn FullRepository>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        ServerConfig::default(),
    );
    TestApp {
        router: create_router(state),
        repo,
        clock,
    }
}

impl TestApp {
    async fn send_raw(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.send_raw(Method::GET, uri, None).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, body) = self.send_raw(Method::POST, uri, Some(body)).await;
        (status, serde_json::from_str(&body).unwrap())
    }
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    serde_json::from_value(value.clone()).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_database_state() {
    let app = app_with(LocalRepository::new());
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    app.repo.set_healthy(false);
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "disconnected");
}

// =============================================================================
// Heatmap
// =============================================================================

#[tokio::test]
async fn test_heatmap_default_window() {
    let app = app_with(sample_repository());
    let (status, body) = app.get("/api/access/heatmap").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let rows = body["data"].as_array().unwrap();
    let labels: Vec<&str> = rows.iter().map(|r| r["hora"].as_str().unwrap()).collect();
    assert_eq!(
        labels,
        vec![
            "00:00-03:59",
            "04:00-07:59",
            "08:00-11:59",
            "12:00-15:59",
            "16:00-19:59",
            "20:00-23:59",
        ]
    );
    assert_eq!(rows[2]["lunes"], 2);
    assert_eq!(rows[5]["sabado"], 1);
    assert_eq!(rows[3]["sabado"], 0);

    let metadata = &body["metadata"];
    assert_eq!(metadata["totalRecords"], 3);
    assert_eq!(metadata["daysRequested"], 7);
    assert_eq!(timestamp(&metadata["dateRange"]["end"]), reference_now());
    assert_eq!(
        timestamp(&metadata["dateRange"]["start"]),
        reference_now() - Duration::days(7)
    );
}

#[tokio::test]
async fn test_heatmap_wider_window_includes_older_events() {
    let app = app_with(sample_repository());
    let (_, body) = app.get("/api/access/heatmap?days=60").await;
    assert_eq!(body["metadata"]["totalRecords"], 4);
    assert_eq!(body["metadata"]["daysRequested"], 60);
    // 2025-02-01 was a Saturday.
    assert_eq!(body["data"][3]["sabado"], 1);
}

#[tokio::test]
async fn test_heatmap_invalid_days_uses_default() {
    let app = app_with(sample_repository());
    for uri in [
        "/api/access/heatmap?days=abc",
        "/api/access/heatmap?days=0",
        "/api/access/heatmap?days=-3",
        "/api/access/heatmap?days=",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["metadata"]["daysRequested"], 7, "{}", uri);
    }
    let (_, body) = app.get("/api/access/heatmap?days=14d").await;
    assert_eq!(body["metadata"]["daysRequested"], 14);
}

#[tokio::test]
async fn test_heatmap_rows_keep_weekday_key_order() {
    let app = app_with(LocalRepository::new());
    let (status, raw) = app.send_raw(Method::GET, "/api/access/heatmap", None).await;
    assert_eq!(status, StatusCode::OK);

    let first_row_start = raw.find("\"hora\"").unwrap();
    let keys = [
        "\"hora\"",
        "\"domingo\"",
        "\"lunes\"",
        "\"martes\"",
        "\"miercoles\"",
        "\"jueves\"",
        "\"viernes\"",
        "\"sabado\"",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|k| first_row_start + raw[first_row_start..].find(k).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", raw);

    let body: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(body["metadata"]["totalRecords"], 0);
    for row in body["data"].as_array().unwrap() {
        assert_eq!(row.as_object().unwrap().len(), 8);
    }
}

#[tokio::test]
async fn test_heatmap_follows_the_clock() {
    let app = app_with(sample_repository());
    app.clock.advance(Duration::days(30));
    let (_, body) = app.get("/api/access/heatmap").await;
    assert_eq!(body["metadata"]["totalRecords"], 0);
}

#[tokio::test]
async fn test_heatmap_repository_failure_is_internal_error() {
    let app = app_with(sample_repository());
    app.repo.set_healthy(false);
    let (status, body) = app.get("/api/access/heatmap").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Error interno del servidor");
    assert!(body["error"].as_str().unwrap().contains("not healthy"));
}

#[tokio::test]
async fn test_every_read_endpoint_reports_upstream_failure_body() {
    let app = app_with(sample_repository());
    app.repo.set_healthy(false);
    for uri in [
        "/api/access",
        "/api/access/1",
        "/api/access/user/1",
        "/api/bitacora",
        "/api/bitacora/1",
        "/api/bitacora/estadisticas",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["success"], false, "{}", uri);
        assert_eq!(body["message"], "Error interno del servidor", "{}", uri);
        assert_eq!(body["error"], "Database is not healthy", "{}", uri);
        assert!(body.get("data").is_none(), "{}", uri);
    }
}

// =============================================================================
// Access events
// =============================================================================

#[tokio::test]
async fn test_record_and_fetch_access_event() {
    let app = app_with(LocalRepository::new());
    let (status, body) = app
        .post(
            "/api/access",
            json!({ "usuario_id": 3, "area_id": 2, "tipo_acceso": "entrada" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Acceso registrado exitosamente");
    assert_eq!(body["data"]["userId"], 3);
    assert_eq!(body["data"]["areaId"], 2);
    assert_eq!(body["data"]["deviceId"], Value::Null);
    assert_eq!(body["data"]["accessType"], "entry");
    assert_eq!(body["data"]["result"], "success");
    assert_eq!(timestamp(&body["data"]["timestamp"]), reference_now());

    let id = body["data"]["id"].as_i64().unwrap();
    let (status, body) = app.get(&format!("/api/access/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
}

#[tokio::test]
async fn test_record_access_event_accepts_camel_case() {
    let app = app_with(LocalRepository::new());
    let (status, body) = app
        .post(
            "/api/access",
            json!({ "userId": 5, "accessType": "exit", "result": "denied" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["accessType"], "exit");
    assert_eq!(body["data"]["result"], "denied");
}

#[tokio::test]
async fn test_record_access_event_validation() {
    let app = app_with(LocalRepository::new());

    let (status, body) = app.post("/api/access", json!({ "usuario_id": 3 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .post("/api/access", json!({ "tipo_acceso": "teleport" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("teleport"));

    assert_eq!(app.repo.access_event_count(), 0);
}

#[tokio::test]
async fn test_get_missing_access_event_is_404() {
    let app = app_with(LocalRepository::new());
    let (status, body) = app.get("/api/access/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Acceso no encontrado");
}

#[tokio::test]
async fn test_list_access_events_paginates_newest_first() {
    let base = at(2025, 3, 9, 0, 0);
    let events = (0..25).map(|i| entry(i % 3, base + Duration::minutes(i)));
    let app = app_with(LocalRepository::with_access_events(events));

    let (status, body) = app.get("/api/access?page=3&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["pagination"], json!({ "total": 25, "page": 3, "pages": 3 }));

    let (_, body) = app.get("/api/access").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 10);
    assert_eq!(timestamp(&data[0]["timestamp"]), base + Duration::minutes(24));
    assert!(timestamp(&data[0]["timestamp"]) > timestamp(&data[9]["timestamp"]));
}

#[tokio::test]
async fn test_list_access_events_for_user() {
    let app = app_with(sample_repository());
    let (status, body) = app.get("/api/access/user/1").await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|e| e["userId"] == 1));
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = app.get("/api/access/user/42").await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["pages"], 0);
}

// =============================================================================
// Bitácora
// =============================================================================

#[tokio::test]
async fn test_audit_duplicates_are_suppressed_within_window() {
    let app = app_with(LocalRepository::new());
    let payload = json!({ "usuario_id": 7, "accion": "Inicio de sesión" });

    let (status, body) = app.post("/api/bitacora", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Evento creado exitosamente");
    assert_eq!(body["data"]["action"], "Inicio de sesión");

    app.clock.advance(Duration::seconds(10));
    let (status, body) = app.post("/api/bitacora", payload.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], Value::Null);

    // A different user is not a duplicate.
    let (status, _) = app
        .post("/api/bitacora", json!({ "usuario_id": 8, "accion": "Inicio de sesión" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    app.clock.advance(Duration::seconds(31));
    let (status, _) = app.post("/api/bitacora", payload).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.repo.audit_event_count(), 3);
}

#[tokio::test]
async fn test_audit_empty_action_is_rejected() {
    let app = app_with(LocalRepository::new());
    let (status, body) = app.post("/api/bitacora", json!({ "accion": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(app.repo.audit_event_count(), 0);
}

#[tokio::test]
async fn test_audit_listing_search_and_lookup() {
    let app = app_with(LocalRepository::new());
    for action in ["Crear usuario", "Eliminar usuario", "Abrir puerta"] {
        app.post("/api/bitacora", json!({ "usuario_id": 1, "accion": action }))
            .await;
        app.clock.advance(Duration::minutes(1));
    }

    let (status, body) = app.get("/api/bitacora?search=USUARIO").await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["Eliminar usuario", "Crear usuario"]);
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = app.get("/api/bitacora?limit=1&page=2").await;
    assert_eq!(body["data"][0]["action"], "Eliminar usuario");
    assert_eq!(body["pagination"]["pages"], 3);

    let id = body["data"][0]["id"].as_i64().unwrap();
    let (status, body) = app.get(&format!("/api/bitacora/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "Eliminar usuario");

    let (status, body) = app.get("/api/bitacora/12345").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Evento no encontrado");
}

#[tokio::test]
async fn test_audit_statistics() {
    let app = app_with(LocalRepository::new());
    app.clock.set(at(2025, 3, 9, 23, 0));
    app.post("/api/bitacora", json!({ "usuario_id": 1, "accion": "Abrir puerta" }))
        .await;

    app.clock.set(reference_now());
    for user in 1..=3 {
        app.post("/api/bitacora", json!({ "usuario_id": user, "accion": "Abrir puerta" }))
            .await;
    }
    app.post("/api/bitacora", json!({ "usuario_id": 1, "accion": "Cerrar puerta" }))
        .await;

    let (status, body) = app.get("/api/bitacora/estadisticas").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_eventos"], 5);
    assert_eq!(body["data"]["eventos_hoy"], 4);
    assert_eq!(
        body["data"]["acciones_mas_comunes"],
        json!([
            { "accion": "Abrir puerta", "cantidad": 4 },
            { "accion": "Cerrar puerta", "cantidad": 1 },
        ])
    );
}
