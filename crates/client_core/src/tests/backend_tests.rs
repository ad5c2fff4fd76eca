use super::*;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::domain::{DocumentStatus, QueueStatus, Station};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct ServerState {
    extract_calls: Arc<AtomicUsize>,
}

async fn handle_document(Path(id): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
    match id.as_str() {
        "doc-1" => (
            StatusCode::OK,
            Json(json!({
                "document": {
                    "id": 41,
                    "status": "extracted",
                    "parsed_doc_id": 99,
                    "file_path": "uploads/doc-1.pdf"
                }
            })),
        ),
        "doc-2" => (
            StatusCode::OK,
            Json(json!({ "document": { "status": "parsed", "parsed_doc_id": null } })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Document not found" })),
        ),
    }
}

async fn handle_parsed(Path(id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({
        "data": { "parsed_id": id },
        "microservice_response": { "data": { "chunks": [] } }
    }))
}

async fn handle_extract(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.extract_calls.fetch_add(1, Ordering::SeqCst);
    if id == "doc-1" {
        (StatusCode::OK, Json(json!({ "success": true })))
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
    }
}

async fn handle_queue() -> Json<serde_json::Value> {
    Json(json!({
        "queue": [
            {
                "id": 1,
                "patient_name": "Thandi M",
                "station": "vitals",
                "status": "in_vitals",
                "queue_number": 12,
                "reason_for_visit": "Follow-up",
                "wait_time_minutes": 7
            },
            {
                "id": 2,
                "name": "Sipho K",
                "station": "radiology",
                "status": "triage",
                "queue_number": "A-3"
            }
        ]
    }))
}

async fn handle_stats() -> Json<serde_json::Value> {
    Json(json!({
        "stats": {
            "total_checked_in": 14,
            "waiting": 5,
            "in_progress": 9,
            "average_wait_time_minutes": 12.5
        }
    }))
}

async fn serve(app: Router) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_backend_server() -> anyhow::Result<(String, ServerState)> {
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/gp/documents/:id", get(handle_document))
        .route("/api/gp/documents/:id/extract", post(handle_extract))
        .route("/api/gp/parsed-document/:id", get(handle_parsed))
        .route("/api/queue/current", get(handle_queue))
        .route("/api/queue/stats", get(handle_stats))
        .with_state(state.clone());
    Ok((serve(app).await?, state))
}

async fn handle_loose_queue() -> Json<serde_json::Value> {
    Json(json!({
        "queue": [
            {
                "id": "5f1c-uuid",
                "patient_name": "Lerato N",
                "station": "consultation",
                "status": "waiting",
                "wait_time_minutes": null
            },
            {
                "id": 7,
                "patient_name": "Johan V",
                "station": null,
                "status": "waiting",
                "wait_time_minutes": 12.6
            },
            {
                "patient_name": "No Id",
                "wait_time_minutes": "4"
            }
        ]
    }))
}

async fn handle_loose_stats() -> Json<serde_json::Value> {
    Json(json!({
        "stats": {
            "total_checked_in": 3.0,
            "waiting": null,
            "in_progress": 2,
            "average_wait_time_minutes": null
        }
    }))
}

async fn spawn_loose_queue_server() -> anyhow::Result<String> {
    let app = Router::new()
        .route("/api/queue/current", get(handle_loose_queue))
        .route("/api/queue/stats", get(handle_loose_stats));
    serve(app).await
}

fn backend_for(server_url: &str) -> HttpClinicBackend {
    let settings = ClientSettings {
        request_timeout: Duration::from_secs(5),
        ..ClientSettings::default()
    }
    .with_base_url(server_url)
    .expect("valid url");
    HttpClinicBackend::new(&settings).expect("client")
}

#[tokio::test]
async fn decodes_document_record_with_numeric_ids() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let record = backend
        .get_document(&DocumentId::from("doc-1"))
        .await
        .expect("document");

    assert_eq!(record.status, DocumentStatus::Extracted);
    assert_eq!(record.parsed_doc_id.as_deref(), Some("99"));
    assert_eq!(record.id.as_deref(), Some("41"));
    assert_eq!(record.file_path.as_deref(), Some("uploads/doc-1.pdf"));
}

#[tokio::test]
async fn null_parsed_doc_id_decodes_as_none() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let record = backend
        .get_document(&DocumentId::from("doc-2"))
        .await
        .expect("document");

    assert_eq!(record.status, DocumentStatus::Parsed);
    assert!(record.parsed_doc_id().is_none());
}

#[tokio::test]
async fn surfaces_server_detail_on_failure() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let err = backend
        .get_document(&DocumentId::from("missing"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.detail(), Some("Document not found"));
    assert_eq!(err.user_message("Failed to load document"), "Document not found");
}

#[tokio::test]
async fn failure_without_detail_uses_fallback_text() {
    let (server_url, state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let err = backend
        .extract_document(&DocumentId::from("doc-9"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message("Extraction failed"), "Extraction failed");
    assert_eq!(state.extract_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn extract_posts_to_document_endpoint() {
    let (server_url, state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    backend
        .extract_document(&DocumentId::from("doc-1"))
        .await
        .expect("extract");

    assert_eq!(state.extract_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn parsed_document_is_returned_raw() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let raw = backend
        .get_parsed_document(&ParsedDocId::from("99"))
        .await
        .expect("payload");

    assert_eq!(raw["data"]["parsed_id"], "99");
}

#[tokio::test]
async fn queue_entries_tolerate_unknown_station_and_status() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let queue = backend.current_queue().await.expect("queue");

    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].station, Station::Vitals);
    assert_eq!(queue[0].status, QueueStatus::InVitals);
    assert_eq!(queue[0].queue_number.as_deref(), Some("12"));
    assert_eq!(queue[1].patient_name, "Sipho K");
    assert_eq!(queue[1].station, Station::Other("radiology".to_string()));
    assert_eq!(queue[1].status, QueueStatus::Other("triage".to_string()));
    assert_eq!(queue[1].wait_time_minutes, 0);
}

#[tokio::test]
async fn decodes_queue_stats() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let stats = backend.queue_stats().await.expect("stats");

    assert_eq!(stats.total_checked_in, 14);
    assert_eq!(stats.waiting, 5);
    assert_eq!(stats.in_progress, 9);
    assert!((stats.average_wait_time_minutes - 12.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn queue_decoding_tolerates_string_ids_and_null_numbers() {
    let server_url = spawn_loose_queue_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let queue = backend.current_queue().await.expect("queue");
    let stats = backend.queue_stats().await.expect("stats");

    assert_eq!(queue.len(), 3);
    assert_eq!(queue[0].id.as_str(), "5f1c-uuid");
    assert_eq!(queue[0].wait_time_minutes, 0);
    assert_eq!(queue[1].id.as_str(), "7");
    assert_eq!(queue[1].wait_time_minutes, 13);
    assert_eq!(queue[1].station, Station::default());
    assert_eq!(queue[2].id.as_str(), "");
    assert_eq!(queue[2].wait_time_minutes, 4);

    assert_eq!(stats.total_checked_in, 3);
    assert_eq!(stats.waiting, 0);
    assert_eq!(stats.in_progress, 2);
    assert_eq!(stats.average_wait_time_minutes, 0.0);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let backend = backend_for("http://127.0.0.1:9");

    let err = backend.queue_stats().await.expect_err("must fail");

    assert!(matches!(err, ClientError::Transport { .. }), "unexpected: {err:?}");
    assert_eq!(err.detail(), None);
}

#[test]
fn endpoint_escapes_path_segments() {
    let backend = backend_for("http://localhost:8001/");
    assert_eq!(backend.base_url(), "http://localhost:8001/");
    let url = backend
        .endpoint(&["api", "gp", "documents", "a b/c"])
        .expect("url");
    assert_eq!(url.as_str(), "http://localhost:8001/api/gp/documents/a%20b%2Fc");
}
