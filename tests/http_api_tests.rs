#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use programme_interchange::formats::csv::SAMPLE_PROGRAMME;
use programme_interchange::{EngineConfig, InterchangeEngine, MemoryTaskStore, Task, http_api};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let engine = InterchangeEngine::new(Arc::new(MemoryTaskStore::new()), EngineConfig::default());
    http_api::router(http_api::AppState::new(engine))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn import_sample() -> Request<Body> {
    json_request(
        "POST",
        "/projects/p1/import",
        json!({ "fileName": "Depot.csv", "content": SAMPLE_PROGRAMME }),
    )
}

#[tokio::test]
async fn health_and_sample_are_served() {
    let app = new_router();
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));

    let response = app.oneshot(get("/sample.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], SAMPLE_PROGRAMME.as_bytes());
}

#[tokio::test]
async fn import_then_list_tasks() {
    let app = new_router();
    let response = app.clone().oneshot(import_sample()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["success"], json!(true));
    assert_eq!(report["data"]["tasksImported"], json!(10));
    assert_eq!(report["data"]["totalTasks"], json!(10));
    assert_eq!(report["errors"], json!([]));

    let response = app.clone().oneshot(get("/projects/p1/tasks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let tasks: Vec<Task> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(tasks.len(), 10);
    assert_eq!(tasks[4].name, "Groundworks");

    let response = app.oneshot(get("/projects/p1/activity")).await.unwrap();
    let log = body_json(response).await;
    assert_eq!(log[0]["type"], json!("asta_import"));
}

#[tokio::test]
async fn unsupported_import_is_a_bad_request() {
    let app = new_router();
    let response = app
        .oneshot(json_request(
            "POST",
            "/projects/p1/import",
            json!({ "fileName": "plan.pp", "content": "x" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let report = body_json(response).await;
    assert_eq!(report["success"], json!(false));
    assert_eq!(report["errors"], json!(["Unsupported file format: .pp"]));
}

#[tokio::test]
async fn export_returns_file_with_disposition() {
    let app = new_router();
    app.clone().oneshot(import_sample()).await.unwrap();
    let response = app
        .oneshot(json_request(
            "POST",
            "/projects/p1/export",
            json!({
                "fileType": "csv",
                "dateRange": { "start": "2025-01-06", "end": "2025-01-13" }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"Depot_"));
    assert!(disposition.ends_with(".csv\""));
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 4);
}

#[tokio::test]
async fn demo_mode_quota_is_forbidden() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request("PUT", "/demo-mode", json!({ "enabled": true })))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({ "enabled": true }));

    let response = app.clone().oneshot(get("/projects/p1/quota")).await.unwrap();
    let usage = body_json(response).await;
    assert_eq!(usage["demo"], json!(true));
    assert_eq!(usage["exportsRemaining"], json!(3));
    assert_eq!(usage["maxRangeDays"], json!(7));

    let response = app
        .oneshot(json_request(
            "POST",
            "/projects/p1/export",
            json!({
                "fileType": "json",
                "dateRange": { "start": "2025-01-01", "end": "2025-03-01" }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("quota_exceeded"));
    assert_eq!(
        body["message"],
        json!("Date range of 59 days exceeds the maximum of 7 days.")
    );
}

#[tokio::test]
async fn config_update_names_exports() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/projects/p1/config",
            json!({ "name": "Riverside", "owner": "planning" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let config = body_json(response).await;
    assert_eq!(config["name"], json!("Riverside"));
    assert_eq!(config["owner"], json!("planning"));

    let response = app
        .oneshot(json_request(
            "POST",
            "/projects/p1/export",
            json!({
                "fileType": "xer",
                "dateRange": { "start": "2025-01-06", "end": "2025-01-13" }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Riverside_"));
    assert!(disposition.ends_with(".xer\""));
}
