use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    ActivityLogEntry, ExportReport, ExportSettings, ImportFile, ImportReport, InterchangeEngine,
    InterchangeError, PersistenceError, ProjectConfig, QuotaUsage, StaticDemoMode, Task,
    formats::csv::SAMPLE_PROGRAMME,
};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<InterchangeEngine>,
    demo_mode: Arc<StaticDemoMode>,
}

impl AppState {
    /// Wires `engine` to a switchable demo flag so `PUT /demo-mode` can toggle it.
    pub fn new(engine: InterchangeEngine) -> Self {
        let demo_mode = Arc::new(StaticDemoMode::new(engine.is_demo_mode_active()));
        let engine = engine.with_demo_mode(demo_mode.clone());
        Self {
            engine: Arc::new(engine),
            demo_mode,
        }
    }

    pub fn engine(&self) -> Arc<InterchangeEngine> {
        self.engine.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Forbidden(String),
    Invalid(String),
    Internal(String),
}

impl From<InterchangeError> for ApiError {
    fn from(value: InterchangeError) -> Self {
        ApiError::from_ref(&value)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match self {
            ApiError::Forbidden(message) => ("quota_exceeded", message),
            ApiError::Invalid(message) => ("invalid_request", message),
            ApiError::Internal(message) => ("internal_error", message),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportPayload {
    file_name: String,
    content: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct DemoModePayload {
    enabled: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sample.csv", get(sample_csv))
        .route("/demo-mode", put(set_demo_mode))
        .route("/projects/:id/import", post(import_programme))
        .route("/projects/:id/export", post(export_programme))
        .route("/projects/:id/tasks", get(list_tasks))
        .route("/projects/:id/activity", get(list_activity))
        .route("/projects/:id/quota", get(quota_usage))
        .route("/projects/:id/config", put(update_config))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, engine: InterchangeEngine) -> std::io::Result<()> {
    let app = router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn sample_csv() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sample_programme.csv\"",
            ),
        ],
        SAMPLE_PROGRAMME,
    )
}

async fn set_demo_mode(
    State(state): State<AppState>,
    Json(payload): Json<DemoModePayload>,
) -> Json<DemoModePayload> {
    state.demo_mode.set(payload.enabled);
    tracing::info!(enabled = payload.enabled, "demo mode switched");
    Json(payload)
}

/// Always answers with an [`ImportReport`]; the status code reflects the failure class.
async fn import_programme(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(payload): Json<ImportPayload>,
) -> (StatusCode, Json<ImportReport>) {
    let file = ImportFile::new(payload.file_name, payload.content.into_bytes());
    let result = state.engine.import_file(&file, &project_id);
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(err) => ApiError::from_ref(err).status(),
    };
    (status, Json(ImportReport::from(result)))
}

async fn export_programme(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(settings): Json<ExportSettings>,
) -> Result<Response, ApiError> {
    let result = state.engine.export_data(&settings, &project_id);
    let report = ExportReport::from(&result);
    let artifact = result?;
    tracing::debug!(project = %project_id, ?report, "export served");
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.engine.tasks(&project_id)?))
}

async fn list_activity(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<ActivityLogEntry>>, ApiError> {
    Ok(Json(state.engine.activity(&project_id)?))
}

async fn quota_usage(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<QuotaUsage>, ApiError> {
    Ok(Json(state.engine.quota_usage(&project_id)?))
}

async fn update_config(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(config): Json<ProjectConfig>,
) -> Result<Json<ProjectConfig>, ApiError> {
    Ok(Json(state.engine.update_project_config(&project_id, config)?))
}

impl ApiError {
    fn from_ref(err: &InterchangeError) -> Self {
        if err.is_quota() {
            ApiError::Forbidden(err.to_string())
        } else if err.is_invalid_input() {
            ApiError::Invalid(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}
