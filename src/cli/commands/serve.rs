//! HTTP API server for the lecture frontend.
//!
//! Lecture routes are nested under `/api`. Errors are returned as `{"detail": "..."}`.

use crate::app::App;
use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::error::LecternError;
use crate::lecture::{Lecture, LecturePatch};
use crate::orchestrator::ProcessingResult;
use crate::transcription::TranscriptionResult;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
struct AppState {
    app: App,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let app = App::from_settings(&settings)?;
    let model = app.model();
    let router = router(app, &settings.server);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Lectern API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Model", &model);
    Output::kv("Store", &settings.store.provider.to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Create", "POST   /api/lectures");
    Output::kv("Get", "GET    /api/lectures/{id}");
    Output::kv("Process", "POST   /api/lectures/{id}/process");
    Output::kv("Update", "PATCH  /api/lectures/{id}");
    Output::kv("Delete", "DELETE /api/lectures/{id}");
    Output::kv("By user", "GET    /api/lectures/user/{user_id}");
    Output::kv("Latest", "GET    /api/lectures/user/{user_id}/latest");
    Output::kv("Transcribe", "POST   /api/transcribe-audio");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router).await?;

    Ok(())
}

/// Build the HTTP router over an assembled [`App`].
pub fn router(app: App, server: &ServerSettings) -> Router {
    let state = Arc::new(AppState { app });

    let api = Router::new()
        .route("/lectures", post(create_lecture))
        .route(
            "/lectures/{id}",
            get(get_lecture).patch(patch_lecture).delete(delete_lecture),
        )
        .route("/lectures/{id}/process", post(process_lecture))
        .route("/lectures/user/{user_id}", get(list_user_lectures))
        .route("/lectures/user/{user_id}/latest", get(latest_lecture))
        .route(
            "/transcribe-audio",
            post(transcribe_audio).layer(DefaultBodyLimit::max(server.max_upload_bytes)),
        )
        .route("/debug/lectures", get(debug_lectures));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(cors_layer(server))
        .with_state(state)
}

/// CORS from the configured origins. No origins means any origin.
fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLectureRequest {
    user_id: String,
    transcription: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct DebugLecturesResponse {
    total: usize,
    lectures: Vec<Lecture>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// A failed request: status plus the `detail` message.
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// Report any failure as a 500, whatever its kind.
    fn internal(err: LecternError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: err.to_string(),
        }
    }
}

impl From<LecternError> for ApiError {
    fn from(err: LecternError) -> Self {
        let status = match &err {
            LecternError::NotFound(_) => StatusCode::NOT_FOUND,
            LecternError::InvalidState(_)
            | LecternError::InvalidInput(_)
            | LecternError::NoSpeechDetected => StatusCode::BAD_REQUEST,
            LecternError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            detail: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}", self.detail);
        }
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Lectern API",
        "status": "running",
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.app.model(),
    }))
}

async fn create_lecture(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLectureRequest>,
) -> ApiResult<Lecture> {
    let lecture = state
        .app
        .lectures()
        .create(&req.user_id, &req.transcription)
        .await?;
    Ok(Json(lecture))
}

async fn get_lecture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Lecture> {
    Ok(Json(state.app.lectures().get(&id).await?))
}

async fn latest_lecture(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Lecture> {
    Ok(Json(state.app.lectures().latest_for_user(&user_id).await?))
}

async fn list_user_lectures(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Lecture>> {
    Ok(Json(state.app.lectures().list_for_user(&user_id).await?))
}

async fn process_lecture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ProcessingResult> {
    Ok(Json(state.app.orchestrator().process(&id).await?))
}

async fn patch_lecture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<LecturePatch>,
) -> ApiResult<Lecture> {
    let lecture = state
        .app
        .lectures()
        .patch(&id, &patch)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(lecture))
}

async fn delete_lecture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    state.app.lectures().delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Lecture deleted successfully".to_string(),
    }))
}

async fn debug_lectures(State(state): State<Arc<AppState>>) -> ApiResult<DebugLecturesResponse> {
    let lectures = state.app.lectures().list_all().await?;
    Ok(Json(DebugLecturesResponse {
        total: lectures.len(),
        lectures,
    }))
}

async fn transcribe_audio(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<TranscriptionResult> {
    let mut audio = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            audio = Some(field.bytes().await?);
            break;
        }
    }

    let audio = audio.ok_or_else(|| LecternError::InvalidInput("No file uploaded".to_string()))?;
    let result = state.app.relay().transcribe(audio.to_vec()).await?;
    Ok(Json(result))
}
