use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::audio::AudioProxy;
use crate::error::AudioError;
use crate::models::Department;
use crate::source::{fetch_dashboard_data, CallSource, Envelope};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn CallSource>,
    pub audio: Arc<AudioProxy>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/calls", get(list_calls))
        .route("/api/audio/:call_id", get(proxy_audio))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting HTTP server on http://{}", addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CallsQuery {
    department: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Which collection `/api/calls` answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallsKind {
    All,
    Managers,
    Calls,
}

impl CallsKind {
    fn from_query(value: Option<&str>) -> Self {
        match value {
            None | Some("all") => CallsKind::All,
            Some("managers") => CallsKind::Managers,
            Some(_) => CallsKind::Calls,
        }
    }
}

async fn list_calls(State(state): State<AppState>, Query(query): Query<CallsQuery>) -> Response {
    let department = Department::from_query(query.department.as_deref());
    let kind = CallsKind::from_query(query.kind.as_deref());
    let source = state.source.as_ref();

    let result = match kind {
        CallsKind::All => fetch_dashboard_data(source, department)
            .await
            .map(|data| Json(Envelope::ok(data)).into_response()),
        CallsKind::Managers => source
            .fetch_managers(department)
            .await
            .map(|managers| Json(Envelope::ok(managers)).into_response()),
        CallsKind::Calls => source
            .fetch_calls(department)
            .await
            .map(|calls| Json(Envelope::ok(calls)).into_response()),
    };

    result.unwrap_or_else(|err| {
        tracing::error!(%department, ?kind, error = %err, "Error fetching calls");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope::<()>::failure("Failed to fetch data")),
        )
            .into_response()
    })
}

#[derive(Debug, Deserialize)]
struct AudioQuery {
    dept: Option<String>,
}

async fn proxy_audio(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Query(query): Query<AudioQuery>,
) -> Result<Response, AudioError> {
    let department = Department::from_query(query.dept.as_deref());
    let recording = state.audio.fetch_recording(&call_id, department).await?;

    let headers = [
        (header::CONTENT_TYPE, recording.content_type),
        (header::CONTENT_LENGTH, recording.bytes.len().to_string()),
        (header::ACCEPT_RANGES, "bytes".to_string()),
        (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
    ];
    Ok((headers, recording.bytes).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

impl IntoResponse for AudioError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AudioError::InvalidCallId(call_id) => {
                tracing::warn!(%call_id, "rejected recording request");
                (StatusCode::BAD_REQUEST, "Invalid call ID")
            }
            AudioError::NotFound => (StatusCode::NOT_FOUND, "Recording not found"),
            AudioError::Upstream { status } => {
                tracing::warn!(status, "recording upstream failed");
                (
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                    "Failed to fetch recording",
                )
            }
            AudioError::Transport(err) => {
                tracing::error!(error = %err, "Error proxying audio");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
