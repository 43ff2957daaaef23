//! Local HTTP servers for exercising clients in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

pub const FOUND_ID: &str = "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2";
pub const MISSING_ID: &str = "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc";

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub struct RecordingServer {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
}

/// Stand-in for a roleplay server: `FOUND_ID` has audio, `MISSING_ID` is
/// 404, anything else is 503.
pub async fn spawn_recording_server() -> RecordingServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/api/recording/:call_id", get(recording))
        .with_state(hits.clone());

    RecordingServer {
        base_url: spawn_server(router).await,
        hits,
    }
}

async fn recording(State(hits): State<Arc<AtomicUsize>>, Path(call_id): Path<String>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    match call_id.as_str() {
        FOUND_ID => ([(header::CONTENT_TYPE, "audio/ogg")], "OggS-fake-audio").into_response(),
        MISSING_ID => StatusCode::NOT_FOUND.into_response(),
        _ => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
