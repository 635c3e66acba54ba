//! Reflection HTTP endpoints
//!
//! Endpoints:
//!   GET  /health        `{ "ok": true, "model": ... }`
//!   GET  /whoami        `{ "ok": true, "usingKey", "modelCount" }` after testing the API key
//!   POST /reflect       `{ "entry" | "text": string }` → `{ "reflection", "crisis"? }`
//!   POST /api/reflect   same as /reflect

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::crisis;
use crate::reflect::Reflector;

/// Returned when the upstream produced no text
pub const FALLBACK_REFLECTION: &str = "I read your entry. I\u{2019}m here with you.";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured
    pub reflector: Option<Arc<dyn Reflector>>,
    pub model: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReflectRequest {
    entry: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReflectResponse {
    reflection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    crisis: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("Missing 'entry' string")]
    MissingEntry,
    #[error("Server missing OPENAI_API_KEY")]
    MissingApiKey,
    #[error("Reflection failed")]
    ReflectionFailed,
    #[error("Missing OPENAI_API_KEY")]
    KeyNotConfigured,
    #[error("API key test failed")]
    KeyCheckFailed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingEntry => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey
            | ApiError::ReflectionFailed
            | ApiError::KeyNotConfigured
            | ApiError::KeyCheckFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/whoami", get(whoami_handler))
        .route("/reflect", post(reflect_handler))
        .route("/api/reflect", post(reflect_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve the reflection endpoints on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "{addr} is already in use; stop the process listening there and try again"
            )
        }
        Err(e) => return Err(anyhow::anyhow!("bind {addr}: {e}")),
    };

    info!(addr = %addr, "lorod: listening on /health, /whoami, /reflect, /api/reflect");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("http server: {e}"))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "ok": true, "model": state.model }))
}

async fn whoami_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let reflector = state.reflector.as_ref().ok_or(ApiError::KeyNotConfigured)?;
    let model_count = reflector.check_key().await.map_err(|e| {
        error!(error = %e, "whoami error");
        ApiError::KeyCheckFailed
    })?;
    Ok(Json(json!({
        "ok": true,
        "usingKey": reflector.key_hint(),
        "modelCount": model_count,
    })))
}

async fn reflect_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReflectResponse>, ApiError> {
    // Malformed or non-object bodies read as an empty request. Any non-empty
    // string is forwarded, whitespace included.
    let request: ReflectRequest = serde_json::from_slice(&body).unwrap_or_default();
    let entry = request
        .entry
        .or(request.text)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingEntry)?;

    let reflector = state.reflector.as_ref().ok_or(ApiError::MissingApiKey)?;

    let crisis = crisis::screen(&entry);
    if crisis.is_some() {
        warn!(entry_len = entry.len(), "entry flagged for crisis resources");
    }

    let reflection = reflector.reflect(&entry).await.map_err(|e| {
        error!(error = %e, "reflect error");
        ApiError::ReflectionFailed
    })?;

    let reflection = if reflection.trim().is_empty() {
        FALLBACK_REFLECTION.to_string()
    } else {
        reflection
    };

    Ok(Json(ReflectResponse { reflection, crisis }))
}
