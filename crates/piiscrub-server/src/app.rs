//! HTTP surface for the sanitizer
//!
//! - `POST /api/sanitize` sanitizes a batch of rows
//! - `GET /healthz` liveness probe

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use piiscrub_pii::{Action, SanitizeOutput, Sanitizer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    sanitizer: Arc<Sanitizer>,
    log_audit: bool,
}

impl AppState {
    pub fn new(sanitizer: Sanitizer) -> Self {
        Self {
            sanitizer: Arc::new(sanitizer),
            log_audit: false,
        }
    }

    /// Log each audit event (previews only) at info level
    pub fn with_audit_logging(mut self, enabled: bool) -> Self {
        self.log_audit = enabled;
        self
    }
}

/// Body of `POST /api/sanitize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeRequest {
    pub input_data: Vec<Value>,

    #[serde(default)]
    pub query_params: QueryParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    /// Action forced on every type for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Action>,

    #[serde(default = "default_true")]
    pub return_audit: bool,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            method: None,
            return_audit: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// The policy needs a secret the server was not given
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<piiscrub_pii::Error> for ApiError {
    fn from(err: piiscrub_pii::Error) -> Self {
        match err {
            piiscrub_pii::Error::Configuration(msg) => ApiError::Configuration(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Configuration(msg) => (StatusCode::BAD_REQUEST, "configuration_error", msg),
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": error_type,
                "code": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sanitize", post(sanitize))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn sanitize(
    State(state): State<AppState>,
    Json(req): Json<SanitizeRequest>,
) -> Result<Json<SanitizeOutput>, ApiError> {
    let QueryParams {
        method,
        return_audit,
    } = req.query_params;

    let output = state
        .sanitizer
        .sanitize(&req.input_data, method, return_audit || state.log_audit)
        .inspect_err(|e| warn!("Sanitize request rejected: {}", e))?;

    let output = if state.log_audit {
        log_audit(&output);
        SanitizeOutput {
            data: output.data,
            audit: output.audit.filter(|_| return_audit),
        }
    } else {
        output
    };

    Ok(Json(output))
}

fn log_audit(output: &SanitizeOutput) {
    for (row, events) in output.audit.iter().flatten().enumerate() {
        for event in events {
            info!(
                row,
                column = %event.column,
                pii_type = %event.pii_type,
                action = %event.action,
                original = %event.original_preview,
                replacement = %event.replacement_preview,
                "audit"
            );
        }
    }
}

/// Liveness probe handler
async fn healthz() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

fn default_true() -> bool {
    true
}
