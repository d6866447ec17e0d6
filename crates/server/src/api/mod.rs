//! API endpoint modules.
//!
//! Shared error type and the panic handler live here in mod.rs.

mod health;
mod insights;

use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use carepulse_core::InsightError;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Handler error: a status code plus `{ error, kind }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl From<InsightError> for ApiError {
    fn from(e: InsightError) -> Self {
        warn!(kind = e.kind(), error = %e, "request rejected");
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: e.to_string(),
                kind: e.kind(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "malformed request body");
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: rejection.body_text(),
                kind: "invalid_request",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Generic 500 for a panicking handler; internals stay in the log.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            kind: "internal",
        }),
    )
        .into_response()
}

// ── Re-exports ───────────────────────────────────────────────────
// Flat `api::foo` paths used by route registration.

pub use health::health;
pub use insights::{
    adherence_analysis, appointment_suggestions, daily_summary, symptom_patterns, weekly_summary,
};
