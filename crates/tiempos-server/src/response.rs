//! Error contract of the HTTP API.
//!
//! Failures never cross the boundary as panics: each one becomes a JSON body
//! `{"error": CODE, "message": ...}` with a fixed status per code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tiempos_core::TiemposError;
use tiempos_runtime::queries::QueryError;

/// Code sent when no report could ever be loaded.
pub const DB_NOT_FOUND: &str = "DB_NOT_FOUND";
/// Code sent when a blocking task fails unexpectedly.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
/// Code sent for unknown routes.
pub const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug)]
pub enum ApiError {
    /// The report is unavailable and nothing is cached.
    DbNotFound(String),
    Query(QueryError),
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DbNotFound(_) => DB_NOT_FOUND,
            ApiError::Query(e) => e.code(),
            ApiError::Internal(_) => INTERNAL_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DbNotFound(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Query(e) => query_error_status(e),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::DbNotFound(m) | ApiError::Internal(m) => m.clone(),
            ApiError::Query(e) => e.to_string(),
        }
    }
}

#[must_use]
pub fn query_error_status(err: &QueryError) -> StatusCode {
    match err {
        QueryError::InvalidDate(_) | QueryError::InvalidMonth(_) => StatusCode::BAD_REQUEST,
        QueryError::CenterNotFound(_) | QueryError::NoDataInRange => StatusCode::NOT_FOUND,
    }
}

impl From<TiemposError> for ApiError {
    fn from(err: TiemposError) -> Self {
        ApiError::DbNotFound(err.to_string())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self.message(), "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self.message(), "request rejected");
        }
        let body = Json(json!({"error": self.code(), "message": self.message()}));
        (status, body).into_response()
    }
}
