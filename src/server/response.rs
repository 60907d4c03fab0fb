//! Response envelope shared by the REST handlers

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body of every successful (or commit-failed) entity response
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<D> {
    /// Human-readable outcome
    pub message: String,
    pub data: D,
}

impl<D: Serialize> ApiResponse<D> {
    pub fn new(message: impl Into<String>, data: D) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }

    /// Serialize with the given status
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl<D: Serialize> IntoResponse for ApiResponse<D> {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}
