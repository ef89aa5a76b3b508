//! Error types for the MortgageMate server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use underwriting_core::{FormError, ReportError};

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid form: {0}")]
    InvalidForm(#[from] FormError),

    #[error("Upload '{0}' is not a PDF")]
    NotPdf(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::InvalidForm(_) => (StatusCode::BAD_REQUEST, "INVALID_FORM"),
            ServerError::NotPdf(_) => (StatusCode::BAD_REQUEST, "NOT_PDF"),
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ServerError::Report(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REPORT_ERROR"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
