//! API handlers for the MortgageMate server
//!
//! Provides endpoints for:
//! - Health check
//! - Page navigation
//! - Underwriting submission (multipart upload, PDF response)

use axum::{
    extract::{multipart::MultipartError, rejection::QueryRejection, Multipart, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use underwriting_core::{
    render_report, DocumentKind, FormFields, MortgageApplication, NavAction, Page,
    UploadedDocuments, REPORT_FILENAME,
};

use crate::error::ServerError;
use crate::pages::render_page;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "mortgagemate-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Navigation query: the page the user is on and what they clicked
#[derive(Debug, Deserialize)]
pub struct NavQuery {
    #[serde(default)]
    pub page: Page,
    pub action: Option<NavAction>,
}

/// Handler: GET /?page=&action=
pub async fn handle_navigate(
    query: Result<Query<NavQuery>, QueryRejection>,
) -> Result<Html<String>, ServerError> {
    let Query(nav) = query.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;

    let page = match nav.action {
        Some(action) => nav.page.transition(action),
        None => nav.page,
    };
    debug!(from = ?nav.page, action = ?nav.action, to = ?page, "navigate");

    Ok(render_page(page))
}

/// Handler: GET /underwriting
pub async fn handle_form() -> Html<String> {
    render_page(Page::Underwriting)
}

/// Handler: POST /api/underwrite
///
/// Form fields become a [`MortgageApplication`]; file fields named after a
/// document slot become uploads. Returns the summary PDF as an attachment.
pub async fn handle_underwrite(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ServerError> {
    let mut fields = FormFields::new();
    let mut uploads = UploadedDocuments::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let Some(kind) = DocumentKind::from_slug(&name) else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
            continue;
        };

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        // Browsers send an empty part for an untouched file input
        if bytes.is_empty() {
            continue;
        }
        if !declares_pdf(content_type.as_deref(), file_name.as_deref()) {
            return Err(ServerError::NotPdf(name));
        }

        debug!(document = kind.slug(), bytes = bytes.len(), "upload received");
        uploads.insert(kind, bytes.to_vec());
    }

    let application = MortgageApplication::from_form(&fields)?;
    info!(uploads = uploads.len(), "underwriting submission accepted");

    let underwriter = state.underwriter.clone();
    let pdf = tokio::task::spawn_blocking(move || {
        let summary = underwriter.underwrite(&application, &uploads);
        render_report(&summary, &underwriter.policy().broker)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Underwriting task failed: {}", e)))??;

    Ok((
        StatusCode::OK,
        [
            ("Content-Type".to_string(), "application/pdf".to_string()),
            (
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{}\"", REPORT_FILENAME),
            ),
        ],
        pdf,
    ))
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::InvalidRequest(format!("Malformed upload: {}", err.body_text()))
    }
}

/// An upload counts as a PDF when its content type or file name says so
pub fn declares_pdf(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    let by_type = content_type
        .map(|ct| ct.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false);
    let by_name = file_name
        .map(|n| n.trim().to_lowercase().ends_with(".pdf"))
        .unwrap_or(false);
    by_type || by_name
}
