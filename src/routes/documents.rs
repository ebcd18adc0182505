//! Document routes: create, list, load and save.
//!
//! Handlers stay thin. Bodies carry pages as raw JSON so that a page list the
//! editor could not load is reported as 422 by the service layer rather than
//! as an extractor rejection.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use canvas::doc::Document;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::document::{self, DocumentError, DocumentSummary};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateDocumentBody {
    pub name: Option<String>,
    pub pages: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocumentBody {
    pub pages: serde_json::Value,
    pub updated_at: i64,
}

pub(crate) fn document_error_to_status(err: DocumentError) -> StatusCode {
    match err {
        DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
        DocumentError::InvalidPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocumentError::Database(e) => {
            warn!(error = %e, "document query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Decode an optional create body. An empty body means "all defaults".
pub(crate) fn parse_create_body(body: &[u8]) -> Result<CreateDocumentBody, StatusCode> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateDocumentBody::default());
    }
    serde_json::from_slice(body).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)
}

/// `POST /api/documents` — create a document, defaulting to a new draft.
pub async fn create_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedResponse>), StatusCode> {
    let body = parse_create_body(&body)?;
    let pages = body
        .pages
        .map(document::parse_pages)
        .transpose()
        .map_err(document_error_to_status)?;

    let doc = document::create_document(&state.documents, body.name.as_deref(), pages, document::now_ms())
        .await
        .map_err(document_error_to_status)?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: doc.id })))
}

/// `GET /api/documents` — list documents, newest first.
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<DocumentSummary>>, StatusCode> {
    let rows = document::list_documents(&state.documents)
        .await
        .map_err(document_error_to_status)?;
    Ok(Json(rows))
}

/// `GET /api/documents/:id` — load one document.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, StatusCode> {
    let doc = document::get_document(&state.documents, &id)
        .await
        .map_err(document_error_to_status)?;
    Ok(Json(doc))
}

/// `PUT /api/documents/:id` — replace a document's pages.
pub async fn save_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SaveDocumentBody>,
) -> Result<StatusCode, StatusCode> {
    // Malformed ids are 404 before the payload is looked at.
    document::parse_id(&id).map_err(document_error_to_status)?;
    let pages = document::parse_pages(body.pages).map_err(document_error_to_status)?;

    document::save_document(&state.documents, &id, pages, body.updated_at)
        .await
        .map_err(document_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
