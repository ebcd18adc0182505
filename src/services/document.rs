//! Document service: create, list, load and save design documents.
//!
//! DESIGN
//! ======
//! A document is stored whole: its page list is one JSON value, replaced on
//! every save. Incoming page lists are parsed with the canvas crate's own
//! types before they are stored, so anything the editor cannot load is
//! rejected at the door and what is stored is the canonical form.
//!
//! Loading is lenient in the editor (unknown object types are skipped), but
//! the service is the last copy: an object it cannot read is refused rather
//! than silently dropped from storage.
//!
//! Saves overwrite. The editor's debounce already collapses a burst of edits
//! into one save, and its `updatedAt` comes from a different clock than ours.
//!
//! ERROR HANDLING
//! ==============
//! Malformed ids are reported as `NotFound`: a string that is not a UUID can
//! never name a document.

use std::time::{SystemTime, UNIX_EPOCH};

use canvas::doc::{Document, Page, SceneObject};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::DocumentStore;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("invalid document payload: {0}")]
    InvalidPayload(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One row of the document list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    pub updated_at: i64,
}

type DocumentRow = (Uuid, String, serde_json::Value, i64, i64);

// =============================================================================
// HELPERS
// =============================================================================

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Parse a document id from a path segment.
///
/// # Errors
///
/// Returns `NotFound` if `raw` is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, DocumentError> {
    Uuid::parse_str(raw).map_err(|_| DocumentError::NotFound(raw.to_owned()))
}

/// Validate a page list from a request body.
///
/// # Errors
///
/// Returns `InvalidPayload` if the value is not a list of pages, or if any
/// object (nested children included) is not a readable scene object.
pub fn parse_pages(value: serde_json::Value) -> Result<Vec<Page>, DocumentError> {
    if let Some(pages) = value.as_array() {
        for page in pages {
            if let Some(objects) = page.get("objects") {
                check_objects(objects)?;
            }
        }
    }
    serde_json::from_value(value).map_err(|e| DocumentError::InvalidPayload(e.to_string()))
}

fn check_objects(objects: &serde_json::Value) -> Result<(), DocumentError> {
    let Some(objects) = objects.as_array() else {
        return Ok(());
    };
    for raw in objects {
        if let Err(e) = SceneObject::deserialize(raw) {
            let id = raw.get("id").and_then(serde_json::Value::as_str).unwrap_or("?");
            return Err(DocumentError::InvalidPayload(format!("object {id}: {e}")));
        }
        if let Some(children) = raw.get("children") {
            check_objects(children)?;
        }
    }
    Ok(())
}

fn pages_to_json(pages: &[Page]) -> Result<serde_json::Value, DocumentError> {
    serde_json::to_value(pages).map_err(|e| DocumentError::InvalidPayload(e.to_string()))
}

fn row_to_document(row: DocumentRow) -> Result<Document, DocumentError> {
    let (id, name, pages, created_at, updated_at) = row;
    Ok(Document { id: id.to_string(), name, pages: parse_pages(pages)?, created_at, updated_at })
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a document. Missing fields fall back to the new-draft payload.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_document(
    store: &DocumentStore,
    name: Option<&str>,
    pages: Option<Vec<Page>>,
    now: i64,
) -> Result<Document, DocumentError> {
    let mut doc = Document::draft(now);
    let id = Uuid::new_v4();
    doc.id = id.to_string();
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        name.clone_into(&mut doc.name);
    }
    if let Some(pages) = pages.filter(|p| !p.is_empty()) {
        doc.pages = pages;
    }

    match store {
        DocumentStore::Postgres(pool) => {
            sqlx::query(
                "INSERT INTO documents (id, name, pages, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(&doc.name)
            .bind(pages_to_json(&doc.pages)?)
            .bind(doc.created_at)
            .bind(doc.updated_at)
            .execute(pool)
            .await?;
        }
        DocumentStore::Memory(docs) => {
            docs.write().await.insert(id, doc.clone());
        }
    }

    info!(%id, name = %doc.name, pages = doc.pages.len(), "document created");
    Ok(doc)
}

/// List every document, most recently saved first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_documents(store: &DocumentStore) -> Result<Vec<DocumentSummary>, DocumentError> {
    let mut rows = match store {
        DocumentStore::Postgres(pool) => {
            let rows = sqlx::query_as::<_, (Uuid, String, i64)>(
                "SELECT id, name, updated_at FROM documents ORDER BY updated_at DESC",
            )
            .fetch_all(pool)
            .await?;
            rows.into_iter()
                .map(|(id, name, updated_at)| DocumentSummary { id: id.to_string(), name, updated_at })
                .collect::<Vec<_>>()
        }
        DocumentStore::Memory(docs) => docs
            .read()
            .await
            .values()
            .map(|d| DocumentSummary { id: d.id.clone(), name: d.name.clone(), updated_at: d.updated_at })
            .collect(),
    };
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(rows)
}

/// Load one document.
///
/// # Errors
///
/// Returns `NotFound` for unknown or malformed ids, or a database error.
pub async fn get_document(store: &DocumentStore, raw_id: &str) -> Result<Document, DocumentError> {
    let id = parse_id(raw_id)?;
    match store {
        DocumentStore::Postgres(pool) => {
            let row = sqlx::query_as::<_, DocumentRow>(
                "SELECT id, name, pages, created_at, updated_at FROM documents WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DocumentError::NotFound(raw_id.to_owned()))?;
            row_to_document(row)
        }
        DocumentStore::Memory(docs) => {
            docs.read().await.get(&id).cloned().ok_or_else(|| DocumentError::NotFound(raw_id.to_owned()))
        }
    }
}

/// Replace a document's pages and stamp it with the editor's `updatedAt`.
///
/// Saves overwrite unconditionally. The timestamp comes from the editor's
/// clock and is stored for listing order only; it is never compared against
/// what the server holds.
///
/// # Errors
///
/// Returns `NotFound` for unknown or malformed ids, or a database error.
pub async fn save_document(
    store: &DocumentStore,
    raw_id: &str,
    pages: Vec<Page>,
    updated_at: i64,
) -> Result<(), DocumentError> {
    let id = parse_id(raw_id)?;
    match store {
        DocumentStore::Postgres(pool) => {
            let result = sqlx::query("UPDATE documents SET pages = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(pages_to_json(&pages)?)
                .bind(updated_at)
                .execute(pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(DocumentError::NotFound(raw_id.to_owned()));
            }
        }
        DocumentStore::Memory(docs) => {
            let mut docs = docs.write().await;
            let doc = docs.get_mut(&id).ok_or_else(|| DocumentError::NotFound(raw_id.to_owned()))?;
            doc.pages = pages;
            doc.updated_at = updated_at;
        }
    }

    debug!(%id, updated_at, "document saved");
    Ok(())
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
