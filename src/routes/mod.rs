//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The service is a plain JSON API: the editor creates a draft, loads it,
//! and pushes debounced whole-document saves. Everything lives under
//! `/api/documents`, plus `/healthz` for probes.

pub mod documents;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the API router. `body_limit` caps request bodies in bytes.
pub fn app(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/api/documents/{id}",
            get(documents::get_document).put(documents::save_document),
        )
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
