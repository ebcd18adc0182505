//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the document store, which is either a Postgres pool or, when no
//! database is configured, a process-local map. The in-memory variant backs
//! local development and the test suite; it is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use canvas::doc::Document;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Where documents live.
#[derive(Clone)]
pub enum DocumentStore {
    Postgres(PgPool),
    Memory(Arc<RwLock<HashMap<Uuid, Document>>>),
}

impl DocumentStore {
    /// An empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; the store is Arc-backed either way.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentStore,
}

impl AppState {
    #[must_use]
    pub fn new(documents: DocumentStore) -> Self {
        Self { documents }
    }
}
