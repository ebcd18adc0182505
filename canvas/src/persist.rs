//! Persistence bridge: connects the scene store to a document backend.
//!
//! DESIGN
//! ======
//! The bridge subscribes one listener to the [`SceneStore`]. The store only
//! calls it once a burst of edits has gone quiet, and always with the page
//! set as it is at that moment, so the listener just stamps the payload and
//! hands it to the [`DocumentBackend`]. The backend call is fire-and-forget:
//! editing continues while a save is in flight, and a failed save is the
//! backend's to log.
//!
//! Hydration is one-shot. The first document delivered for an open bridge
//! replaces the store's pages; later deliveries (a re-fetch of the same
//! document) are dropped so they cannot clobber local edits.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::debounce::Clock;
use crate::doc::{Document, Page};
use crate::engine::{Action, EngineCore};
use crate::store::{SceneStore, SubscriptionId};

/// Body of a save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub pages: Vec<Page>,
    /// Epoch milliseconds at which the payload was taken.
    pub updated_at: i64,
}

/// Somewhere to send saves.
pub trait DocumentBackend {
    /// Persist `payload` as the new content of `doc_id`. Must not block.
    fn save(&self, doc_id: &str, payload: SavePayload);
}

/// Per-document link between a store and its backend.
#[derive(Debug)]
pub struct PersistenceBridge {
    doc_id: String,
    subscription: Option<SubscriptionId>,
    hydrated: bool,
}

impl PersistenceBridge {
    /// Start forwarding debounced store notifications for `doc_id` to `backend`.
    pub fn open(
        store: &mut SceneStore,
        doc_id: &str,
        backend: Rc<dyn DocumentBackend>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let target = doc_id.to_owned();
        let subscription = store.subscribe(Box::new(move |pages: &[Page]| {
            let payload = SavePayload { pages: pages.to_vec(), updated_at: epoch_ms(clock.now_ms()) };
            log::debug!("persist: saving {} page(s) of {target}", payload.pages.len());
            backend.save(&target, payload);
        }));
        Self { doc_id: doc_id.to_owned(), subscription: Some(subscription), hydrated: false }
    }

    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    /// Load a fetched document into the engine, once per open.
    ///
    /// Returns the engine's actions, or an empty list when the document was
    /// dropped (already hydrated, bridge closed, or a different document).
    pub fn hydrate(&mut self, engine: &mut EngineCore, doc: Document) -> Vec<Action> {
        if !self.is_open() {
            log::warn!("persist: hydrate after close for {}", self.doc_id);
            return Vec::new();
        }
        if self.hydrated {
            log::debug!("persist: {} already hydrated, ignoring re-fetch", self.doc_id);
            return Vec::new();
        }
        if !doc.id.is_empty() && doc.id != self.doc_id {
            log::warn!("persist: got document {} while {} is open", doc.id, self.doc_id);
            return Vec::new();
        }
        let pages = if doc.pages.is_empty() { vec![Page::new("Page 1")] } else { doc.pages };
        self.hydrated = true;
        engine.load_pages(pages)
    }

    /// Stop saving: drop any pending notification and unsubscribe. Idempotent.
    pub fn close(&mut self, store: &mut SceneStore) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        store.cancel_pending();
        if !store.unsubscribe(subscription) {
            log::warn!("persist: subscription for {} was already gone", self.doc_id);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_ms(now: f64) -> i64 {
    now.round() as i64
}
