//! HTTP client for the document service.
//!
//! Only the request plumbing is browser-specific: the client itself is built
//! on `gloo-net` and exists on `wasm32` only, while URL building and the retry
//! schedule are plain functions shared with native tests.
//!
//! ERROR HANDLING
//! ==============
//! Fetch and create return [`RemoteError`] to the caller. Saves are
//! fire-and-forget: each one is retried with a linearly growing delay and,
//! after the last attempt, logged and dropped. Editing is never blocked on
//! the network.

#[cfg(test)]
#[path = "remote_test.rs"]
mod remote_test;

/// Where and how persistently to talk to the document service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Origin of the service, e.g. `https://vellum.example.com`. Empty means same origin.
    pub base_url: String,
    /// Extra attempts after a failed save.
    pub retries: u32,
    /// Delay before the first retry; the n-th retry waits `n * retry_base_ms`.
    pub retry_base_ms: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { base_url: String::new(), retries: 3, retry_base_ms: 500 }
    }
}

impl RemoteConfig {
    /// URL of the document collection.
    #[must_use]
    pub fn documents_url(&self) -> String {
        format!("{}/api/documents", self.base_url.trim_end_matches('/'))
    }

    /// URL of one document.
    #[must_use]
    pub fn document_url(&self, id: &str) -> String {
        format!("{}/{id}", self.documents_url())
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn retry_delay_ms(&self, attempt: u32) -> u32 {
        self.retry_base_ms.saturating_mul(attempt)
    }
}

#[cfg(target_arch = "wasm32")]
pub use client::HttpDocumentClient;

#[cfg(target_arch = "wasm32")]
mod client {
    use std::rc::Rc;

    use gloo_net::http::{Request, Response};
    use gloo_timers::future::TimeoutFuture;
    use serde::{Deserialize, Serialize};

    use super::RemoteConfig;
    use crate::doc::{Document, Page};
    use crate::error::RemoteError;
    use crate::persist::{DocumentBackend, SavePayload};

    #[derive(Serialize)]
    struct CreateRequest<'a> {
        name: &'a str,
        pages: &'a [Page],
    }

    #[derive(Deserialize)]
    struct CreateResponse {
        id: String,
    }

    /// Document service client. Clones share one config.
    #[derive(Debug, Clone)]
    pub struct HttpDocumentClient {
        config: Rc<RemoteConfig>,
    }

    impl HttpDocumentClient {
        #[must_use]
        pub fn new(config: RemoteConfig) -> Self {
            Self { config: Rc::new(config) }
        }

        /// `GET /api/documents/{id}`.
        ///
        /// # Errors
        ///
        /// Transport failure, a non-2xx status, or an undecodable body.
        pub async fn fetch_document(&self, id: &str) -> Result<Document, RemoteError> {
            let resp = Request::get(&self.config.document_url(id))
                .send()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            let resp = check_status(resp)?;
            resp.json::<Document>().await.map_err(|e| RemoteError::Decode(e.to_string()))
        }

        /// `POST /api/documents` with an initial payload; returns the new id.
        ///
        /// # Errors
        ///
        /// Transport failure, a non-2xx status, or an undecodable body.
        pub async fn create_document(&self, draft: &Document) -> Result<String, RemoteError> {
            let body = CreateRequest { name: &draft.name, pages: &draft.pages };
            let resp = Request::post(&self.config.documents_url())
                .json(&body)
                .map_err(|e| RemoteError::Decode(e.to_string()))?
                .send()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            let resp = check_status(resp)?;
            let created: CreateResponse = resp.json().await.map_err(|e| RemoteError::Decode(e.to_string()))?;
            Ok(created.id)
        }

        /// `PUT /api/documents/{id}`, a single attempt.
        ///
        /// # Errors
        ///
        /// Transport failure or a non-2xx status.
        pub async fn save_document(&self, id: &str, payload: &SavePayload) -> Result<(), RemoteError> {
            let resp = Request::put(&self.config.document_url(id))
                .json(payload)
                .map_err(|e| RemoteError::Decode(e.to_string()))?
                .send()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            check_status(resp).map(|_| ())
        }

        async fn save_with_retry(&self, id: &str, payload: &SavePayload) {
            let mut attempt = 0;
            loop {
                match self.save_document(id, payload).await {
                    Ok(()) => {
                        log::debug!("remote: saved {id}");
                        return;
                    }
                    // A 4xx will not get better on retry.
                    Err(RemoteError::Status(status)) if (400..500).contains(&status) => {
                        log::warn!("remote: save of {id} rejected with status {status}");
                        return;
                    }
                    Err(e) if attempt >= self.config.retries => {
                        log::warn!("remote: giving up on save of {id} after {} attempt(s): {e}", attempt + 1);
                        return;
                    }
                    Err(e) => {
                        attempt += 1;
                        let delay = self.config.retry_delay_ms(attempt);
                        log::warn!("remote: save of {id} failed ({e}), retry {attempt} in {delay}ms");
                        TimeoutFuture::new(delay).await;
                    }
                }
            }
        }
    }

    impl DocumentBackend for HttpDocumentClient {
        fn save(&self, doc_id: &str, payload: SavePayload) {
            let client = self.clone();
            let id = doc_id.to_owned();
            wasm_bindgen_futures::spawn_local(async move {
                client.save_with_retry(&id, &payload).await;
            });
        }
    }

    fn check_status(resp: Response) -> Result<Response, RemoteError> {
        let status = resp.status();
        if (200..300).contains(&status) { Ok(resp) } else { Err(RemoteError::Status(status)) }
    }
}
