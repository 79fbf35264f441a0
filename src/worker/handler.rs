//! Background persistence worker.
//!
//! The worker owns the write side of the favorite and preference stores. It
//! drains an unbounded channel one message at a time, so writes complete in
//! the order they were issued and a favorite toggle always sees the result of
//! the previous toggle of the same pair.

use crate::domain::error::Result;
use crate::domain::FavoriteRoute;
use crate::storage::{FavoriteStore, PreferenceStore};
use crate::worker::{PendingResponse, WorkerMessage, WorkerRequest, WorkerResponse};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Sending side of the worker queue.
///
/// Cheap to clone. When every handle is dropped the worker finishes the
/// queued messages and exits.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl WorkerHandle {
    /// Queues a fire-and-forget message.
    pub fn post(&self, message: WorkerMessage) {
        if let Err(e) = self.tx.send(message) {
            tracing::warn!(request = ?e.0.request, "worker stopped, dropping request");
        }
    }

    /// Queues a message and returns a handle to its reply.
    pub fn request(&self, message: WorkerMessage) -> PendingResponse {
        let (message, pending) = message.with_reply();
        match self.tx.send(message) {
            Ok(()) => pending,
            Err(e) => {
                tracing::warn!(request = ?e.0.request, "worker stopped, request not queued");
                PendingResponse::ready(WorkerResponse::Error {
                    message: "worker stopped".to_string(),
                })
            }
        }
    }
}

/// Worker state: the stores it writes to.
pub struct PersistenceWorker {
    favorites: Arc<dyn FavoriteStore>,
    preferences: Arc<dyn PreferenceStore>,
}

impl PersistenceWorker {
    #[must_use]
    pub fn new(favorites: Arc<dyn FavoriteStore>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self { favorites, preferences }
    }

    /// Spawns the worker loop on `runtime`.
    pub fn spawn(self, runtime: &Handle) -> (WorkerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(self.run(rx));
        (WorkerHandle { tx }, task)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<WorkerMessage>) {
        tracing::debug!("persistence worker started");
        while let Some(message) = rx.recv().await {
            self.handle_message(message).await;
        }
        tracing::debug!("persistence worker stopped");
    }

    /// Processes one message and delivers the reply, if one was requested.
    pub async fn handle_message(&self, message: WorkerMessage) {
        let WorkerMessage {
            request,
            reply,
            parent_span,
        } = message;

        let span = tracing::debug_span!(parent: &parent_span, "worker_handle_message", request = ?request);
        let response = self.dispatch(request).instrument(span).await;

        if let Some(reply) = reply {
            // The requester may have dropped its handle; that is fine.
            let _ = reply.send(response);
        }
    }

    async fn dispatch(&self, request: WorkerRequest) -> WorkerResponse {
        match request {
            WorkerRequest::SaveQuery { value } => self.handle_save_query(&value).await,
            WorkerRequest::ToggleFavorite {
                departure_code,
                destination_code,
            } => self.handle_toggle_favorite(departure_code, destination_code).await,
            WorkerRequest::RemoveFavorite { favorite } => self.handle_remove_favorite(favorite).await,
            WorkerRequest::Flush => WorkerResponse::Flushed,
        }
    }

    /// Standardizes logging for store results.
    fn handle_store_result<T, F>(operation: &str, result: Result<T>, on_success: F) -> WorkerResponse
    where
        F: FnOnce(T) -> WorkerResponse,
    {
        match result {
            Ok(value) => {
                tracing::debug!(operation = operation, "storage operation successful");
                on_success(value)
            }
            Err(e) => {
                tracing::warn!(operation = operation, error = %e, "storage operation failed");
                WorkerResponse::Error {
                    message: format!("{operation}: {e}"),
                }
            }
        }
    }

    async fn handle_save_query(&self, value: &str) -> WorkerResponse {
        let result = self.preferences.save_query(value).await;
        Self::handle_store_result("save query", result, |()| WorkerResponse::QuerySaved)
    }

    async fn handle_toggle_favorite(&self, departure_code: String, destination_code: String) -> WorkerResponse {
        let existing = match self.favorites.favorite(&departure_code, &destination_code).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(operation = "check favorite", error = %e, "storage operation failed");
                return WorkerResponse::Error {
                    message: format!("check favorite: {e}"),
                };
            }
        };

        if let Some(favorite) = existing {
            let result = self.favorites.delete_favorite(&favorite).await;
            Self::handle_store_result("delete favorite", result, |()| WorkerResponse::FavoriteRemoved {
                departure_code,
                destination_code,
            })
        } else {
            let result = self
                .favorites
                .insert_favorite(&departure_code, &destination_code)
                .await;
            Self::handle_store_result("insert favorite", result, |()| WorkerResponse::FavoriteAdded {
                departure_code,
                destination_code,
            })
        }
    }

    async fn handle_remove_favorite(&self, favorite: FavoriteRoute) -> WorkerResponse {
        let result = self.favorites.delete_favorite(&favorite).await;
        Self::handle_store_result("remove favorite", result, |()| WorkerResponse::FavoriteRemoved {
            departure_code: favorite.departure_code,
            destination_code: favorite.destination_code,
        })
    }
}

impl std::fmt::Debug for PersistenceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceWorker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonStorage, Stores};
    use futures_util::StreamExt;
    use tempfile::TempDir;

    fn spawn_worker() -> (TempDir, JsonStorage, WorkerHandle) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = JsonStorage::open(dir.path().join("store.json")).expect("open");
        let stores = Stores::from_backend(storage.clone());
        let worker = PersistenceWorker::new(stores.favorites, stores.preferences);
        let (handle, _task) = worker.spawn(&Handle::current());
        (dir, storage, handle)
    }

    async fn favorite_count(storage: &JsonStorage) -> usize {
        storage
            .all_favorites()
            .next()
            .await
            .expect("snapshot")
            .expect("query")
            .len()
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let (_dir, storage, worker) = spawn_worker();

        let added = worker
            .request(WorkerMessage::toggle_favorite("MUC".into(), "SFO".into()))
            .wait()
            .await;
        assert!(matches!(added, WorkerResponse::FavoriteAdded { .. }));
        assert_eq!(favorite_count(&storage).await, 1);

        let removed = worker
            .request(WorkerMessage::toggle_favorite("MUC".into(), "SFO".into()))
            .wait()
            .await;
        assert!(matches!(removed, WorkerResponse::FavoriteRemoved { .. }));
        assert_eq!(favorite_count(&storage).await, 0);
    }

    #[tokio::test]
    async fn test_queued_toggles_never_duplicate() {
        let (_dir, storage, worker) = spawn_worker();

        for _ in 0..3 {
            worker.post(WorkerMessage::toggle_favorite("MUC".into(), "SFO".into()));
        }
        assert_eq!(worker.request(WorkerMessage::flush()).wait().await, WorkerResponse::Flushed);

        assert_eq!(favorite_count(&storage).await, 1);
    }

    #[tokio::test]
    async fn test_save_query_is_last_write_wins() {
        let (_dir, storage, worker) = spawn_worker();

        worker.post(WorkerMessage::save_query("L".into()));
        worker.post(WorkerMessage::save_query("Lo".into()));
        worker.post(WorkerMessage::save_query("Lon".into()));
        worker.request(WorkerMessage::flush()).wait().await;

        assert_eq!(storage.saved_query().await.expect("read"), "Lon");
    }

    #[tokio::test]
    async fn test_remove_favorite_deletes_record() {
        let (_dir, storage, worker) = spawn_worker();
        storage.insert_favorite("LHR", "MUC").await.expect("insert");
        let favorite = storage
            .favorite("LHR", "MUC")
            .await
            .expect("read")
            .expect("present");

        let response = worker
            .request(WorkerMessage::remove_favorite(favorite))
            .wait()
            .await;
        assert!(matches!(response, WorkerResponse::FavoriteRemoved { .. }));
        assert_eq!(favorite_count(&storage).await, 0);
    }
}
