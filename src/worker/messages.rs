//! Worker message types for controller → worker communication.
//!
//! This module defines the request and response protocol between the search
//! controller and the background persistence worker. Each message captures the
//! `tracing` span that was current when it was built, so the worker's spans
//! nest under the operation that issued the request.

use crate::domain::FavoriteRoute;
use tokio::sync::oneshot;

/// A persistence request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest {
    /// Overwrite the saved search query.
    SaveQuery {
        value: String,
    },

    /// Add the route if absent, remove it if present.
    ToggleFavorite {
        departure_code: String,
        destination_code: String,
    },

    /// Remove exactly this route.
    RemoveFavorite {
        favorite: FavoriteRoute,
    },

    /// Completes once every earlier request has been processed.
    Flush,
}

/// A message queued for the worker: the request, where to reply, and the
/// span it was issued from.
#[derive(Debug)]
pub struct WorkerMessage {
    pub request: WorkerRequest,

    /// Reply channel; `None` for fire-and-forget requests.
    pub reply: Option<oneshot::Sender<WorkerResponse>>,

    /// Span current when the message was built.
    pub parent_span: tracing::Span,
}

impl WorkerMessage {
    /// Wraps a request, capturing the current span.
    #[must_use]
    pub fn new(request: WorkerRequest) -> Self {
        Self {
            request,
            reply: None,
            parent_span: tracing::Span::current(),
        }
    }

    /// Attaches a reply channel and returns the receiving side.
    #[must_use]
    pub fn with_reply(mut self) -> (Self, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        self.reply = Some(tx);
        (self, PendingResponse { rx })
    }
}

/// Macro to generate builder methods for `WorkerMessage` requests.
///
/// Each builder wraps the matching [`WorkerRequest`] variant and captures the
/// current span.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " message with the current span")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::new(WorkerRequest::$variant { $($field,)* })
                }
            )*
        }
    };
}

worker_message_builders! {
    save_query(SaveQuery { value: String }),
    toggle_favorite(ToggleFavorite { departure_code: String, destination_code: String }),
    remove_favorite(RemoveFavorite { favorite: FavoriteRoute }),
}

impl WorkerMessage {
    /// Create a Flush message with the current span.
    #[must_use]
    pub fn flush() -> Self {
        Self::new(WorkerRequest::Flush)
    }
}

/// Outcome of a worker request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerResponse {
    /// The query was written.
    QuerySaved,

    /// The route was inserted (or already present when the write ran).
    FavoriteAdded {
        departure_code: String,
        destination_code: String,
    },

    /// The route was removed.
    FavoriteRemoved {
        departure_code: String,
        destination_code: String,
    },

    /// Every earlier request has been processed.
    Flushed,

    /// The request failed.
    Error {
        /// Human-readable error message.
        message: String,
    },
}

/// Receiving side of a worker reply.
///
/// May be awaited with [`PendingResponse::wait`] or simply dropped; dropping
/// does not cancel the request.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<WorkerResponse>,
}

impl PendingResponse {
    /// A response that is already resolved, used when the worker is gone.
    #[must_use]
    pub fn ready(response: WorkerResponse) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(response);
        Self { rx }
    }

    /// Waits for the worker to process the request.
    ///
    /// Returns [`WorkerResponse::Error`] if the worker stopped before replying.
    pub async fn wait(self) -> WorkerResponse {
        self.rx.await.unwrap_or_else(|_| WorkerResponse::Error {
            message: "worker stopped before replying".to_string(),
        })
    }
}
