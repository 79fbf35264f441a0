//! Background worker for ordered persistence writes.
//!
//! Query saves and favorite edits are queued to a single worker task instead
//! of being spawned independently, so they complete in issue order.
//!
//! # Architecture
//!
//! - `messages`: request/response protocol with span propagation
//! - `handler`: worker loop and request processing

pub mod handler;
pub mod messages;

pub use handler::{PersistenceWorker, WorkerHandle};
pub use messages::{PendingResponse, WorkerMessage, WorkerRequest, WorkerResponse};
