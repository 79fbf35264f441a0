//! Application layer: the search state machine and its controller.
//!
//! This module sits between the presentation layer (the shell in `main.rs`)
//! and the storage/worker layers.
//!
//! # Architecture
//!
//! ```text
//! Intent → handle_event → SearchController → replace SearchUiState → subscribers
//!                               │                     ↑
//!                               ├─ lookups (live) ────┘
//!                               └─ PersistenceWorker (writes)
//! ```
//!
//! # Modules
//!
//! - [`controller`]: Owner of the published state, lookups and mirrors
//! - [`handler`]: Presentation intents dispatched onto the controller
//! - [`lookup`]: Generation-tagged slots for cancelable lookups
//! - [`modes`]: Display mode derivation
//! - [`state`]: Published state snapshot and view model computation

pub mod controller;
pub mod handler;
pub mod lookup;
pub mod modes;
pub mod state;

pub use controller::SearchController;
pub use handler::{handle_event, Event};
pub use lookup::{LookupKind, LookupSlot};
pub use modes::DisplayMode;
pub use state::SearchUiState;
