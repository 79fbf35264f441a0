//! Infrastructure layer for filesystem and environment interactions.
//!
//! Resolves where the store and trace files live and expands `~` in
//! user-supplied paths.

pub mod paths;

pub use paths::{expand_tilde, get_data_dir};
