//! Error types for the flight search crate.
//!
//! [`FlightSearchError`] is the single error type shared by every layer, with a
//! [`Result`] alias for convenience. The search core itself never surfaces
//! these to the presentation layer; they travel between storage, worker and
//! bootstrap code and are logged where the core degrades to empty results.

use thiserror::Error;

/// The main error type for flight search operations.
#[derive(Debug, Error)]
pub enum FlightSearchError {
    /// Storage operation failed.
    ///
    /// Covers reading, parsing and writing the JSON store as well as a
    /// poisoned storage lock. The string describes what went wrong.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The background persistence worker is unreachable or dropped a reply.
    #[error("Worker communication error: {0}")]
    Worker(String),

    /// Configuration is invalid or could not be read.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No Tokio runtime was available to run background work.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A presentation intent referred to a row or code that does not exist.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

/// A specialized `Result` type for flight search operations.
pub type Result<T> = std::result::Result<T, FlightSearchError>;
