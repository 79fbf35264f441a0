//! Flight search: airport autocomplete, ranked destinations and favorite
//! routes behind a race-free search state machine.
//!
//! A user types part of an airport name or code, gets ranked suggestions,
//! picks a departure airport, sees every other airport as a destination
//! ordered by passenger traffic, and marks departure → destination pairs as
//! favorites. The last query is saved and replayed on the next start.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Shell (main.rs)                                    │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │ Event
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - SearchController: lookups, mirrors, restore      │
//! │  - SearchUiState: published, replaced wholesale     │
//! │  - DisplayMode: derived, never stored               │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Storage Layer │   │ Worker Layer  │
//! │ (ui/)         │   │ (storage/)    │   │ (worker/)     │
//! │ - View model  │   │ - Store traits│   │ - Query saves │
//! │ - Text render │   │ - JSON backend│   │ - Favorites   │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain, Infrastructure, Observability              │
//! │  - Airport, FavoriteRoute, errors (domain/)         │
//! │  - Data directory paths (infrastructure/)           │
//! │  - OTLP JSON trace file (observability/)            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Search controller, state and intents
//! - [`domain`]: Core domain types (Airport, FavoriteRoute, errors)
//! - [`infrastructure`]: Platform paths
//! - [`storage`]: Store contracts and the JSON file backend
//! - [`worker`]: Ordered background persistence
//! - [`ui`]: View model and plain-text rendering
//! - [`observability`]: OpenTelemetry tracing to a file
//!
//! # Configuration
//!
//! Read from a TOML file, every key optional:
//!
//! ```toml
//! data_dir = "~/.local/share/flight-search"
//! airports_file = "~/airports.json"
//! trace_level = "debug"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use flight_search::app::SearchController;
//! use flight_search::storage::Stores;
//! use flight_search::{initialize, Config};
//!
//! # async fn demo() -> flight_search::Result<()> {
//! let storage = initialize(&Config::default())?;
//! let controller = SearchController::new(Stores::from_backend(storage))?;
//! controller.start();
//! controller.on_query_changed("lon");
//! # Ok(())
//! # }
//! ```

#![allow(clippy::multiple_crate_versions)]

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod storage;
pub mod ui;
pub mod worker;

pub use app::{handle_event, DisplayMode, Event, SearchController, SearchUiState};
pub use domain::{Airport, FavoriteRoute, FlightSearchError, Result};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use storage::{load_seed_file, parse_seeds, JsonStorage};

/// Airports seeded into an empty store when no `airports_file` is configured.
pub const BUNDLED_AIRPORTS: &str = include_str!("../data/airports.json");

/// File name of the store inside the data directory.
pub const STORAGE_FILE_NAME: &str = "flight_search.json";

/// File name of the trace export inside the data directory.
pub const TRACE_FILE_NAME: &str = "flight-search-otlp.json";

/// Runtime configuration.
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the store and the trace file.
    ///
    /// Default: `flight-search` under the platform data directory.
    pub data_dir: PathBuf,

    /// JSON array of `{iata_code, name, passengers}` used to seed an empty
    /// store. The bundled list is used when unset.
    pub airports_file: Option<PathBuf>,

    /// Tracing filter directive, e.g. `debug` or `flight_search=trace`.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: infrastructure::get_data_dir(),
            airports_file: None,
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses a TOML document and expands `~` in its paths.
    ///
    /// # Errors
    ///
    /// Returns [`FlightSearchError::Config`] for malformed TOML or unknown keys.
    ///
    /// # Example
    ///
    /// ```rust
    /// use flight_search::Config;
    ///
    /// let config = Config::from_toml_str("trace_level = \"debug\"")?;
    /// assert_eq!(config.trace_level.as_deref(), Some("debug"));
    /// assert!(config.airports_file.is_none());
    /// # Ok::<(), flight_search::FlightSearchError>(())
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| FlightSearchError::Config(e.to_string()))?;
        Ok(config.expanded())
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`FlightSearchError::Config`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(infrastructure::expand_tilde(path))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            FlightSearchError::Config(message) => {
                FlightSearchError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Returns the config with `~` expanded in every path.
    #[must_use]
    pub fn expanded(mut self) -> Self {
        self.data_dir = infrastructure::expand_tilde(&self.data_dir);
        self.airports_file = self.airports_file.map(|path| infrastructure::expand_tilde(&path));
        self
    }

    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE_NAME)
    }

    #[must_use]
    pub fn trace_file(&self) -> PathBuf {
        self.data_dir.join(TRACE_FILE_NAME)
    }
}

/// Opens the store and seeds it if it has no airports yet.
///
/// Seeds come from `config.airports_file` when set, otherwise from
/// [`BUNDLED_AIRPORTS`].
///
/// # Errors
///
/// Returns an error if the store cannot be opened or written, or the seed
/// file cannot be read or parsed.
///
/// # Example
///
/// ```rust
/// use flight_search::{initialize, Config};
///
/// let dir = tempfile::tempdir()?;
/// let config = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };
/// let storage = initialize(&config)?;
/// assert!(storage.airport_count()? > 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn initialize(config: &Config) -> Result<JsonStorage> {
    let _span = tracing::debug_span!("initialize", data_dir = %config.data_dir.display()).entered();

    let storage = JsonStorage::open(config.storage_path())?;
    if storage.airport_count()? > 0 {
        tracing::debug!("store already seeded");
        return Ok(storage);
    }

    let seeds = match &config.airports_file {
        Some(path) => load_seed_file(path)?,
        None => parse_seeds(BUNDLED_AIRPORTS)?,
    };
    let inserted = storage.import_airports(&seeds)?;
    tracing::info!(inserted, "seeded empty airport store");
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").expect("parse");
        assert_eq!(config, Config::default().expanded());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = Config::from_toml_str("scan_depth = 4");
        assert!(matches!(result, Err(FlightSearchError::Config(_))));
    }

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = Config::from_toml_str("data_dir = \"/srv/flights\"").expect("parse");
        assert_eq!(config.storage_path(), PathBuf::from("/srv/flights/flight_search.json"));
        assert_eq!(config.trace_file(), PathBuf::from("/srv/flights/flight-search-otlp.json"));
    }

    #[test]
    fn test_bundled_airports_parse() {
        let seeds = parse_seeds(BUNDLED_AIRPORTS).expect("bundled seeds");
        assert!(seeds.iter().any(|seed| seed.iata_code == "MUC"));
    }

    #[test]
    fn test_initialize_seeds_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let seed_file = dir.path().join("airports.json");
        std::fs::write(
            &seed_file,
            r#"[{"iata_code":"MUC","name":"Munich Airport","passengers":1}]"#,
        )
        .expect("write seeds");
        let config = Config {
            data_dir: dir.path().join("data"),
            airports_file: Some(seed_file.clone()),
            trace_level: None,
        };

        assert_eq!(initialize(&config).expect("first").airport_count().expect("count"), 1);

        std::fs::write(
            &seed_file,
            r#"[{"iata_code":"SFO","name":"San Francisco International Airport","passengers":2}]"#,
        )
        .expect("rewrite seeds");
        assert_eq!(initialize(&config).expect("second").airport_count().expect("count"), 1);
    }

    #[test]
    fn test_initialize_reports_bad_seed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            airports_file: Some(dir.path().join("missing.json")),
            trace_level: None,
        };
        assert!(initialize(&config).is_err());
    }
}
