//! JSON file-based storage backend.
//!
//! This module provides a human-readable storage implementation using JSON
//! serialization. Every mutation is applied to a copy of the data, written with
//! an atomic file write (write-to-temp + rename), and only then committed to
//! memory, so memory and disk never disagree after a failed write.
//!
//! The async store methods run their file writes on the blocking pool, so a
//! slow disk never stalls lookups sharing the runtime.
//!
//! Live sequences are driven by per-table revision counters held in
//! `tokio::sync::watch` channels. A subscriber re-runs its query whenever the
//! revision of the table it reads is bumped.
//!
//! # Performance Characteristics
//!
//! - **Read**: in-memory scan of the table
//! - **Write**: O(n), serializes and writes the entire dataset
//! - **Best for**: a few thousand airports, infrequent writes

use crate::domain::error::{FlightSearchError, Result};
use crate::domain::{Airport, FavoriteRoute};
use crate::storage::backend::{AirportStore, FavoriteStore, LiveSequence, PreferenceStore};
use crate::storage::models::{AirportRecord, AirportSeed, FavoriteRecord, PreferenceRecord};
use crate::storage::ranking::{rank_except, rank_matches, sort_by_passengers};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::Instrument;

/// Preference key under which the last search query is stored.
const SEARCH_QUERY_KEY: &str = "search_query";

/// JSON storage container format.
///
/// Tables are keyed by id so that iteration order is the natural (id) order
/// used to break ranking ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageData {
    /// Version of the storage format for future migrations.
    version: u32,

    #[serde(default)]
    airports: BTreeMap<i64, AirportRecord>,

    #[serde(default)]
    favorites: BTreeMap<i64, FavoriteRecord>,

    #[serde(default)]
    preferences: BTreeMap<String, PreferenceRecord>,
}

impl Default for StorageData {
    fn default() -> Self {
        Self {
            version: 1,
            airports: BTreeMap::new(),
            favorites: BTreeMap::new(),
            preferences: BTreeMap::new(),
        }
    }
}

impl StorageData {
    fn airports(&self) -> Vec<Airport> {
        self.airports.values().map(Airport::from).collect()
    }

    fn favorites(&self) -> Vec<FavoriteRoute> {
        self.favorites.values().map(FavoriteRoute::from).collect()
    }

    fn next_id<V>(table: &BTreeMap<i64, V>) -> i64 {
        table.keys().next_back().map_or(1, |last| last.saturating_add(1))
    }
}

/// Which table a mutation touched, for change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Airports,
    Favorites,
    Preferences,
}

struct Inner {
    /// Path to the JSON file on disk.
    file_path: PathBuf,

    /// In-memory data, loaded on open.
    data: Mutex<StorageData>,

    /// Serializes writers; `data` is only locked to snapshot and commit.
    write: Mutex<()>,

    airports_revision: watch::Sender<u64>,
    favorites_revision: watch::Sender<u64>,
}

/// JSON file storage backend implementing all three store contracts.
///
/// Cheap to clone; clones share the same data and change notifications.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "airports": {
///     "1": { "id": 1, "iata_code": "MUC", "name": "Munich Airport", "passengers": 47959885 }
///   },
///   "favorites": {
///     "1": { "id": 1, "departure_code": "MUC", "destination_code": "SFO", "created_at": 1700000000 }
///   },
///   "preferences": {
///     "search_query": { "value": "MUC", "updated_at": 1700000000 }
///   }
/// }
/// ```
#[derive(Clone)]
pub struct JsonStorage {
    inner: Arc<Inner>,
}

impl JsonStorage {
    /// Creates or opens a JSON storage backend.
    ///
    /// If the file exists, loads existing data. Otherwise starts empty; the file
    /// is created on the first write. Parent directories are created eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - File exists but contains invalid JSON
    /// - File permissions prevent reading
    pub fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing JSON storage");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty storage");
            StorageData::default()
        };

        tracing::debug!(
            airport_count = data.airports.len(),
            favorite_count = data.favorites.len(),
            "storage initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                file_path,
                data: Mutex::new(data),
                write: Mutex::new(()),
                airports_revision: watch::Sender::new(0),
                favorites_revision: watch::Sender::new(0),
            }),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.inner.file_path
    }

    fn load_from_file(path: &Path) -> Result<StorageData> {
        let contents = std::fs::read_to_string(path)?;
        let data: StorageData = serde_json::from_str(&contents)
            .map_err(|e| FlightSearchError::Storage(format!("failed to parse JSON: {e}")))?;

        tracing::debug!(version = data.version, "loaded storage data");
        Ok(data)
    }

    /// Writes `data` to disk atomically.
    fn save_to_file(&self, data: &StorageData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| FlightSearchError::Storage(format!("failed to serialize JSON: {e}")))?;

        let tmp_path = self.inner.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.inner.file_path)?;

        tracing::trace!(path = ?self.inner.file_path, "storage saved");
        Ok(())
    }

    fn read<R>(&self, query: impl FnOnce(&StorageData) -> R) -> Result<R> {
        let data = self
            .inner
            .data
            .lock()
            .map_err(|_| FlightSearchError::Storage("storage lock poisoned".to_string()))?;
        Ok(query(&data))
    }

    /// Applies `change` to a copy of the data and commits it if it reports a change.
    ///
    /// `change` returns `(changed, value)`. Unchanged data is neither written
    /// nor announced to subscribers.
    fn mutate<R>(&self, table: Table, change: impl FnOnce(&mut StorageData) -> (bool, R)) -> Result<R> {
        let _writer = self
            .inner
            .write
            .lock()
            .map_err(|_| FlightSearchError::Storage("storage write lock poisoned".to_string()))?;

        let mut next = self.read(StorageData::clone)?;
        let (changed, value) = change(&mut next);
        if !changed {
            return Ok(value);
        }

        self.save_to_file(&next)?;
        *self
            .inner
            .data
            .lock()
            .map_err(|_| FlightSearchError::Storage("storage lock poisoned".to_string()))? = next;

        match table {
            Table::Airports => self.inner.airports_revision.send_modify(|rev| *rev += 1),
            Table::Favorites => self.inner.favorites_revision.send_modify(|rev| *rev += 1),
            Table::Preferences => {}
        }
        Ok(value)
    }

    /// Runs [`JsonStorage::mutate`] on the blocking pool, inside the caller's span.
    async fn mutate_blocking<R, F>(&self, table: Table, change: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut StorageData) -> (bool, R) + Send + 'static,
    {
        let storage = self.clone();
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| storage.mutate(table, change)))
            .await
            .map_err(|e| FlightSearchError::Storage(format!("storage write task failed: {e}")))?
    }

    /// Builds a live sequence that re-runs `query` on every revision bump.
    fn live<T, F>(&self, revisions: watch::Receiver<u64>, query: F) -> LiveSequence<T>
    where
        T: Send + 'static,
        F: Fn(&StorageData) -> Vec<T> + Send + Sync + 'static,
    {
        let initial = (self.clone(), revisions, Arc::new(query), true);
        stream::unfold(initial, |(storage, mut revisions, query, first)| async move {
            if !first && revisions.changed().await.is_err() {
                return None;
            }
            let snapshot = storage.read(|data| (*query)(data));
            Some((snapshot, (storage, revisions, query, false)))
        })
        .boxed()
    }

    /// Bulk-loads airports, assigning ids in the given order.
    ///
    /// Seeds whose IATA code is already present are skipped. Returns the
    /// number of airports inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn import_airports(&self, seeds: &[AirportSeed]) -> Result<usize> {
        let _span = tracing::debug_span!("json_import_airports", count = seeds.len()).entered();

        let inserted = self.mutate(Table::Airports, |data| {
            let mut inserted = 0;
            for seed in seeds {
                if data.airports.values().any(|a| a.iata_code == seed.iata_code) {
                    tracing::debug!(iata_code = %seed.iata_code, "skipping duplicate airport");
                    continue;
                }
                let id = StorageData::next_id(&data.airports);
                data.airports.insert(
                    id,
                    AirportRecord {
                        id,
                        iata_code: seed.iata_code.clone(),
                        name: seed.name.clone(),
                        passengers: seed.passengers,
                    },
                );
                inserted += 1;
            }
            (inserted > 0, inserted)
        })?;

        tracing::debug!(inserted, "airports imported");
        Ok(inserted)
    }

    /// Number of airports in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage lock is poisoned.
    pub fn airport_count(&self) -> Result<usize> {
        self.read(|data| data.airports.len())
    }
}

/// Reads a seed file: a JSON array of [`AirportSeed`] objects.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid seed list.
pub fn load_seed_file(path: &Path) -> Result<Vec<AirportSeed>> {
    let contents = std::fs::read_to_string(path)?;
    parse_seeds(&contents)
        .map_err(|e| FlightSearchError::Storage(format!("invalid airport seed file {}: {e}", path.display())))
}

/// Parses a JSON array of [`AirportSeed`] objects.
///
/// # Errors
///
/// Returns an error if `contents` is not a valid seed list.
pub fn parse_seeds(contents: &str) -> Result<Vec<AirportSeed>> {
    serde_json::from_str(contents).map_err(|e| FlightSearchError::Storage(e.to_string()))
}

#[async_trait]
impl AirportStore for JsonStorage {
    fn search_airports(&self, query: &str) -> LiveSequence<Airport> {
        tracing::debug!(query = %query, "subscribing to airport search");
        let query = query.to_string();
        self.live(self.inner.airports_revision.subscribe(), move |data| {
            rank_matches(&data.airports(), &query)
        })
    }

    fn airports_except(&self, code: &str) -> LiveSequence<Airport> {
        tracing::debug!(code = %code, "subscribing to destinations");
        let code = code.to_string();
        self.live(self.inner.airports_revision.subscribe(), move |data| {
            rank_except(&data.airports(), &code)
        })
    }

    fn all_airports(&self) -> LiveSequence<Airport> {
        self.live(self.inner.airports_revision.subscribe(), |data| {
            let mut airports = data.airports();
            sort_by_passengers(&mut airports);
            airports
        })
    }

    async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>> {
        let _span = tracing::debug_span!("json_airport_by_code", code = %code).entered();

        let airport = self.read(|data| {
            data.airports
                .values()
                .find(|record| record.iata_code == code)
                .map(Airport::from)
        })?;

        tracing::debug!(found = airport.is_some(), "airport lookup complete");
        Ok(airport)
    }
}

#[async_trait]
impl FavoriteStore for JsonStorage {
    fn all_favorites(&self) -> LiveSequence<FavoriteRoute> {
        self.live(self.inner.favorites_revision.subscribe(), StorageData::favorites)
    }

    async fn insert_favorite(&self, departure_code: &str, destination_code: &str) -> Result<()> {
        let span = tracing::debug_span!("json_insert_favorite",
            departure_code = %departure_code,
            destination_code = %destination_code
        );
        let departure_code = departure_code.to_string();
        let destination_code = destination_code.to_string();

        async move {
            let inserted = self
                .mutate_blocking(Table::Favorites, move |data| {
                    let exists = data
                        .favorites
                        .values()
                        .any(|f| f.departure_code == departure_code && f.destination_code == destination_code);
                    if exists {
                        return (false, false);
                    }
                    let id = StorageData::next_id(&data.favorites);
                    data.favorites
                        .insert(id, FavoriteRecord::new(id, &departure_code, &destination_code));
                    (true, true)
                })
                .await?;

            tracing::debug!(inserted, "favorite insert complete");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn delete_favorite(&self, favorite: &FavoriteRoute) -> Result<()> {
        let span = tracing::debug_span!("json_delete_favorite", favorite_id = favorite.id);
        let favorite = favorite.clone();

        async move {
            // Ids are reused after the highest one is deleted, so the pair must match too.
            let removed = self
                .mutate_blocking(Table::Favorites, move |data| {
                    let exact = data.favorites.get(&favorite.id).is_some_and(|record| {
                        record.departure_code == favorite.departure_code
                            && record.destination_code == favorite.destination_code
                    });
                    if exact {
                        data.favorites.remove(&favorite.id);
                    }
                    (exact, exact)
                })
                .await?;

            tracing::debug!(removed, "favorite delete complete");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn favorite(&self, departure_code: &str, destination_code: &str) -> Result<Option<FavoriteRoute>> {
        self.read(|data| {
            data.favorites
                .values()
                .find(|f| f.departure_code == departure_code && f.destination_code == destination_code)
                .map(FavoriteRoute::from)
        })
    }
}

#[async_trait]
impl PreferenceStore for JsonStorage {
    async fn saved_query(&self) -> Result<String> {
        self.read(|data| {
            data.preferences
                .get(SEARCH_QUERY_KEY)
                .map(|record| record.value.clone())
                .unwrap_or_default()
        })
    }

    async fn save_query(&self, value: &str) -> Result<()> {
        let span = tracing::debug_span!("json_save_query", value = %value);
        let value = value.to_string();

        self.mutate_blocking(Table::Preferences, move |data| {
            let unchanged = data
                .preferences
                .get(SEARCH_QUERY_KEY)
                .is_some_and(|record| record.value == value);
            if !unchanged {
                data.preferences
                    .insert(SEARCH_QUERY_KEY.to_string(), PreferenceRecord::new(&value));
            }
            (!unchanged, ())
        })
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for JsonStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStorage")
            .field("file_path", &self.inner.file_path)
            .finish_non_exhaustive()
    }
}
