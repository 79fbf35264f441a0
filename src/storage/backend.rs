//! Storage backend abstraction.
//!
//! This module defines the three store contracts the search core depends on:
//! [`AirportStore`], [`FavoriteStore`] and [`PreferenceStore`]. Queries that the
//! core keeps watching are returned as a [`LiveSequence`]: a stream whose first
//! item is the current snapshot and which yields a fresh snapshot whenever the
//! underlying data changes.
//!
//! # Design Philosophy
//!
//! The traits are minimal and map directly onto what the controller and the
//! persistence worker need, not onto a generic repository API.

use crate::domain::error::Result;
use crate::domain::{Airport, FavoriteRoute};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;

/// A restartable, unbounded sequence of query snapshots.
///
/// Each subscription starts with the current result. An `Err` item reports a
/// failed query; the sequence may continue afterwards.
pub type LiveSequence<T> = BoxStream<'static, Result<Vec<T>>>;

/// Read access to the airport table.
///
/// All ranked queries order by descending passenger count, ties in the
/// store's natural order.
#[async_trait]
pub trait AirportStore: Send + Sync {
    /// Airports whose IATA code or name contains `query`, ignoring case.
    fn search_airports(&self, query: &str) -> LiveSequence<Airport>;

    /// Every airport except the one whose IATA code is exactly `code`.
    fn airports_except(&self, code: &str) -> LiveSequence<Airport>;

    /// Every airport.
    fn all_airports(&self) -> LiveSequence<Airport>;

    /// Exact, case-sensitive lookup by IATA code.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails. A missing airport is `Ok(None)`.
    async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>>;
}

/// Read and write access to favorite routes.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Every favorite route, in id order.
    fn all_favorites(&self) -> LiveSequence<FavoriteRoute>;

    /// Inserts a route. Inserting a pair that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn insert_favorite(&self, departure_code: &str, destination_code: &str) -> Result<()>;

    /// Removes exactly this route (matched by id).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Deleting an absent route is not an error.
    async fn delete_favorite(&self, favorite: &FavoriteRoute) -> Result<()>;

    /// Exact pair lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn favorite(&self, departure_code: &str, destination_code: &str) -> Result<Option<FavoriteRoute>>;
}

/// Durable storage for the last search query.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Returns the saved query, or an empty string if none was ever saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn saved_query(&self) -> Result<String>;

    /// Overwrites the saved query.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn save_query(&self, value: &str) -> Result<()>;
}

/// Shared handles to the three stores, as consumed by the controller.
#[derive(Clone)]
pub struct Stores {
    pub airports: Arc<dyn AirportStore>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl Stores {
    /// Uses one backend for all three contracts.
    ///
    /// ```no_run
    /// use flight_search::storage::{JsonStorage, Stores};
    /// use std::path::PathBuf;
    ///
    /// let storage = JsonStorage::open(PathBuf::from("/tmp/flight_search.json"))?;
    /// let stores = Stores::from_backend(storage);
    /// # Ok::<(), flight_search::FlightSearchError>(())
    /// ```
    pub fn from_backend<S>(backend: S) -> Self
    where
        S: AirportStore + FavoriteStore + PreferenceStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            airports: backend.clone(),
            favorites: backend.clone(),
            preferences: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
