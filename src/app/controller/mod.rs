//! The search controller: owner of [`SearchUiState`] and of every lookup that
//! writes to it.
//!
//! # Concurrency
//!
//! Operations are plain synchronous calls. Each one replaces the published
//! state immediately and, where needed, spawns a lookup task on the Tokio
//! runtime the controller was created on. Lookup tasks consume a
//! [`LiveSequence`] and publish each snapshot only while their generation is
//! still the current one for their [`LookupKind`].
//!
//! Locks are always taken in the same order: suggestions slot, destinations
//! slot, then the state channel. A lookup holds its own slot lock while it
//! publishes, so a superseded lookup can never overwrite the state written by
//! the operation that superseded it.
//!
//! Writes go through the [`PersistenceWorker`] and never block the caller.
//!
//! # Example
//!
//! ```no_run
//! use flight_search::app::SearchController;
//! use flight_search::storage::{JsonStorage, Stores};
//! use std::path::PathBuf;
//!
//! # async fn demo() -> flight_search::Result<()> {
//! let storage = JsonStorage::open(PathBuf::from("/tmp/flight_search.json"))?;
//! let controller = SearchController::new(Stores::from_backend(storage))?;
//! controller.start();
//! controller.on_query_changed("lon");
//!
//! let mut updates = controller.subscribe();
//! updates.changed().await.ok();
//! println!("{:?}", updates.borrow().suggestions);
//! # Ok(())
//! # }
//! ```

#[cfg(test)]
mod tests;

use super::lookup::{LookupKind, LookupSlot};
use super::modes::DisplayMode;
use super::state::SearchUiState;
use crate::domain::error::{FlightSearchError, Result};
use crate::domain::{Airport, FavoriteRoute};
use crate::storage::{LiveSequence, Stores};
use crate::worker::{PendingResponse, PersistenceWorker, WorkerHandle, WorkerMessage, WorkerResponse};
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Coordinates search input, lookups, favorites and the published state.
///
/// Cheap to clone; all clones drive the same state. Background work stops
/// when [`SearchController::shutdown`] is called or the last clone is dropped.
#[derive(Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

struct Inner {
    stores: Stores,
    runtime: Handle,
    shared: Arc<Shared>,
    worker: WorkerHandle,

    /// Mirrors and the startup restore.
    background: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

/// The part of the controller that lookup and mirror tasks hold on to.
struct Shared {
    state: watch::Sender<Arc<SearchUiState>>,
    suggestions: Mutex<LookupSlot>,
    destinations: Mutex<LookupSlot>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn slot(&self, kind: LookupKind) -> MutexGuard<'_, LookupSlot> {
        match kind {
            LookupKind::Suggestions => lock(&self.suggestions),
            LookupKind::Destinations => lock(&self.destinations),
        }
    }

    /// Publishes a modified copy of the current state.
    fn replace(&self, change: impl FnOnce(&mut SearchUiState)) {
        self.state.send_modify(|current| {
            let mut next = SearchUiState::clone(&**current);
            change(&mut next);
            *current = Arc::new(next);
        });
    }

    /// Publishes lookup results if `generation` is still current.
    ///
    /// Returns false once the lookup has been superseded.
    fn apply_lookup(&self, kind: LookupKind, generation: u64, airports: Vec<Airport>) -> bool {
        let slot = self.slot(kind);
        if !slot.is_current(generation) {
            return false;
        }
        self.replace(|state| match kind {
            LookupKind::Suggestions => state.suggestions = airports,
            LookupKind::Destinations => state.destinations = airports,
        });
        true
    }
}

impl SearchController {
    /// Creates a controller over `stores` and spawns its persistence worker.
    ///
    /// Published state starts empty; call [`SearchController::start`] to begin
    /// mirroring the stores and restoring the saved query.
    ///
    /// # Errors
    ///
    /// Returns [`FlightSearchError::Runtime`] when called outside a Tokio runtime.
    pub fn new(stores: Stores) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| FlightSearchError::Runtime(e.to_string()))?;
        let (worker, _worker_task) =
            PersistenceWorker::new(stores.favorites.clone(), stores.preferences.clone()).spawn(&runtime);
        let (state, _) = watch::channel(Arc::new(SearchUiState::default()));

        Ok(Self {
            inner: Arc::new(Inner {
                stores,
                runtime,
                shared: Arc::new(Shared {
                    state,
                    suggestions: Mutex::new(LookupSlot::default()),
                    destinations: Mutex::new(LookupSlot::default()),
                }),
                worker,
                background: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }),
        })
    }

    /// Starts the airport and favorite mirrors and the one-shot query restore.
    ///
    /// Calling it again has no effect.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("controller already started");
            return;
        }
        let _span = tracing::debug_span!("controller_start").entered();
        let stores = &self.inner.stores;

        let airports = self.spawn_mirror("airports", stores.airports.all_airports(), |state, airports| {
            state.all_airports = Arc::new(
                airports
                    .into_iter()
                    .map(|airport| (airport.iata_code.clone(), airport))
                    .collect(),
            );
        });
        let favorites = self.spawn_mirror("favorites", stores.favorites.all_favorites(), |state, favorites| {
            state.favorites = Arc::new(favorites);
        });
        let restore = self.inner.runtime.spawn(
            restore_saved_query(Arc::downgrade(&self.inner), stores.clone())
                .instrument(tracing::debug_span!("restore_saved_query")),
        );

        lock(&self.inner.background).extend([airports, favorites, restore]);
    }

    /// Handles new query text.
    ///
    /// Clears the selection, suggestions and destinations, saves the query,
    /// and starts a suggestion lookup unless the query is blank.
    pub fn on_query_changed(&self, query: &str) {
        let _span = tracing::debug_span!("on_query_changed", query).entered();
        let shared = &self.inner.shared;

        let mut suggestions = shared.slot(LookupKind::Suggestions);
        let mut destinations = shared.slot(LookupKind::Destinations);
        let generation = suggestions.cancel();
        destinations.cancel();

        shared.replace(|state| {
            state.search_query = query.to_string();
            state.selected_airport = None;
            state.suggestions.clear();
            state.destinations.clear();
        });
        self.inner.worker.post(WorkerMessage::save_query(query.to_string()));

        if query.trim().is_empty() {
            tracing::debug!("blank query, no lookup");
            return;
        }
        let results = self.inner.stores.airports.search_airports(query);
        suggestions.install(generation, self.spawn_lookup(LookupKind::Suggestions, generation, results));
    }

    /// Selects `airport` as the departure and starts streaming its destinations.
    pub fn select_airport(&self, airport: &Airport) {
        let _span = tracing::debug_span!("select_airport", code = %airport.iata_code).entered();
        let shared = &self.inner.shared;

        let mut suggestions = shared.slot(LookupKind::Suggestions);
        let mut destinations = shared.slot(LookupKind::Destinations);
        suggestions.cancel();
        let generation = destinations.cancel();

        shared.replace(|state| {
            state.search_query = airport.iata_code.clone();
            state.selected_airport = Some(airport.clone());
            state.suggestions.clear();
            state.destinations.clear();
        });
        self.inner
            .worker
            .post(WorkerMessage::save_query(airport.iata_code.clone()));

        let results = self.inner.stores.airports.airports_except(&airport.iata_code);
        destinations.install(generation, self.spawn_lookup(LookupKind::Destinations, generation, results));
    }

    /// Cancels both lookups and resets the query and selection.
    pub fn clear_search(&self) {
        let _span = tracing::debug_span!("clear_search").entered();
        let shared = &self.inner.shared;

        let mut suggestions = shared.slot(LookupKind::Suggestions);
        let mut destinations = shared.slot(LookupKind::Destinations);
        suggestions.cancel();
        destinations.cancel();

        shared.replace(|state| {
            state.search_query.clear();
            state.selected_airport = None;
            state.suggestions.clear();
            state.destinations.clear();
        });
        self.inner.worker.post(WorkerMessage::save_query(String::new()));
    }

    /// Adds the route if it is not a favorite, removes it otherwise.
    ///
    /// Toggles run one at a time in issue order, so two toggles of the same
    /// pair always cancel out. The returned handle may be dropped.
    pub fn toggle_favorite(&self, departure_code: &str, destination_code: &str) -> PendingResponse {
        tracing::debug!(departure_code, destination_code, "toggle favorite");
        self.inner.worker.request(WorkerMessage::toggle_favorite(
            departure_code.to_string(),
            destination_code.to_string(),
        ))
    }

    /// Removes exactly this favorite route.
    pub fn remove_favorite(&self, favorite: &FavoriteRoute) -> PendingResponse {
        tracing::debug!(id = favorite.id, "remove favorite");
        self.inner
            .worker
            .request(WorkerMessage::remove_favorite(favorite.clone()))
    }

    /// Checks the cached favorites mirror; may lag a pending toggle.
    #[must_use]
    pub fn is_favorite_route(&self, departure_code: &str, destination_code: &str) -> bool {
        self.state().is_favorite_route(departure_code, destination_code)
    }

    /// The current state snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<SearchUiState> {
        Arc::clone(&self.inner.shared.state.borrow())
    }

    /// A receiver that observes every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SearchUiState>> {
        self.inner.shared.state.subscribe()
    }

    #[must_use]
    pub fn display_mode(&self) -> DisplayMode {
        self.state().display_mode()
    }

    /// Waits until every persistence write issued so far has completed.
    ///
    /// # Errors
    ///
    /// Returns [`FlightSearchError::Worker`] if the worker is gone.
    pub async fn flush(&self) -> Result<()> {
        match self.inner.worker.request(WorkerMessage::flush()).wait().await {
            WorkerResponse::Error { message } => Err(FlightSearchError::Worker(message)),
            _ => Ok(()),
        }
    }

    /// Stops mirrors, lookups and the restore task.
    ///
    /// Queued writes still complete. Published state stays as it was.
    pub fn shutdown(&self) {
        tracing::debug!("controller shutdown");
        self.inner.abort_all();
    }

    fn spawn_lookup(&self, kind: LookupKind, generation: u64, results: LiveSequence<Airport>) -> JoinHandle<()> {
        let span = tracing::debug_span!("lookup", kind = kind.label(), generation);
        self.inner
            .runtime
            .spawn(run_lookup(self.inner.shared.clone(), kind, generation, results).instrument(span))
    }

    fn spawn_mirror<T, F>(&self, name: &'static str, sequence: LiveSequence<T>, apply: F) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Fn(&mut SearchUiState, Vec<T>) + Send + 'static,
    {
        let span = tracing::debug_span!("mirror", name);
        self.inner
            .runtime
            .spawn(run_mirror(self.inner.shared.clone(), name, sequence, apply).instrument(span))
    }
}

impl Inner {
    fn abort_all(&self) {
        for task in lock(&self.background).drain(..) {
            task.abort();
        }
        self.shared.slot(LookupKind::Suggestions).cancel();
        self.shared.slot(LookupKind::Destinations).cancel();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.abort_all();
    }
}

impl std::fmt::Debug for SearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchController")
            .field("started", &self.inner.started.load(Ordering::Relaxed))
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn run_lookup(shared: Arc<Shared>, kind: LookupKind, generation: u64, mut results: LiveSequence<Airport>) {
    while let Some(result) = results.next().await {
        let airports = result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "lookup failed, showing no results");
            Vec::new()
        });
        let count = airports.len();
        if !shared.apply_lookup(kind, generation, airports) {
            tracing::debug!("lookup superseded");
            return;
        }
        tracing::debug!(count, "lookup results applied");
    }
}

async fn run_mirror<T, F>(shared: Arc<Shared>, name: &'static str, mut sequence: LiveSequence<T>, apply: F)
where
    F: Fn(&mut SearchUiState, Vec<T>),
{
    while let Some(result) = sequence.next().await {
        match result {
            Ok(items) => {
                tracing::debug!(count = items.len(), "mirror updated");
                shared.replace(|state| apply(state, items));
            }
            Err(e) => tracing::warn!(error = %e, "mirror query failed, keeping previous value"),
        }
    }
    tracing::debug!(name, "mirror ended");
}

/// Reads the saved query once and replays it as a selection or as typed text.
async fn restore_saved_query(inner: Weak<Inner>, stores: Stores) {
    let saved = match stores.preferences.saved_query().await {
        Ok(saved) => saved,
        Err(e) => {
            tracing::warn!(error = %e, "could not read saved query");
            return;
        }
    };
    if saved.is_empty() {
        tracing::debug!("no saved query");
        return;
    }

    match inner.upgrade() {
        Some(inner) => inner.shared.replace(|state| {
            if state.selected_airport.is_none() {
                state.search_query.clone_from(&saved);
            }
        }),
        None => return,
    }

    let found = stores.airports.airport_by_code(&saved).await;
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let controller = SearchController { inner };
    match found {
        Ok(Some(airport)) => {
            tracing::debug!(code = %airport.iata_code, "restoring selection");
            controller.select_airport(&airport);
        }
        Ok(None) => {
            tracing::debug!("restoring query text");
            controller.on_query_changed(&saved);
        }
        Err(e) => {
            tracing::warn!(error = %e, "airport lookup failed, restoring query text");
            controller.on_query_changed(&saved);
        }
    }
}
