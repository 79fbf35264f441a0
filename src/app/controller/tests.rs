use super::*;
use crate::storage::{AirportSeed, AirportStore, FavoriteStore, JsonStorage, PreferenceStore};
use async_trait::async_trait;
use futures_util::stream;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

const TIMEOUT: Duration = Duration::from_secs(5);

fn seeds() -> Vec<AirportSeed> {
    vec![
        AirportSeed::new("MUC", "Munich Airport", 47_959_885),
        AirportSeed::new("LGW", "London Gatwick Airport", 46_576_473),
        AirportSeed::new("SFO", "San Francisco International Airport", 57_793_313),
        AirportSeed::new("LHR", "London Heathrow Airport", 80_888_305),
        AirportSeed::new("LCY", "London City Airport", 5_129_478),
        AirportSeed::new("ABZ", "Aberdeen Airport", 3_100_000),
        AirportSeed::new("ABQ", "Albuquerque International Sunport", 5_000_000),
    ]
}

fn open_storage() -> (TempDir, JsonStorage) {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = JsonStorage::open(dir.path().join("flight_search.json")).expect("open");
    storage.import_airports(&seeds()).expect("seed");
    (dir, storage)
}

fn codes(airports: &[Airport]) -> Vec<&str> {
    airports.iter().map(|airport| airport.iata_code.as_str()).collect()
}

async fn wait_until<F>(controller: &SearchController, predicate: F) -> Arc<SearchUiState>
where
    F: FnMut(&Arc<SearchUiState>) -> bool,
{
    let mut updates = controller.subscribe();
    let state = tokio::time::timeout(TIMEOUT, updates.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("controller dropped");
    Arc::clone(&state)
}

/// Lets other tasks run for a while without waiting on a condition.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Airport store that holds back chosen lookups until released.
struct GatedAirports {
    inner: JsonStorage,
    search_gates: Mutex<HashMap<String, Arc<Notify>>>,
    except_gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl GatedAirports {
    fn new(inner: JsonStorage) -> Self {
        Self {
            inner,
            search_gates: Mutex::new(HashMap::new()),
            except_gates: Mutex::new(HashMap::new()),
        }
    }

    fn gate_search(&self, query: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.search_gates).insert(query.to_string(), gate.clone());
        gate
    }

    fn gate_except(&self, code: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.except_gates).insert(code.to_string(), gate.clone());
        gate
    }

    fn gated(gate: Option<Arc<Notify>>, sequence: LiveSequence<Airport>) -> LiveSequence<Airport> {
        match gate {
            Some(gate) => stream::once(async move {
                gate.notified().await;
                sequence
            })
            .flatten()
            .boxed(),
            None => sequence,
        }
    }
}

#[async_trait]
impl AirportStore for GatedAirports {
    fn search_airports(&self, query: &str) -> LiveSequence<Airport> {
        let gate = lock(&self.search_gates).get(query).cloned();
        Self::gated(gate, self.inner.search_airports(query))
    }

    fn airports_except(&self, code: &str) -> LiveSequence<Airport> {
        let gate = lock(&self.except_gates).get(code).cloned();
        Self::gated(gate, self.inner.airports_except(code))
    }

    fn all_airports(&self) -> LiveSequence<Airport> {
        self.inner.all_airports()
    }

    async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>> {
        self.inner.airport_by_code(code).await
    }
}

fn gated_controller(storage: &JsonStorage) -> (SearchController, Arc<GatedAirports>) {
    let airports = Arc::new(GatedAirports::new(storage.clone()));
    let backend = Arc::new(storage.clone());
    let stores = Stores {
        airports: airports.clone(),
        favorites: backend.clone(),
        preferences: backend,
    };
    (SearchController::new(stores).expect("controller"), airports)
}

/// Airport store whose every query fails.
struct FailingAirports;

#[async_trait]
impl AirportStore for FailingAirports {
    fn search_airports(&self, _query: &str) -> LiveSequence<Airport> {
        stream::iter([Err(FlightSearchError::Storage("search failed".into()))]).boxed()
    }

    fn airports_except(&self, _code: &str) -> LiveSequence<Airport> {
        stream::iter([Err(FlightSearchError::Storage("listing failed".into()))]).boxed()
    }

    fn all_airports(&self) -> LiveSequence<Airport> {
        stream::iter([Err(FlightSearchError::Storage("listing failed".into()))]).boxed()
    }

    async fn airport_by_code(&self, _code: &str) -> Result<Option<Airport>> {
        Err(FlightSearchError::Storage("lookup failed".into()))
    }
}

#[test]
fn test_new_outside_runtime_is_an_error() {
    let (_dir, storage) = open_storage();
    let result = SearchController::new(Stores::from_backend(storage));
    assert!(matches!(result, Err(FlightSearchError::Runtime(_))));
}

#[tokio::test]
async fn test_suggestions_are_ranked_substring_matches() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");

    controller.on_query_changed("lon");
    let state = wait_until(&controller, |state| !state.suggestions.is_empty()).await;

    assert_eq!(codes(&state.suggestions), vec!["LHR", "LGW", "LCY"]);
    assert_eq!(state.display_mode(), DisplayMode::Suggesting);
}

#[tokio::test]
async fn test_suggestions_match_code_ignoring_case() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");

    controller.on_query_changed("ab");
    let state = wait_until(&controller, |state| !state.suggestions.is_empty()).await;

    assert_eq!(codes(&state.suggestions), vec!["ABQ", "ABZ"]);
}

#[tokio::test]
async fn test_blank_query_starts_no_lookup() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");

    controller.on_query_changed("  ");
    settle().await;

    let state = controller.state();
    assert_eq!(state.search_query, "  ");
    assert!(state.suggestions.is_empty());
    assert_eq!(state.display_mode(), DisplayMode::Idle);
}

#[tokio::test]
async fn test_superseded_suggestions_never_applied() {
    let (_dir, storage) = open_storage();
    let (controller, airports) = gated_controller(&storage);
    let slow = airports.gate_search("A");

    controller.on_query_changed("A");
    controller.on_query_changed("AB");
    let state = wait_until(&controller, |state| !state.suggestions.is_empty()).await;
    assert_eq!(codes(&state.suggestions), vec!["ABQ", "ABZ"]);

    slow.notify_one();
    settle().await;

    let state = controller.state();
    assert_eq!(state.search_query, "AB");
    assert_eq!(codes(&state.suggestions), vec!["ABQ", "ABZ"]);
}

#[tokio::test]
async fn test_stale_lookup_cannot_publish_after_cancel() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");
    let shared = controller.inner.shared.clone();

    let stale = shared.slot(LookupKind::Suggestions).cancel();
    controller.on_query_changed("lon");

    assert!(!shared.apply_lookup(LookupKind::Suggestions, stale, vec![Airport::new(99, "XXX", "Stale", 1)]));
    let state = wait_until(&controller, |state| !state.suggestions.is_empty()).await;
    assert_eq!(codes(&state.suggestions), vec!["LHR", "LGW", "LCY"]);
}

#[tokio::test]
async fn test_select_airport_streams_ranked_destinations() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");
    let muc = storage.airport_by_code("MUC").await.expect("read").expect("present");

    controller.on_query_changed("mu");
    controller.select_airport(&muc);
    let state = wait_until(&controller, |state| !state.destinations.is_empty()).await;

    assert_eq!(state.search_query, "MUC");
    assert_eq!(state.selected_airport.as_ref(), Some(&muc));
    assert!(state.suggestions.is_empty());
    assert_eq!(
        codes(&state.destinations),
        vec!["LHR", "SFO", "LGW", "LCY", "ABQ", "ABZ"]
    );
    assert_eq!(state.display_mode(), DisplayMode::Selected);
}

#[tokio::test]
async fn test_destinations_follow_airport_changes() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");
    let muc = storage.airport_by_code("MUC").await.expect("read").expect("present");

    controller.select_airport(&muc);
    wait_until(&controller, |state| state.destinations.len() == 6).await;

    storage
        .import_airports(&[AirportSeed::new("DXB", "Dubai International Airport", 86_994_365)])
        .expect("import");
    let state = wait_until(&controller, |state| state.destinations.len() == 7).await;
    assert_eq!(state.destinations[0].iata_code, "DXB");
}

#[tokio::test]
async fn test_clear_search_discards_in_flight_destinations() {
    let (_dir, storage) = open_storage();
    let (controller, airports) = gated_controller(&storage);
    let slow = airports.gate_except("MUC");
    let muc = storage.airport_by_code("MUC").await.expect("read").expect("present");

    controller.select_airport(&muc);
    controller.clear_search();
    slow.notify_one();
    settle().await;

    let state = controller.state();
    assert!(state.selected_airport.is_none());
    assert!(state.destinations.is_empty());
    assert!(state.search_query.is_empty());
}

#[tokio::test]
async fn test_query_change_discards_in_flight_destinations() {
    let (_dir, storage) = open_storage();
    let (controller, airports) = gated_controller(&storage);
    let slow = airports.gate_except("MUC");
    let muc = storage.airport_by_code("MUC").await.expect("read").expect("present");

    controller.select_airport(&muc);
    controller.on_query_changed("lon");
    slow.notify_one();
    wait_until(&controller, |state| !state.suggestions.is_empty()).await;
    settle().await;

    let state = controller.state();
    assert!(state.selected_airport.is_none());
    assert!(state.destinations.is_empty());
}

#[tokio::test]
async fn test_toggle_twice_restores_membership() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");
    controller.start();

    let added = controller.toggle_favorite("MUC", "SFO").wait().await;
    assert!(matches!(added, WorkerResponse::FavoriteAdded { .. }));
    wait_until(&controller, |state| state.is_favorite_route("MUC", "SFO")).await;
    assert!(controller.is_favorite_route("MUC", "SFO"));

    let removed = controller.toggle_favorite("MUC", "SFO").wait().await;
    assert!(matches!(removed, WorkerResponse::FavoriteRemoved { .. }));
    let state = wait_until(&controller, |state| state.favorites.is_empty()).await;
    assert!(!state.is_favorite_route("MUC", "SFO"));
    assert!(storage.favorite("MUC", "SFO").await.expect("read").is_none());
}

#[tokio::test]
async fn test_rapid_toggles_never_duplicate() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");

    for _ in 0..3 {
        let _ = controller.toggle_favorite("MUC", "SFO");
    }
    let _ = controller.toggle_favorite("LHR", "MUC");
    controller.flush().await.expect("flush");

    let favorites = storage.all_favorites().next().await.expect("snapshot").expect("query");
    let pairs: Vec<(&str, &str)> = favorites
        .iter()
        .map(|favorite| (favorite.departure_code.as_str(), favorite.destination_code.as_str()))
        .collect();
    assert_eq!(pairs, vec![("MUC", "SFO"), ("LHR", "MUC")]);
}

#[tokio::test]
async fn test_remove_favorite_updates_mirror() {
    let (_dir, storage) = open_storage();
    storage.insert_favorite("LHR", "MUC").await.expect("insert");
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");
    controller.start();

    let state = wait_until(&controller, |state| state.favorites.len() == 1).await;
    assert_eq!(state.display_mode(), DisplayMode::Favorites);

    controller.remove_favorite(&state.favorites[0]).wait().await;
    let state = wait_until(&controller, |state| state.favorites.is_empty()).await;
    assert_eq!(state.display_mode(), DisplayMode::Idle);
}

#[tokio::test]
async fn test_start_restores_saved_airport_code() {
    let (_dir, storage) = open_storage();
    storage.save_query("MUC").await.expect("save");
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");

    controller.start();
    let state = wait_until(&controller, |state| {
        state.selected_airport.is_some() && !state.destinations.is_empty()
    })
    .await;

    assert_eq!(state.search_query, "MUC");
    assert_eq!(state.selected_airport.as_ref().map(|a| a.iata_code.as_str()), Some("MUC"));
    assert_eq!(
        codes(&state.destinations),
        vec!["LHR", "SFO", "LGW", "LCY", "ABQ", "ABZ"]
    );
}

#[tokio::test]
async fn test_start_restores_saved_text_as_query() {
    let (_dir, storage) = open_storage();
    storage.save_query("Lond").await.expect("save");
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");

    controller.start();
    let state = wait_until(&controller, |state| !state.suggestions.is_empty()).await;

    assert_eq!(state.search_query, "Lond");
    assert!(state.selected_airport.is_none());
    assert_eq!(codes(&state.suggestions), vec!["LHR", "LGW", "LCY"]);
}

#[tokio::test]
async fn test_start_is_idempotent_and_mirrors_airports() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");

    controller.start();
    controller.start();
    let state = wait_until(&controller, |state| !state.all_airports.is_empty()).await;

    assert_eq!(state.all_airports.len(), 7);
    assert_eq!(state.airport_name("SFO"), Some("San Francisco International Airport"));
    assert_eq!(lock(&controller.inner.background).len(), 3);
}

#[tokio::test]
async fn test_query_change_shares_airport_mirror() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage)).expect("controller");

    controller.start();
    let before = wait_until(&controller, |state| !state.all_airports.is_empty()).await;
    controller.on_query_changed("lon");
    let after = controller.state();

    assert_eq!(after.search_query, "lon");
    assert!(Arc::ptr_eq(&before.all_airports, &after.all_airports));
}

#[tokio::test]
async fn test_failed_lookups_degrade_to_empty() {
    let (_dir, storage) = open_storage();
    storage.save_query("MUC").await.expect("save");
    let backend = Arc::new(storage);
    let stores = Stores {
        airports: Arc::new(FailingAirports),
        favorites: backend.clone(),
        preferences: backend,
    };
    let controller = SearchController::new(stores).expect("controller");

    controller.start();
    wait_until(&controller, |state| state.search_query == "MUC").await;
    settle().await;

    let state = controller.state();
    assert!(state.selected_airport.is_none());
    assert!(state.suggestions.is_empty());
    assert!(state.all_airports.is_empty());

    controller.select_airport(&Airport::new(1, "MUC", "Munich Airport", 1));
    settle().await;
    assert!(controller.state().destinations.is_empty());
}

#[tokio::test]
async fn test_query_changes_are_persisted() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");
    let muc = storage.airport_by_code("MUC").await.expect("read").expect("present");

    controller.on_query_changed("M");
    controller.on_query_changed("Mu");
    controller.flush().await.expect("flush");
    assert_eq!(storage.saved_query().await.expect("read"), "Mu");

    controller.select_airport(&muc);
    controller.flush().await.expect("flush");
    assert_eq!(storage.saved_query().await.expect("read"), "MUC");

    controller.clear_search();
    controller.flush().await.expect("flush");
    assert_eq!(storage.saved_query().await.expect("read"), "");
}

#[tokio::test]
async fn test_display_mode_follows_transitions() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");
    let muc = storage.airport_by_code("MUC").await.expect("read").expect("present");
    controller.start();
    assert_eq!(controller.display_mode(), DisplayMode::Idle);

    controller.toggle_favorite("MUC", "SFO").wait().await;
    wait_until(&controller, |state| !state.favorites.is_empty()).await;
    assert_eq!(controller.display_mode(), DisplayMode::Favorites);

    controller.on_query_changed("mu");
    assert_eq!(controller.display_mode(), DisplayMode::Suggesting);

    controller.select_airport(&muc);
    assert_eq!(controller.display_mode(), DisplayMode::Selected);

    controller.on_query_changed("");
    assert_eq!(controller.display_mode(), DisplayMode::Favorites);

    controller.select_airport(&muc);
    controller.clear_search();
    assert_eq!(controller.display_mode(), DisplayMode::Favorites);

    controller.toggle_favorite("MUC", "SFO").wait().await;
    wait_until(&controller, |state| state.favorites.is_empty()).await;
    assert_eq!(controller.display_mode(), DisplayMode::Idle);
}

#[tokio::test]
async fn test_every_published_state_has_one_mode() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");
    let muc = storage.airport_by_code("MUC").await.expect("read").expect("present");
    let mut updates = controller.subscribe();
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while updates.changed().await.is_ok() {
            let state = Arc::clone(&updates.borrow_and_update());
            seen.push(state);
        }
        seen
    });

    controller.start();
    controller.on_query_changed("lon");
    controller.select_airport(&muc);
    controller.on_query_changed("s");
    controller.clear_search();
    controller.flush().await.expect("flush");
    settle().await;
    drop(controller);

    let seen = tokio::time::timeout(TIMEOUT, observer)
        .await
        .expect("observer finished")
        .expect("observer task");
    assert!(!seen.is_empty());
    for state in seen {
        let mode = state.display_mode();
        match mode {
            DisplayMode::Selected => {
                assert!(state.selected_airport.is_some());
                assert!(state.suggestions.is_empty());
            }
            DisplayMode::Suggesting => {
                assert!(state.selected_airport.is_none());
                assert!(!state.search_query.trim().is_empty());
                assert!(state.destinations.is_empty());
            }
            DisplayMode::Favorites | DisplayMode::Idle => {
                assert!(state.showing_favorites());
                assert!(state.suggestions.is_empty());
                assert!(state.destinations.is_empty());
                assert_eq!(mode == DisplayMode::Favorites, !state.favorites.is_empty());
            }
        }
    }
}

#[tokio::test]
async fn test_shutdown_stops_background_work() {
    let (_dir, storage) = open_storage();
    let controller = SearchController::new(Stores::from_backend(storage.clone())).expect("controller");
    controller.start();
    wait_until(&controller, |state| !state.all_airports.is_empty()).await;

    controller.shutdown();
    storage
        .import_airports(&[AirportSeed::new("DXB", "Dubai International Airport", 86_994_365)])
        .expect("import");
    settle().await;

    assert_eq!(controller.state().all_airports.len(), 7);
    assert!(lock(&controller.inner.background).is_empty());
}
