//! Published search state and view model computation.
//!
//! This module defines [`SearchUiState`], the single value the controller
//! publishes to the presentation layer. It is never mutated in place once
//! published: every transition clones the current value, changes it, and swaps
//! the new value in as a whole. Readers therefore always see a consistent
//! snapshot. The two store mirrors sit behind `Arc`, so a transition that
//! leaves them alone shares them with the previous snapshot.
//!
//! # State Components
//!
//! - **Query**: the text the user typed (or the restored query)
//! - **Suggestions**: results of the current suggestion lookup
//! - **Selection**: the chosen departure airport and its destinations
//! - **Favorites**: live mirror of the favorite store
//! - **All Airports**: live mirror of the airport store, keyed by IATA code,
//!   used to resolve names for favorite rows
//!
//! # Example
//!
//! ```rust
//! use flight_search::app::{DisplayMode, SearchUiState};
//!
//! let state = SearchUiState::default();
//! assert_eq!(state.display_mode(), DisplayMode::Idle);
//! assert!(state.showing_favorites());
//! ```

use super::modes::DisplayMode;
use crate::domain::{Airport, FavoriteRoute};
use crate::ui::viewmodel::{
    AirportLabel, DisplayItem, EmptyState, FlightItem, HeaderInfo, SearchBarInfo, SuggestionItem, UIViewModel,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchUiState {
    /// Current search text.
    pub search_query: String,

    /// Suggestions for `search_query`, by descending passenger count.
    ///
    /// Written only by the current suggestion lookup.
    pub suggestions: Vec<Airport>,

    /// The chosen departure airport, if any.
    pub selected_airport: Option<Airport>,

    /// Every airport except `selected_airport`, by descending passenger count.
    ///
    /// Written only by the current destination lookup.
    pub destinations: Vec<Airport>,

    /// Live mirror of the favorite store, in id order.
    pub favorites: Arc<Vec<FavoriteRoute>>,

    /// Live mirror of the airport store, keyed by IATA code.
    pub all_airports: Arc<HashMap<String, Airport>>,
}

impl SearchUiState {
    /// The display mode this snapshot is in.
    #[must_use]
    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode::derive(
            &self.search_query,
            self.selected_airport.is_some(),
            !self.favorites.is_empty(),
        )
    }

    /// True when the query is blank and no airport is selected.
    ///
    /// Whether favorites are actually listed also depends on there being any;
    /// see [`SearchUiState::display_mode`].
    #[must_use]
    pub fn showing_favorites(&self) -> bool {
        self.search_query.trim().is_empty() && self.selected_airport.is_none()
    }

    /// Checks the cached favorites for an exact pair.
    #[must_use]
    pub fn is_favorite_route(&self, departure_code: &str, destination_code: &str) -> bool {
        self.favorites
            .iter()
            .any(|favorite| favorite.connects(departure_code, destination_code))
    }

    /// Resolves a display name through the airport mirror.
    #[must_use]
    pub fn airport_name(&self, code: &str) -> Option<&str> {
        self.all_airports.get(code).map(|airport| airport.name.as_str())
    }

    /// Computes a renderable view model from this snapshot.
    ///
    /// Rows depend on the display mode: suggestions with highlighted matches,
    /// destination rows for the selected airport, or favorite rows. Idle and
    /// empty lists produce an [`EmptyState`] instead of rows.
    ///
    /// # Example
    ///
    /// ```rust
    /// use flight_search::app::{DisplayMode, SearchUiState};
    /// use flight_search::Airport;
    ///
    /// let state = SearchUiState {
    ///     search_query: "mu".into(),
    ///     suggestions: vec![Airport::new(1, "MUC", "Munich Airport", 47_959_885)],
    ///     ..SearchUiState::default()
    /// };
    /// let vm = state.compute_viewmodel();
    /// assert_eq!(vm.mode, DisplayMode::Suggesting);
    /// assert_eq!(vm.display_items.len(), 1);
    /// ```
    #[must_use]
    pub fn compute_viewmodel(&self) -> UIViewModel {
        let mode = self.display_mode();
        let _span = tracing::trace_span!("compute_viewmodel", mode = mode.label()).entered();

        let display_items: Vec<DisplayItem> = match mode {
            DisplayMode::Idle => vec![],
            DisplayMode::Suggesting => self
                .suggestions
                .iter()
                .map(|airport| self.compute_suggestion_item(airport))
                .collect(),
            DisplayMode::Selected => match &self.selected_airport {
                Some(departure) => self
                    .destinations
                    .iter()
                    .map(|destination| self.compute_flight_item(&departure.iata_code, &destination.iata_code))
                    .collect(),
                None => vec![],
            },
            DisplayMode::Favorites => self
                .favorites
                .iter()
                .map(|favorite| self.compute_flight_item(&favorite.departure_code, &favorite.destination_code))
                .collect(),
        };

        let empty_state = if display_items.is_empty() {
            Some(self.compute_empty_state(mode))
        } else {
            None
        };

        UIViewModel {
            mode,
            header: self.compute_header(mode, display_items.len()),
            search_bar: SearchBarInfo {
                query: self.search_query.clone(),
            },
            display_items,
            empty_state,
        }
    }

    fn compute_suggestion_item(&self, airport: &Airport) -> DisplayItem {
        DisplayItem::Suggestion(SuggestionItem {
            code: airport.iata_code.clone(),
            name: airport.name.clone(),
            code_highlights: match_ranges(&airport.iata_code, &self.search_query),
            name_highlights: match_ranges(&airport.name, &self.search_query),
        })
    }

    fn compute_flight_item(&self, departure_code: &str, destination_code: &str) -> DisplayItem {
        DisplayItem::Flight(FlightItem {
            departure: self.compute_label(departure_code),
            destination: self.compute_label(destination_code),
            is_favorite: self.is_favorite_route(departure_code, destination_code),
        })
    }

    fn compute_label(&self, code: &str) -> AirportLabel {
        AirportLabel {
            code: code.to_string(),
            name: self.airport_name(code).map(str::to_string),
        }
    }

    fn compute_header(&self, mode: DisplayMode, count: usize) -> HeaderInfo {
        let title = match (mode, &self.selected_airport) {
            (DisplayMode::Selected, Some(airport)) => {
                format!("Flights from {} ({}) · {count}", airport.iata_code, airport.name)
            }
            (DisplayMode::Suggesting, _) => format!("Airports · {count}"),
            (DisplayMode::Favorites, _) => format!("Favorite routes · {count}"),
            _ => "Flight search".to_string(),
        };
        HeaderInfo { title }
    }

    fn compute_empty_state(&self, mode: DisplayMode) -> EmptyState {
        let (message, subtitle) = match mode {
            DisplayMode::Idle => ("Search for an airport", "Type a city, airport name or IATA code"),
            DisplayMode::Suggesting => ("No airports match", "Try a shorter or different query"),
            DisplayMode::Selected => ("No destinations yet", "Destinations appear as they load"),
            DisplayMode::Favorites => ("No favorite routes", ""),
        };
        EmptyState {
            message: message.to_string(),
            subtitle: subtitle.to_string(),
        }
    }
}

/// Byte ranges of `text` where `query` occurs, ignoring case.
///
/// Returns nothing for a blank query, or when lowercasing would shift byte
/// offsets (the ranges could not be mapped back onto `text`).
fn match_ranges(text: &str, query: &str) -> Vec<(usize, usize)> {
    if query.trim().is_empty() {
        return vec![];
    }
    let haystack = text.to_lowercase();
    let needle = query.to_lowercase();
    if haystack.len() != text.len() {
        return vec![];
    }
    haystack
        .match_indices(&needle)
        .map(|(start, matched)| (start, start + matched.len()))
        .filter(|&(start, end)| text.is_char_boundary(start) && text.is_char_boundary(end))
        .collect()
}
