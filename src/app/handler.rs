//! Presentation intents and their dispatch onto the controller.
//!
//! A front end translates raw input into an [`Event`] and passes it to
//! [`handle_event`]. Index-based events refer to rows of the list that is
//! currently displayed, resolved against the controller's latest snapshot.
//!
//! # Event Types
//!
//! - **Input**: `QueryChanged`, `ClearSearch`
//! - **Selection**: `SelectSuggestion`, `SelectCode`
//! - **Favorites**: `ToggleDestination`, `ToggleFavorite`, `RemoveFavorite`
//!
//! # Example
//!
//! ```no_run
//! use flight_search::app::{handle_event, Event, SearchController};
//! # fn demo(controller: &SearchController) -> flight_search::Result<()> {
//! handle_event(controller, &Event::QueryChanged("lon".into()))?;
//! handle_event(controller, &Event::SelectSuggestion(0))?;
//! # Ok(())
//! # }
//! ```

use super::controller::SearchController;
use crate::domain::error::{FlightSearchError, Result};

/// User intents forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The search text changed.
    QueryChanged(String),

    /// Picks the suggestion at this row.
    SelectSuggestion(usize),

    /// Picks an airport by IATA code.
    SelectCode(String),

    /// Resets the query and selection.
    ClearSearch,

    /// Toggles the route from the selected airport to the destination at this row.
    ToggleDestination(usize),

    /// Toggles an explicit route.
    ToggleFavorite {
        departure_code: String,
        destination_code: String,
    },

    /// Removes the favorite route at this row of the favorites list.
    RemoveFavorite(usize),
}

/// Applies `event` to the controller.
///
/// Favorite edits are queued without waiting for them to complete.
///
/// # Errors
///
/// Returns [`FlightSearchError::InvalidSelection`] when a row index is out of
/// range, no airport is selected for `ToggleDestination`, or a code is unknown.
pub fn handle_event(controller: &SearchController, event: &Event) -> Result<()> {
    let _span = tracing::debug_span!("handle_event", event = ?event).entered();
    let state = controller.state();

    match event {
        Event::QueryChanged(query) => controller.on_query_changed(query),
        Event::SelectSuggestion(index) => {
            let airport = state
                .suggestions
                .get(*index)
                .ok_or_else(|| out_of_range("suggestion", *index, state.suggestions.len()))?;
            controller.select_airport(airport);
        }
        Event::SelectCode(code) => {
            let airport = state
                .all_airports
                .get(code.as_str())
                .or_else(|| state.all_airports.get(&code.to_uppercase()))
                .ok_or_else(|| FlightSearchError::InvalidSelection(format!("unknown airport code {code}")))?;
            controller.select_airport(airport);
        }
        Event::ClearSearch => controller.clear_search(),
        Event::ToggleDestination(index) => {
            let departure = state
                .selected_airport
                .as_ref()
                .ok_or_else(|| FlightSearchError::InvalidSelection("no departure airport selected".into()))?;
            let destination = state
                .destinations
                .get(*index)
                .ok_or_else(|| out_of_range("destination", *index, state.destinations.len()))?;
            let _ = controller.toggle_favorite(&departure.iata_code, &destination.iata_code);
        }
        Event::ToggleFavorite {
            departure_code,
            destination_code,
        } => {
            let _ = controller.toggle_favorite(departure_code, destination_code);
        }
        Event::RemoveFavorite(index) => {
            let favorite = state
                .favorites
                .get(*index)
                .ok_or_else(|| out_of_range("favorite", *index, state.favorites.len()))?;
            let _ = controller.remove_favorite(favorite);
        }
    }
    Ok(())
}

fn out_of_range(list: &str, index: usize, len: usize) -> FlightSearchError {
    tracing::debug!(list, index, len, "row out of range");
    FlightSearchError::InvalidSelection(format!("no {list} at row {index} (have {len})"))
}
