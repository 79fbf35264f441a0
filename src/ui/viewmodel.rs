//! View model types representing renderable UI state.
//!
//! View models are computed from a `SearchUiState` snapshot via
//! `SearchUiState::compute_viewmodel()` and consumed by a renderer. They hold
//! display-ready data only: resolved airport names, highlight ranges and
//! favorite markers.
//!
//! # Example
//!
//! ```rust
//! use flight_search::app::DisplayMode;
//! use flight_search::ui::viewmodel::{HeaderInfo, SearchBarInfo, UIViewModel};
//!
//! let vm = UIViewModel {
//!     mode: DisplayMode::Idle,
//!     header: HeaderInfo { title: "Flight search".to_string() },
//!     search_bar: SearchBarInfo { query: String::new() },
//!     display_items: vec![],
//!     empty_state: None,
//! };
//! assert!(vm.display_items.is_empty());
//! ```

use crate::app::DisplayMode;

/// Complete UI view model for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UIViewModel {
    /// The single active display mode.
    pub mode: DisplayMode,

    /// Header information (title and count).
    pub header: HeaderInfo,

    /// The search input, always present.
    pub search_bar: SearchBarInfo,

    /// Rows to display, in order.
    pub display_items: Vec<DisplayItem>,

    /// Message shown instead of rows when there is nothing to list.
    pub empty_state: Option<EmptyState>,
}

/// One row of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayItem {
    /// An autocomplete suggestion.
    Suggestion(SuggestionItem),

    /// A departure → destination pair (destinations and favorites lists).
    Flight(FlightItem),
}

/// Display information for an autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionItem {
    pub code: String,
    pub name: String,

    /// Byte ranges of `code` matching the query, `(start, end)` exclusive end.
    pub code_highlights: Vec<(usize, usize)>,

    /// Byte ranges of `name` matching the query.
    pub name_highlights: Vec<(usize, usize)>,
}

/// Display information for a flight row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightItem {
    pub departure: AirportLabel,
    pub destination: AirportLabel,
    pub is_favorite: bool,
}

/// An airport code with its name, if the name could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportLabel {
    pub code: String,
    pub name: Option<String>,
}

/// Header display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
}

/// Search bar display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarInfo {
    pub query: String,
}

/// Empty state message display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    /// Primary message (e.g., "No airports match").
    pub message: String,

    /// Secondary explanatory text.
    pub subtitle: String,
}
