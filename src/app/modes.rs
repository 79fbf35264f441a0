//! Display mode state machine.
//!
//! The presentation layer is always in exactly one [`DisplayMode`]. The mode is
//! never stored: it is derived from the search query, the selected airport and
//! the favorites list, so no combination of fields can disagree with it.
//!
//! # Precedence
//!
//! 1. An airport is selected → [`DisplayMode::Selected`]
//! 2. The query is non-blank → [`DisplayMode::Suggesting`]
//! 3. Favorites exist → [`DisplayMode::Favorites`]
//! 4. Otherwise → [`DisplayMode::Idle`]
//!
//! # Example
//!
//! ```rust
//! use flight_search::app::DisplayMode;
//!
//! assert_eq!(DisplayMode::derive("", false, false), DisplayMode::Idle);
//! assert_eq!(DisplayMode::derive("mu", false, true), DisplayMode::Suggesting);
//! ```

/// What the presentation layer is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// Empty query, nothing selected, no favorites: show a prompt.
    Idle,

    /// Non-blank query, nothing selected: show autocomplete suggestions.
    Suggesting,

    /// An airport is selected: show its destinations.
    Selected,

    /// Empty query, nothing selected, favorites exist: show favorite routes.
    Favorites,
}

impl DisplayMode {
    /// Derives the mode from the three inputs that drive it.
    #[must_use]
    pub fn derive(search_query: &str, has_selection: bool, has_favorites: bool) -> Self {
        if has_selection {
            Self::Selected
        } else if !search_query.trim().is_empty() {
            Self::Suggesting
        } else if has_favorites {
            Self::Favorites
        } else {
            Self::Idle
        }
    }

    /// Short label for headers and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Suggesting => "suggestions",
            Self::Selected => "destinations",
            Self::Favorites => "favorites",
        }
    }
}
