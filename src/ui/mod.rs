//! Presentation-side view models and a plain-text renderer.
//!
//! ```text
//! SearchUiState → compute_viewmodel → UIViewModel → render_to_string → text
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: View model types representing renderable UI state
//! - [`renderer`]: Plain-text rendering of view models

pub mod renderer;
pub mod viewmodel;

pub use renderer::{render, render_to_string};
pub use viewmodel::{
    AirportLabel, DisplayItem, EmptyState, FlightItem, HeaderInfo, SearchBarInfo, SuggestionItem, UIViewModel,
};
