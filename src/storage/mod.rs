//! Storage layer for airports, favorite routes and the saved search query.
//!
//! The search core only sees the traits in [`backend`]; [`json`] is the
//! bundled file-backed implementation.
//!
//! # Modules
//!
//! - `backend`: store traits and the [`LiveSequence`] type
//! - `json`: JSON file-based implementation of all three stores
//! - `ranking`: matching and passenger-volume ordering
//! - `models`: storage record types separate from domain models

pub mod backend;
pub mod json;
pub mod models;
pub mod ranking;

pub use backend::{AirportStore, FavoriteStore, LiveSequence, PreferenceStore, Stores};
pub use json::{load_seed_file, parse_seeds, JsonStorage};
pub use models::{AirportRecord, AirportSeed, FavoriteRecord, PreferenceRecord};
pub use ranking::{rank_except, rank_matches, sort_by_passengers};
