//! Domain layer: airports, favorite routes and errors.
//!
//! These types are independent of storage layout and of the controller. The
//! storage layer converts its own records into them.
//!
//! - [`airport`]: the [`Airport`] value
//! - [`favorite`]: the [`FavoriteRoute`] value
//! - [`error`]: [`FlightSearchError`] and the [`Result`] alias

pub mod airport;
pub mod error;
pub mod favorite;

pub use airport::Airport;
pub use error::{FlightSearchError, Result};
pub use favorite::FavoriteRoute;
