//! Favorite route domain model.

use serde::{Deserialize, Serialize};

/// A user-marked departure → destination pair.
///
/// At most one route exists per `(departure_code, destination_code)` pair. Routes
/// are created and deleted, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteRoute {
    pub id: i64,
    pub departure_code: String,
    pub destination_code: String,
}

impl FavoriteRoute {
    /// Returns true if this route connects exactly the given codes.
    #[must_use]
    pub fn connects(&self, departure_code: &str, destination_code: &str) -> bool {
        self.departure_code == departure_code && self.destination_code == destination_code
    }
}
