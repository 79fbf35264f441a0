//! Airport domain model.

use serde::{Deserialize, Serialize};

/// An airport as loaded from the airport store.
///
/// Immutable once loaded. `passengers` is the yearly traffic volume used to
/// rank search results and destinations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Airport {
    pub id: i64,
    pub iata_code: String,
    pub name: String,
    pub passengers: i64,
}

impl Airport {
    /// Creates an airport value.
    ///
    /// ```
    /// use flight_search::Airport;
    ///
    /// let muc = Airport::new(1, "MUC", "Munich Airport", 47_959_885);
    /// assert_eq!(muc.iata_code, "MUC");
    /// ```
    #[must_use]
    pub fn new(id: i64, iata_code: impl Into<String>, name: impl Into<String>, passengers: i64) -> Self {
        Self {
            id,
            iata_code: iata_code.into(),
            name: name.into(),
            passengers,
        }
    }

    /// Returns true if `query` occurs in the IATA code or the name, ignoring case.
    ///
    /// ```
    /// use flight_search::Airport;
    ///
    /// let lhr = Airport::new(1, "LHR", "London Heathrow Airport", 80_000_000);
    /// assert!(lhr.matches("lond"));
    /// assert!(lhr.matches("hr"));
    /// assert!(!lhr.matches("muc"));
    /// ```
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.iata_code.to_lowercase().contains(&needle) || self.name.to_lowercase().contains(&needle)
    }
}
