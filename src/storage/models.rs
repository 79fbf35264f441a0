//! Storage record models for the persistence layer.
//!
//! These are the on-disk shapes. They are kept separate from the domain types
//! so that bookkeeping fields (timestamps) never leak into the search core.

use crate::domain::{Airport, FavoriteRoute};
use serde::{Deserialize, Serialize};

/// Represents an airport record in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportRecord {
    /// Surrogate key; also the natural (tie-breaking) order of the table.
    pub id: i64,

    /// Three-letter IATA code, unique within the table.
    pub iata_code: String,

    /// Full airport name.
    pub name: String,

    /// Yearly passenger volume used for ranking.
    pub passengers: i64,
}

impl From<&AirportRecord> for Airport {
    fn from(record: &AirportRecord) -> Self {
        Self {
            id: record.id,
            iata_code: record.iata_code.clone(),
            name: record.name.clone(),
            passengers: record.passengers,
        }
    }
}

/// An airport to be imported, before an id has been assigned.
///
/// This is the element type of the seed file (`data/airports.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportSeed {
    pub iata_code: String,
    pub name: String,
    pub passengers: i64,
}

impl AirportSeed {
    pub fn new(iata_code: impl Into<String>, name: impl Into<String>, passengers: i64) -> Self {
        Self {
            iata_code: iata_code.into(),
            name: name.into(),
            passengers,
        }
    }
}

/// Represents a favorite route record in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: i64,
    pub departure_code: String,
    pub destination_code: String,

    /// Unix timestamp when the route was marked.
    pub created_at: i64,
}

impl FavoriteRecord {
    /// Creates a new favorite record stamped with the current time.
    pub fn new(id: i64, departure_code: impl Into<String>, destination_code: impl Into<String>) -> Self {
        Self {
            id,
            departure_code: departure_code.into(),
            destination_code: destination_code.into(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

impl From<&FavoriteRecord> for FavoriteRoute {
    fn from(record: &FavoriteRecord) -> Self {
        Self {
            id: record.id,
            departure_code: record.departure_code.clone(),
            destination_code: record.destination_code.clone(),
        }
    }
}

/// A single persisted preference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub value: String,

    /// Unix timestamp of the last write.
    pub updated_at: i64,
}

impl PreferenceRecord {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}
