//! Ranking and matching rules shared by the storage backends.
//!
//! Airports are ranked by descending passenger volume. The sort is stable, so
//! airports with equal volume keep the order they were given in, which for
//! the JSON backend is id order.

use crate::domain::Airport;

/// Sorts airports by passenger volume, busiest first.
///
/// # Examples
///
/// ```
/// use flight_search::Airport;
/// use flight_search::storage::sort_by_passengers;
///
/// let mut airports = vec![
///     Airport::new(1, "VCE", "Venice Marco Polo", 11_000_000),
///     Airport::new(2, "FCO", "Rome Fiumicino", 43_000_000),
/// ];
/// sort_by_passengers(&mut airports);
/// assert_eq!(airports[0].iata_code, "FCO");
/// ```
pub fn sort_by_passengers(airports: &mut [Airport]) {
    airports.sort_by(|a, b| b.passengers.cmp(&a.passengers));
}

/// Returns the airports matching `query`, ranked.
///
/// Matching is a case-insensitive substring test on IATA code or name.
#[must_use]
pub fn rank_matches<'a, I>(airports: I, query: &str) -> Vec<Airport>
where
    I: IntoIterator<Item = &'a Airport>,
{
    let mut matches: Vec<Airport> = airports
        .into_iter()
        .filter(|airport| airport.matches(query))
        .cloned()
        .collect();
    sort_by_passengers(&mut matches);
    matches
}

/// Returns every airport except the one whose IATA code equals `code`, ranked.
#[must_use]
pub fn rank_except<'a, I>(airports: I, code: &str) -> Vec<Airport>
where
    I: IntoIterator<Item = &'a Airport>,
{
    let mut others: Vec<Airport> = airports
        .into_iter()
        .filter(|airport| airport.iata_code != code)
        .cloned()
        .collect();
    sort_by_passengers(&mut others);
    others
}
