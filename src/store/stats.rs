//! Display-only aggregates over the current selection.

use serde::Serialize;

use crate::models::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStats {
    pub total_cities: usize,
    /// Sum of the cities' postal counts
    pub total_postal_codes: u64,
    pub avg_postal_codes_per_city: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStats {
    /// Records loaded for the city
    pub total_codes: usize,
    /// Records left after the search filter
    pub filtered_count: usize,
    /// Count announced by the city list
    pub expected_codes: u64,
    /// Arithmetic mean of the record coordinates
    pub centroid: GeoPoint,
    /// Distinct region names
    pub regions: usize,
}
