//! Published selection state and the views derived from it.

use std::sync::Arc;

use super::stats::{CityStats, CountryStats};
use crate::map::centroid_of;
use crate::models::{City, Country, PostalCode};

/// Sequence numbers identifying the selection a pending load was issued for.
///
/// Each level is bumped whenever that level, or one above it, is reset, so a
/// load completing after its context moved on can be recognised as stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SelectionContext {
    pub countries: u64,
    pub country: u64,
    pub city: u64,
}

/// Snapshot of the hierarchical selection.
///
/// Collections are shared behind `Arc`, so cloning a snapshot is cheap.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub countries: Arc<Vec<Country>>,
    pub selected_country: Option<Country>,
    pub cities: Arc<Vec<City>>,
    pub selected_city: Option<City>,
    pub postal_codes: Arc<Vec<PostalCode>>,
    /// Bumped every time `postal_codes` is replaced
    pub collection_version: u64,
    pub active_record: Option<PostalCode>,
    pub search_query: String,
    /// User-facing message of the last failed top-level load
    pub last_error: Option<String>,
    /// Bumped once per published mutation
    pub revision: u64,
    pub(crate) pending_loads: usize,
    pub(crate) context: SelectionContext,
}

impl SelectionState {
    pub fn is_loading(&self) -> bool {
        self.pending_loads > 0
    }

    pub fn has_selected_country(&self) -> bool {
        self.selected_country.is_some()
    }

    pub fn has_selected_city(&self) -> bool {
        self.selected_city.is_some()
    }

    /// Whether `record` is the active record, by identity triple
    pub fn is_active(&self, record: &PostalCode) -> bool {
        self.active_record
            .as_ref()
            .is_some_and(|active| active.same_entity(record))
    }

    /// Records matching the search query; all records when the query is blank.
    pub fn filtered_postal_codes(&self) -> Vec<&PostalCode> {
        let query = self.search_query.trim().to_lowercase();
        if query.is_empty() {
            return self.postal_codes.iter().collect();
        }

        self.postal_codes
            .iter()
            .filter(|code| matches_query(code, &query))
            .collect()
    }

    pub fn country_stats(&self) -> Option<CountryStats> {
        self.selected_country.as_ref()?;
        if self.cities.is_empty() {
            return None;
        }

        let total_postal_codes: u64 = self.cities.iter().map(|c| c.postal_count).sum();
        let total_cities = self.cities.len();

        Some(CountryStats {
            total_cities,
            total_postal_codes,
            avg_postal_codes_per_city: (total_postal_codes as f64 / total_cities as f64).round()
                as u64,
        })
    }

    pub fn city_stats(&self) -> Option<CityStats> {
        let city = self.selected_city.as_ref()?;
        let centroid = centroid_of(&self.postal_codes)?;

        let mut regions: Vec<&str> = self.postal_codes.iter().map(|c| c.region.as_str()).collect();
        regions.sort_unstable();
        regions.dedup();

        Some(CityStats {
            total_codes: self.postal_codes.len(),
            filtered_count: self.filtered_postal_codes().len(),
            expected_codes: city.postal_count,
            centroid,
            regions: regions.len(),
        })
    }

    /// Replace the collection; the active record survives only if it is a member.
    pub(crate) fn replace_postal_codes(&mut self, postal_codes: Vec<PostalCode>) {
        if let Some(active) = &self.active_record {
            if !postal_codes.iter().any(|c| c.same_entity(active)) {
                self.active_record = None;
            }
        }
        self.postal_codes = Arc::new(postal_codes);
        self.collection_version += 1;
    }

    /// Reset everything below the country level and invalidate pending city loads.
    pub(crate) fn reset_city_level(&mut self) {
        self.selected_city = None;
        self.active_record = None;
        self.search_query.clear();
        self.replace_postal_codes(Vec::new());
        self.context.city += 1;
    }
}

/// `query` must already be trimmed and lowercased
fn matches_query(code: &PostalCode, query: &str) -> bool {
    code.postal_code.to_lowercase().contains(query)
        || code.place_name.to_lowercase().contains(query)
        || code.region.to_lowercase().contains(query)
}
