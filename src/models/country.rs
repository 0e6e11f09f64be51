//! Country and city entries of the selection hierarchy.

use serde::{Deserialize, Serialize};

/// A country of the catalog with its number of postal-code records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code, unique key
    pub code: String,
    /// Human readable name
    pub name: String,
    /// Number of postal-code records in the catalog
    pub count: u64,
}

/// A place name within one country, with the number of postal codes it groups.
///
/// `name` is only unique within one country's city list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub postal_count: u64,
    pub country_code: String,
}

impl City {
    pub fn belongs_to(&self, country: &Country) -> bool {
        self.country_code == country.code
    }
}
