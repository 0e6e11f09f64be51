//! Raw response bodies of the OpenDataSoft explore API (v2.1).
//!
//! Only the fields the explorer reads are modelled. Everything is optional
//! or defaulted because dataset rows are not guaranteed to be complete.

use serde::{Deserialize, Serialize};

/// `GET {dataset}/facets?facet=country_code`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetsResponse {
    #[serde(default)]
    pub facets: Vec<FacetGroup>,
}

/// One faceted field and its values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetGroup {
    /// Faceted field name, e.g. "country_code"
    pub name: String,
    #[serde(default)]
    pub facets: Vec<FacetValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetValue {
    /// ISO code for the country facet
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub value: String,
}

/// `GET {dataset}/records?select=place_name,count(*) as postal_count&group_by=place_name`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupedCitiesResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub results: Vec<GroupedCity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupedCity {
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub postal_count: u64,
}

/// One `limit`/`offset` page of `GET {dataset}/records`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsPage {
    /// Number of records matching the query across all pages
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub results: Vec<PostalCodeRecord>,
}

/// A GeoNames postal-code row as stored in the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostalCodeRecord {
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub admin_name1: Option<String>,
    #[serde(default)]
    pub admin_code1: Option<String>,
    #[serde(default)]
    pub admin_name2: Option<String>,
    #[serde(default)]
    pub admin_code2: Option<String>,
    #[serde(default)]
    pub admin_name3: Option<String>,
    #[serde(default)]
    pub admin_code3: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<u8>,
    /// Geo point duplicate of latitude/longitude
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}
