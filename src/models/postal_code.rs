//! Postal-code records as plotted on the map and listed in the table.

use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates are within `epsilon` degrees of `other`.
    pub fn is_near(&self, other: &GeoPoint, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() < epsilon && (self.lon - other.lon).abs() < epsilon
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lon, p.lat)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(p: geo::Point<f64>) -> Self {
        Self {
            lat: p.y(),
            lon: p.x(),
        }
    }
}

/// One postal-code record of the catalog.
///
/// No single field is unique. Two records describe the same entity when
/// their `(postal_code, latitude, longitude)` triple matches exactly, see
/// [`PostalCode::same_entity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalCode {
    pub postal_code: String,
    pub place_name: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,

    /// First-level division (admin_name1)
    pub region: String,
    pub region_code: String,
    /// Second-level division (admin_name2)
    pub department: String,
    pub department_code: String,
    /// Third-level division (admin_name3)
    pub sub_region: String,
    pub sub_region_code: String,

    /// Geonames precision level, 1 = estimated, 6 = centroid of addresses
    pub accuracy: u8,
}

impl PostalCode {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Identity comparison on the (postal code, latitude, longitude) triple.
    ///
    /// Coordinates are compared exactly, not within a tolerance.
    pub fn same_entity(&self, other: &PostalCode) -> bool {
        self.postal_code == other.postal_code
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }

    /// Stable key built from the identity triple, e.g. `"75001-48.8592-2.3417"`.
    pub fn identity_key(&self) -> String {
        format!("{}-{}-{}", self.postal_code, self.latitude, self.longitude)
    }

    /// Marker tooltip text: `"75001 - Paris 01"`.
    pub fn title(&self) -> String {
        format!("{} - {}", self.postal_code, self.place_name)
    }
}
