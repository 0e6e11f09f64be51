//! Core data models for the postal-code explorer.

pub mod country;
pub mod country_names;
pub mod postal_code;

pub use country::{City, Country};
pub use country_names::country_name;
pub use postal_code::{GeoPoint, PostalCode};
