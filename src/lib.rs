//! Postmap - postal-code map explorer core
//!
//! Loads countries, cities and postal codes from a remote catalog, keeps the
//! country > city > postal code > active record selection in one store, and
//! keeps a marker map and a results table in step with it.

pub mod catalog;
pub mod config;
pub mod explorer;
pub mod map;
pub mod models;
pub mod store;
pub mod table;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, CatalogClient, CatalogError};
pub use config::Config;
pub use explorer::Explorer;
pub use models::{City, Country, GeoPoint, PostalCode};
pub use store::{LoadOutcome, SelectionState, SelectionStore};
