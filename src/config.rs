//! TOML configuration for the catalog client and the map view.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup against the public OpenDataSoft GeoNames dataset.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::map::FitOptions;
use crate::models::GeoPoint;

pub const DEFAULT_CATALOG_URL: &str =
    "https://public.opendatasoft.com/api/explore/v2.1/catalog/datasets/geonames-postal-code";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogSettings,
    pub map: MapSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogSettings {
    /// Dataset URL; `/facets` and `/records` are appended to it
    pub base_url: String,
    pub user_agent: String,
    pub facets_timeout_secs: u64,
    pub records_timeout_secs: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Records per postal-code page
    pub page_size: usize,
    /// Row cap of the grouped city query
    pub city_row_limit: usize,
    /// Honour HTTP(S)_PROXY environment variables
    pub use_env_proxy: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            user_agent: concat!("postmap/", env!("CARGO_PKG_VERSION")).to_string(),
            facets_timeout_secs: 10,
            records_timeout_secs: 15,
            max_retries: 2,
            retry_delay_ms: 1000,
            page_size: 100,
            city_row_limit: 10_000,
            use_env_proxy: true,
        }
    }
}

impl CatalogSettings {
    pub fn facets_timeout(&self) -> Duration {
        Duration::from_secs(self.facets_timeout_secs)
    }

    pub fn records_timeout(&self) -> Duration {
        Duration::from_secs(self.records_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapSettings {
    /// `[lat, lon]` of the world overview
    pub initial_center: [f64; 2],
    pub initial_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Zoom used when focusing a single record, also the ceiling for bound fitting
    pub marker_zoom: u8,
    /// Pixels kept free around fitted markers, `[x, y]`
    pub bounds_padding: [u32; 2],
    pub animation_ms: u64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            initial_center: [20.0, 0.0],
            initial_zoom: 2,
            min_zoom: 2,
            max_zoom: 18,
            marker_zoom: 10,
            bounds_padding: [20, 20],
            animation_ms: 500,
        }
    }
}

impl MapSettings {
    pub fn initial_center(&self) -> GeoPoint {
        GeoPoint::new(self.initial_center[0], self.initial_center[1])
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            padding: (self.bounds_padding[0], self.bounds_padding[1]),
            max_zoom: self.marker_zoom,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
