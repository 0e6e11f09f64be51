//! Selection store: the single source of truth for country, city,
//! postal-code collection, active record and search filter.
//!
//! All mutation goes through the store's operations. Every mutation publishes
//! a new [`SelectionState`] snapshot on a `watch` channel, which is how the map
//! and the table observe it. Asynchronous loads are tagged with the selection
//! context they were issued for and only committed if that context is still
//! current when they complete.

mod state;
mod stats;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::catalog::mapper::{map_cities, map_countries};
use crate::catalog::{Catalog, PaginationAggregator, DEFAULT_PAGE_SIZE};
use crate::models::{City, Country, PostalCode};

pub use state::SelectionState;
pub use stats::{CityStats, CountryStats};

use state::SelectionContext;

/// How an asynchronous load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Results were committed
    Applied,
    /// The catalog failed; the documented fallback was committed
    Failed,
    /// The selection moved on while loading; results were dropped
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no country is selected")]
    NoCountrySelected,

    #[error("city {city} belongs to {city_country}, not to the selected country {selected}")]
    CountryMismatch {
        city: String,
        city_country: String,
        selected: String,
    },

    #[error("unknown country code {0}")]
    UnknownCountry(String),

    #[error("unknown city {0}")]
    UnknownCity(String),
}

pub struct SelectionStore<C> {
    catalog: C,
    page_size: usize,
    state: watch::Sender<SelectionState>,
}

impl<C: Catalog> SelectionStore<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_page_size(catalog, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(catalog: C, page_size: usize) -> Self {
        let (state, _) = watch::channel(SelectionState::default());
        Self {
            catalog,
            page_size,
            state,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Receiver notified on every published mutation
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    /// Fetch the country list. On failure the previous list is kept.
    pub async fn load_countries(&self) -> LoadOutcome {
        let mut ticket = 0;
        self.update(|s| {
            s.context.countries += 1;
            ticket = s.context.countries;
            s.pending_loads += 1;
            s.last_error = None;
        });

        info!("Loading countries");
        let result = self
            .catalog
            .fetch_country_facets()
            .await
            .map(map_countries);
        if let Err(e) = &result {
            error!("Failed to load countries: {}", e);
        }

        let mut outcome = LoadOutcome::Discarded;
        self.settle(
            |ctx| ctx.countries == ticket,
            |s| {
                outcome = match result {
                    Ok(countries) => {
                        info!("Loaded {} countries", countries.len());
                        s.countries = Arc::new(countries);
                        LoadOutcome::Applied
                    }
                    Err(e) => {
                        s.last_error = Some(e.user_message());
                        LoadOutcome::Failed
                    }
                };
            },
        );
        if outcome == LoadOutcome::Discarded {
            debug!("Discarding superseded country list");
        }
        outcome
    }

    /// Re-issue the failed top-level load.
    pub async fn retry(&self) -> LoadOutcome {
        self.load_countries().await
    }

    /// Select `country` and load its cities.
    ///
    /// City, collection, active record and search are cleared before the
    /// request is issued. A failed city load leaves an empty city list and no
    /// user-visible error.
    pub async fn select_country(&self, country: Country) -> LoadOutcome {
        let code = country.code.clone();
        info!("Selecting country {} ({})", country.name, code);

        let mut ticket = 0;
        self.update(|s| {
            s.selected_country = Some(country);
            s.cities = Arc::default();
            s.reset_city_level();
            s.context.country += 1;
            ticket = s.context.country;
            s.pending_loads += 1;
            s.last_error = None;
        });

        let result = self.catalog.fetch_cities(&code).await;
        let failed = result.is_err();
        let cities = match result {
            Ok(response) => map_cities(&code, response),
            Err(e) => {
                warn!("Failed to load cities of {}: {}", code, e);
                Vec::new()
            }
        };
        let count = cities.len();

        if !self.settle(|ctx| ctx.country == ticket, |s| s.cities = Arc::new(cities)) {
            debug!("Discarding stale city list of {}", code);
            return LoadOutcome::Discarded;
        }

        if failed {
            LoadOutcome::Failed
        } else {
            debug!("Loaded {} cities of {}", count, code);
            LoadOutcome::Applied
        }
    }

    /// Select `city` of the selected country and load all of its postal codes.
    ///
    /// The previous collection stays published until the new one arrives. On
    /// failure the collection becomes empty and the error message is recorded.
    pub async fn select_city(&self, city: City) -> Result<LoadOutcome, SelectionError> {
        let mut checked = Err(SelectionError::NoCountrySelected);
        let mut ticket = 0;

        self.state.send_if_modified(|s| {
            checked = match &s.selected_country {
                None => Err(SelectionError::NoCountrySelected),
                Some(country) if !city.belongs_to(country) => Err(SelectionError::CountryMismatch {
                    city: city.name.clone(),
                    city_country: city.country_code.clone(),
                    selected: country.code.clone(),
                }),
                Some(country) => Ok(country.code.clone()),
            };
            if checked.is_err() {
                return false;
            }

            s.selected_city = Some(city.clone());
            s.active_record = None;
            s.search_query.clear();
            s.context.city += 1;
            ticket = s.context.city;
            s.pending_loads += 1;
            s.last_error = None;
            s.revision += 1;
            true
        });
        let country_code = checked?;

        info!("Selecting city {}, {}", city.name, country_code);
        let result = PaginationAggregator::new(&self.catalog)
            .with_page_size(self.page_size)
            .fetch_all(&country_code, &city.name)
            .await;

        if let Err(e) = &result {
            error!("Failed to load postal codes of {}: {}", city.name, e);
        }
        let failed = result.is_err();

        let current = self.settle(
            |ctx| ctx.city == ticket,
            |s| match result {
                Ok(records) => s.replace_postal_codes(records),
                Err(e) => {
                    s.replace_postal_codes(Vec::new());
                    s.last_error = Some(e.user_message());
                }
            },
        );

        Ok(match (current, failed) {
            (false, _) => {
                debug!("Discarding stale postal codes of {}", city.name);
                LoadOutcome::Discarded
            }
            (true, true) => LoadOutcome::Failed,
            (true, false) => LoadOutcome::Applied,
        })
    }

    /// Set or clear the active record. Membership in the collection is not checked.
    pub fn set_active_record(&self, record: Option<PostalCode>) {
        if let Some(r) = &record {
            debug!("Active record: {} - {}", r.postal_code, r.place_name);
        }
        self.update(|s| s.active_record = record);
    }

    pub fn update_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(|s| s.search_query = query);
    }

    pub fn clear_search(&self) {
        self.update(|s| s.search_query.clear());
    }

    /// Back to the city list of the selected country.
    pub fn clear_city_selection(&self) {
        self.update(|s| s.reset_city_level());
    }

    /// Back to the country list.
    pub fn clear_selection(&self) {
        self.update(|s| {
            s.selected_country = None;
            s.cities = Arc::default();
            s.context.country += 1;
            s.reset_city_level();
        });
    }

    fn update(&self, f: impl FnOnce(&mut SelectionState)) {
        self.state.send_modify(|s| {
            f(s);
            s.revision += 1;
        });
    }

    /// Finish a pending load, applying `apply` only if `is_current` still holds.
    fn settle(
        &self,
        is_current: impl FnOnce(&SelectionContext) -> bool,
        apply: impl FnOnce(&mut SelectionState),
    ) -> bool {
        let mut current = false;
        self.update(|s| {
            s.pending_loads = s.pending_loads.saturating_sub(1);
            current = is_current(&s.context);
            if current {
                apply(s);
            }
        });
        current
    }
}
