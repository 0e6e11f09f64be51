//! In-memory catalog and fixtures shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::catalog::mapper::map_postal_code;
use crate::catalog::payload::{FacetGroup, FacetValue, GroupedCity};
use crate::catalog::{
    Catalog, CatalogError, FacetsResponse, GroupedCitiesResponse, PostalCodeRecord, Query,
    RecordsPage,
};
use crate::models::{country_name, City, Country, PostalCode};

pub fn record(postal_code: &str, place_name: &str, region: &str, lat: f64, lon: f64) -> PostalCode {
    PostalCode {
        postal_code: postal_code.to_string(),
        place_name: place_name.to_string(),
        country_code: "US".to_string(),
        latitude: lat,
        longitude: lon,
        region: region.to_string(),
        region_code: String::new(),
        department: String::new(),
        department_code: String::new(),
        sub_region: String::new(),
        sub_region_code: String::new(),
        accuracy: 4,
    }
}

pub fn country(code: &str, count: u64) -> Country {
    Country {
        code: code.to_string(),
        name: country_name(code),
        count,
    }
}

pub fn city(country_code: &str, name: &str, postal_count: u64) -> City {
    City {
        name: name.to_string(),
        postal_count,
        country_code: country_code.to_string(),
    }
}

/// A catalog request as seen by [`MockCatalog`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    Facets,
    Cities(String),
    Page(String, usize),
}

impl Call {
    pub fn cities(country_code: &str) -> Self {
        Call::Cities(country_code.to_string())
    }

    pub fn page(city: &str, page: usize) -> Self {
        Call::Page(city.to_string(), page)
    }
}

struct CityRecords {
    country_code: String,
    total: usize,
}

/// Catalog double with failure injection, request gates and a call log.
///
/// Postal codes are generated on demand, so a city with thousands of
/// records costs nothing until it is paged through.
#[derive(Default)]
pub struct MockCatalog {
    countries: Vec<(String, u64)>,
    cities: HashMap<String, Vec<(String, u64)>>,
    records: HashMap<String, CityRecords>,
    reversed_latency: bool,
    failures: Mutex<HashSet<Call>>,
    gates: Mutex<HashMap<Call, Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
    completed: Mutex<Vec<Call>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, code: &str, count: u64) -> Self {
        self.countries.push((code.to_string(), count));
        self
    }

    pub fn with_city(mut self, country_code: &str, city: &str, total: usize) -> Self {
        self.cities
            .entry(country_code.to_string())
            .or_default()
            .push((city.to_string(), total as u64));
        self.records.insert(
            city.to_string(),
            CityRecords {
                country_code: country_code.to_string(),
                total,
            },
        );
        self
    }

    /// Later pages answer sooner than earlier ones
    pub fn with_reversed_latency(mut self) -> Self {
        self.reversed_latency = true;
        self
    }

    pub fn failing(self, call: Call) -> Self {
        self.fail(call);
        self
    }

    pub fn fail(&self, call: Call) {
        self.failures.lock().unwrap().insert(call);
    }

    pub fn recover(&self, call: &Call) {
        self.failures.lock().unwrap().remove(call);
    }

    /// Holds `call` until the returned notify is triggered
    pub fn gate(&self, call: Call) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(call, notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn page_calls(&self, city: &str) -> Vec<usize> {
        pages_of(&self.calls.lock().unwrap(), city)
    }

    pub fn completed_pages(&self, city: &str) -> Vec<usize> {
        pages_of(&self.completed.lock().unwrap(), city)
    }

    pub fn postal_code_at(city: &str, idx: usize) -> String {
        format!("{}-{:05}", city, idx)
    }

    pub fn raw_record(country_code: &str, city: &str, idx: usize) -> PostalCodeRecord {
        PostalCodeRecord {
            country_code: Some(country_code.to_string()),
            postal_code: Some(Self::postal_code_at(city, idx)),
            place_name: Some(city.to_string()),
            admin_name1: Some(format!("Region {}", idx % 3)),
            admin_code1: Some(format!("R{}", idx % 3)),
            latitude: Some(40.0 + (idx % 100) as f64 * 0.01),
            longitude: Some(-3.0 + (idx / 100) as f64 * 0.01),
            accuracy: Some(4),
            ..Default::default()
        }
    }

    /// The domain record the aggregator produces for `idx`
    pub fn mapped_record(country_code: &str, city: &str, idx: usize) -> PostalCode {
        map_postal_code(Self::raw_record(country_code, city, idx)).unwrap()
    }

    async fn enter(&self, call: &Call, query: Query) -> Result<(), CatalogError> {
        self.calls.lock().unwrap().push(call.clone());

        let gate = self.gates.lock().unwrap().get(call).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failing = self.failures.lock().unwrap().contains(call);
        if failing {
            return Err(CatalogError::Status {
                query,
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn leave(&self, call: Call) {
        self.completed.lock().unwrap().push(call);
    }
}

fn pages_of(calls: &[Call], city: &str) -> Vec<usize> {
    calls
        .iter()
        .filter_map(|call| match call {
            Call::Page(c, page) if c == city => Some(*page),
            _ => None,
        })
        .collect()
}

impl Catalog for MockCatalog {
    async fn fetch_country_facets(&self) -> Result<FacetsResponse, CatalogError> {
        self.enter(&Call::Facets, Query::CountryFacets).await?;
        self.leave(Call::Facets);

        Ok(FacetsResponse {
            facets: vec![FacetGroup {
                name: "country_code".to_string(),
                facets: self
                    .countries
                    .iter()
                    .map(|(code, count)| FacetValue {
                        name: code.clone(),
                        count: *count,
                        state: "displayed".to_string(),
                        value: code.clone(),
                    })
                    .collect(),
            }],
        })
    }

    async fn fetch_cities(&self, country_code: &str) -> Result<GroupedCitiesResponse, CatalogError> {
        let call = Call::cities(country_code);
        self.enter(
            &call,
            Query::Cities {
                country_code: country_code.to_string(),
            },
        )
        .await?;
        self.leave(call);

        let mut results: Vec<GroupedCity> = self
            .cities
            .get(country_code)
            .map(|cities| {
                cities
                    .iter()
                    .map(|(name, count)| GroupedCity {
                        place_name: Some(name.clone()),
                        postal_count: *count,
                    })
                    .collect()
            })
            .unwrap_or_default();
        results.sort_by(|a, b| b.postal_count.cmp(&a.postal_count));

        Ok(GroupedCitiesResponse {
            total_count: Some(results.len() as u64),
            results,
        })
    }

    async fn fetch_postal_code_page(
        &self,
        country_code: &str,
        city: &str,
        page: usize,
        page_size: usize,
    ) -> Result<RecordsPage, CatalogError> {
        let call = Call::page(city, page);
        self.enter(
            &call,
            Query::PostalCodePage {
                country_code: country_code.to_string(),
                city: city.to_string(),
                page,
            },
        )
        .await?;

        let total = self
            .records
            .get(city)
            .filter(|r| r.country_code == country_code)
            .map(|r| r.total)
            .unwrap_or(0);

        if self.reversed_latency {
            let total_pages = total.div_ceil(page_size.max(1));
            for _ in 0..total_pages.saturating_sub(page) {
                tokio::task::yield_now().await;
            }
        }

        let start = (page * page_size).min(total);
        let end = ((page + 1) * page_size).min(total);
        let results = (start..end)
            .map(|idx| Self::raw_record(country_code, city, idx))
            .collect();

        self.leave(call);
        Ok(RecordsPage {
            total_count: total as u64,
            results,
        })
    }
}
