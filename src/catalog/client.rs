//! HTTP client for the OpenDataSoft GeoNames postal-code dataset.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::error::{CatalogError, Query};
use super::payload::{FacetsResponse, GroupedCitiesResponse, RecordsPage};
use super::Catalog;
use crate::config::CatalogSettings;

/// Longest response body excerpt kept in a status error
const MAX_ERROR_BODY: usize = 200;

/// Catalog client with per-request timeouts and fixed-delay retries.
///
/// Besides the HTTP client it only tracks how many requests are in flight
/// and the message of the last terminal failure.
pub struct CatalogClient {
    client: Client,
    base_url: Url,
    settings: CatalogSettings,
    in_flight: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

impl CatalogClient {
    pub fn new(settings: CatalogSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).context("Invalid catalog base URL")?;
        if base_url.cannot_be_a_base() {
            bail!("Catalog base URL {} cannot carry a path", base_url);
        }

        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if !settings.use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            settings,
            in_flight: AtomicUsize::new(0),
            last_error: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Whether any request is currently in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// User-facing message of the last request that failed after all retries
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    pub(crate) fn facets_url(&self) -> Url {
        let mut url = self.endpoint("facets");
        url.query_pairs_mut().append_pair("facet", "country_code");
        url
    }

    pub(crate) fn cities_url(&self, country_code: &str) -> Url {
        let mut url = self.endpoint("records");
        url.query_pairs_mut()
            .append_pair("select", "place_name, count(*) as postal_count")
            .append_pair("group_by", "place_name")
            .append_pair("order_by", "postal_count desc")
            .append_pair("limit", &self.settings.city_row_limit.to_string())
            .append_pair("refine", &refinement("country_code", country_code));
        url
    }

    pub(crate) fn page_url(
        &self,
        country_code: &str,
        city: &str,
        page: usize,
        page_size: usize,
    ) -> Url {
        let mut url = self.endpoint("records");
        url.query_pairs_mut()
            .append_pair("refine", &refinement("country_code", country_code))
            .append_pair("refine", &refinement("place_name", city))
            .append_pair("limit", &page_size.to_string())
            .append_pair("offset", &(page * page_size).to_string());
        url
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        timeout: Duration,
        query: Query,
    ) -> Result<T, CatalogError> {
        let _in_flight = InFlight::enter(&self.in_flight);
        self.set_last_error(None);

        let max_attempts = self.settings.max_retries + 1;
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.attempt(&url, timeout, &query).await {
                Ok(body) => {
                    debug!("Fetched {} in {} attempt(s)", query, attempts);
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempts < max_attempts => {
                    warn!(
                        "Catalog request failed (attempt {}/{}): {}",
                        attempts, max_attempts, e
                    );
                    tokio::time::sleep(self.settings.retry_delay()).await;
                }
                Err(e) => {
                    error!("Catalog request failed after {} attempt(s): {}", attempts, e);
                    self.set_last_error(Some(e.user_message()));
                    return Err(e);
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &Url,
        timeout: Duration,
        query: &Query,
    ) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(query, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                body.trim().chars().take(MAX_ERROR_BODY).collect()
            };
            return Err(CatalogError::Status {
                query: query.clone(),
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                CatalogError::Payload {
                    query: query.clone(),
                    message: e.to_string(),
                }
            } else {
                transport_error(query, e)
            }
        })
    }

    fn set_last_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }
}

impl Catalog for CatalogClient {
    async fn fetch_country_facets(&self) -> Result<FacetsResponse, CatalogError> {
        self.get_json(
            self.facets_url(),
            self.settings.facets_timeout(),
            Query::CountryFacets,
        )
        .await
    }

    async fn fetch_cities(&self, country_code: &str) -> Result<GroupedCitiesResponse, CatalogError> {
        self.get_json(
            self.cities_url(country_code),
            self.settings.records_timeout(),
            Query::Cities {
                country_code: country_code.to_string(),
            },
        )
        .await
    }

    async fn fetch_postal_code_page(
        &self,
        country_code: &str,
        city: &str,
        page: usize,
        page_size: usize,
    ) -> Result<RecordsPage, CatalogError> {
        self.get_json(
            self.page_url(country_code, city, page, page_size),
            self.settings.records_timeout(),
            Query::PostalCodePage {
                country_code: country_code.to_string(),
                city: city.to_string(),
                page,
            },
        )
        .await
    }
}

/// `field:"value"` refinement with embedded quotes escaped
fn refinement(field: &str, value: &str) -> String {
    format!("{}:\"{}\"", field, value.replace('"', "\\\""))
}

fn transport_error(query: &Query, e: reqwest::Error) -> CatalogError {
    CatalogError::Network {
        query: query.clone(),
        message: e.to_string(),
        timed_out: e.is_timeout(),
    }
}

/// Counts a request as in flight until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
