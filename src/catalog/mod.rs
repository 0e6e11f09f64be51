//! Remote postal-code catalog: client, payloads, mapping and pagination.

mod client;
mod error;
pub mod mapper;
mod pagination;
pub mod payload;

use std::future::Future;
use std::sync::Arc;

pub use client::CatalogClient;
pub use error::{CatalogError, Query};
pub use pagination::{PaginationAggregator, DEFAULT_PAGE_SIZE};
pub use payload::{FacetsResponse, GroupedCitiesResponse, PostalCodeRecord, RecordsPage};

/// Read access to the record catalog.
///
/// Implementations return raw payloads; [`mapper`] turns them into domain
/// entities.
pub trait Catalog: Send + Sync {
    /// Per-country record counts
    fn fetch_country_facets(
        &self,
    ) -> impl Future<Output = Result<FacetsResponse, CatalogError>> + Send;

    /// Place names of a country with their record counts, largest first
    fn fetch_cities(
        &self,
        country_code: &str,
    ) -> impl Future<Output = Result<GroupedCitiesResponse, CatalogError>> + Send;

    /// One page of the postal codes of `city`; `page` is zero-based
    fn fetch_postal_code_page(
        &self,
        country_code: &str,
        city: &str,
        page: usize,
        page_size: usize,
    ) -> impl Future<Output = Result<RecordsPage, CatalogError>> + Send;
}

impl<T: Catalog> Catalog for Arc<T> {
    fn fetch_country_facets(
        &self,
    ) -> impl Future<Output = Result<FacetsResponse, CatalogError>> + Send {
        (**self).fetch_country_facets()
    }

    fn fetch_cities(
        &self,
        country_code: &str,
    ) -> impl Future<Output = Result<GroupedCitiesResponse, CatalogError>> + Send {
        (**self).fetch_cities(country_code)
    }

    fn fetch_postal_code_page(
        &self,
        country_code: &str,
        city: &str,
        page: usize,
        page_size: usize,
    ) -> impl Future<Output = Result<RecordsPage, CatalogError>> + Send {
        (**self).fetch_postal_code_page(country_code, city, page, page_size)
    }
}
