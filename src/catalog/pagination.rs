//! Multi-page retrieval of the postal codes of one city.

use futures::future::try_join_all;
use tracing::{debug, info};

use super::error::{CatalogError, Query};
use super::mapper::map_postal_codes;
use super::Catalog;
use crate::models::PostalCode;

/// Records per page requested from the catalog
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Collects every postal code of a (country, city) pair.
///
/// Page 0 is fetched first to learn the total; the remaining pages are then
/// requested concurrently and merged in page order. Any failed page fails
/// the whole aggregation, so callers never see a truncated collection.
pub struct PaginationAggregator<'a, C> {
    catalog: &'a C,
    page_size: usize,
}

impl<'a, C: Catalog> PaginationAggregator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn fetch_all(
        &self,
        country_code: &str,
        city: &str,
    ) -> Result<Vec<PostalCode>, CatalogError> {
        let country_code = country_code.trim();
        let city = city.trim();
        if country_code.is_empty() || city.is_empty() {
            return Err(CatalogError::InvalidQuery {
                query: Query::PostalCodePage {
                    country_code: country_code.to_string(),
                    city: city.to_string(),
                    page: 0,
                },
                reason: "country code and city name must not be empty",
            });
        }

        let first = self
            .catalog
            .fetch_postal_code_page(country_code, city, 0, self.page_size)
            .await?;

        let total = first.total_count as usize;
        if total == 0 {
            debug!("No postal codes for {}, {}", city, country_code);
            return Ok(Vec::new());
        }

        let mut records = map_postal_codes(first.results);
        if total <= self.page_size {
            return Ok(records);
        }

        let total_pages = total.div_ceil(self.page_size);
        info!(
            "Fetching {} postal codes of {}, {} in {} pages",
            total, city, country_code, total_pages
        );

        let remaining = (1..total_pages).map(|page| async move {
            self.catalog
                .fetch_postal_code_page(country_code, city, page, self.page_size)
                .await
                .map_err(|source| CatalogError::Aggregation {
                    country_code: country_code.to_string(),
                    city: city.to_string(),
                    page,
                    total_pages,
                    source: Box::new(source),
                })
        });

        // try_join_all yields results in input order, not completion order
        let pages = try_join_all(remaining).await?;

        records.reserve(total.saturating_sub(records.len()));
        for page in pages {
            records.extend(map_postal_codes(page.results));
        }

        debug!("Aggregated {} postal codes of {}", records.len(), city);
        Ok(records)
    }
}
