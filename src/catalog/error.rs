//! Catalog failure taxonomy.

use std::fmt;

use thiserror::Error;

/// The catalog read that failed, carried by every [`CatalogError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    CountryFacets,
    Cities {
        country_code: String,
    },
    PostalCodePage {
        country_code: String,
        city: String,
        page: usize,
    },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::CountryFacets => write!(f, "country facets"),
            Query::Cities { country_code } => write!(f, "cities of {}", country_code),
            Query::PostalCodePage {
                country_code,
                city,
                page,
            } => write!(f, "postal codes of {}, {} (page {})", city, country_code, page),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// No connectivity, connection reset or request timeout
    #[error("network error fetching {query}: {message}")]
    Network {
        query: Query,
        message: String,
        timed_out: bool,
    },

    /// Non-2xx response
    #[error("catalog answered HTTP {status} fetching {query}: {message}")]
    Status {
        query: Query,
        status: u16,
        message: String,
    },

    /// Body could not be decoded into the expected payload
    #[error("unreadable catalog response for {query}: {message}")]
    Payload { query: Query, message: String },

    #[error("invalid catalog query for {query}: {reason}")]
    InvalidQuery { query: Query, reason: &'static str },

    /// A page of a multi-page postal-code fetch failed
    #[error("failed to aggregate postal codes of {city}, {country_code}: page {page} of {total_pages} failed")]
    Aggregation {
        country_code: String,
        city: String,
        page: usize,
        total_pages: usize,
        #[source]
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// The query that ultimately failed.
    pub fn query(&self) -> &Query {
        match self {
            CatalogError::Network { query, .. }
            | CatalogError::Status { query, .. }
            | CatalogError::Payload { query, .. }
            | CatalogError::InvalidQuery { query, .. } => query,
            CatalogError::Aggregation { source, .. } => source.query(),
        }
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CatalogError::Status { status, .. } => Some(*status),
            CatalogError::Aggregation { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// Transport and HTTP failures are retried, malformed input or payloads are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::Network { .. } | CatalogError::Status { .. }
        )
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Network { .. } => {
                "Network error. Please check your connection.".to_string()
            }
            CatalogError::Status {
                status, message, ..
            } => {
                if message.is_empty() {
                    format!("The catalog request failed with status {}", status)
                } else {
                    format!("The catalog request failed with status {}: {}", status, message)
                }
            }
            CatalogError::Aggregation { source, .. } => source.user_message(),
            other => other.to_string(),
        }
    }
}
