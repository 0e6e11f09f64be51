//! Translation of raw catalog payloads into domain entities.

use tracing::debug;

use super::payload::{FacetsResponse, GroupedCitiesResponse, PostalCodeRecord};
use crate::models::{country_name, City, Country, PostalCode};

/// Facet group holding per-country record counts
const COUNTRY_FACET: &str = "country_code";

/// Map the `country_code` facet group into countries, in catalog order.
pub fn map_countries(response: FacetsResponse) -> Vec<Country> {
    let Some(group) = response
        .facets
        .into_iter()
        .find(|group| group.name == COUNTRY_FACET)
    else {
        return Vec::new();
    };

    group
        .facets
        .into_iter()
        .filter_map(|facet| {
            let code = facet.name.trim().to_ascii_uppercase();
            if code.is_empty() {
                return None;
            }
            Some(Country {
                name: country_name(&code),
                code,
                count: facet.count,
            })
        })
        .collect()
}

/// Map grouped place names into the cities of `country_code`.
pub fn map_cities(country_code: &str, response: GroupedCitiesResponse) -> Vec<City> {
    response
        .results
        .into_iter()
        .filter_map(|row| {
            let name = row.place_name?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(City {
                name,
                postal_count: row.postal_count,
                country_code: country_code.to_string(),
            })
        })
        .collect()
}

/// Map one record, `None` when it has no postal code or no usable position.
pub fn map_postal_code(record: PostalCodeRecord) -> Option<PostalCode> {
    let postal_code = record.postal_code?.trim().to_string();
    if postal_code.is_empty() {
        return None;
    }

    let (latitude, longitude) = match (record.latitude, record.longitude, record.coordinates) {
        (Some(lat), Some(lon), _) => (lat, lon),
        (_, _, Some(c)) => (c.lat, c.lon),
        _ => return None,
    };
    if !is_valid_position(latitude, longitude) {
        return None;
    }

    Some(PostalCode {
        postal_code,
        place_name: record.place_name.unwrap_or_default(),
        country_code: record.country_code.unwrap_or_default(),
        latitude,
        longitude,
        region: record.admin_name1.unwrap_or_default(),
        region_code: record.admin_code1.unwrap_or_default(),
        department: record.admin_name2.unwrap_or_default(),
        department_code: record.admin_code2.unwrap_or_default(),
        sub_region: record.admin_name3.unwrap_or_default(),
        sub_region_code: record.admin_code3.unwrap_or_default(),
        accuracy: record.accuracy.unwrap_or(1).max(1),
    })
}

/// Map a page of records, keeping catalog order.
pub fn map_postal_codes(records: Vec<PostalCodeRecord>) -> Vec<PostalCode> {
    let total = records.len();
    let mapped: Vec<PostalCode> = records.into_iter().filter_map(map_postal_code).collect();

    if mapped.len() < total {
        debug!(
            "Dropped {} of {} postal-code records without a usable position",
            total - mapped.len(),
            total
        );
    }

    mapped
}

fn is_valid_position(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}
