//! Bounding rectangles and centroids of postal-code sets.

use geo::{BoundingRect, Centroid, MultiPoint, Point, Rect};

use crate::models::{GeoPoint, PostalCode};

/// How a set of markers is framed by the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    /// Pixels kept free on each side, `(x, y)`
    pub padding: (u32, u32),
    /// Zoom ceiling, so a single marker or a tight cluster does not over-zoom
    pub max_zoom: u8,
}

fn points(records: &[PostalCode]) -> MultiPoint<f64> {
    MultiPoint::new(
        records
            .iter()
            .map(|r| Point::from(r.position()))
            .collect(),
    )
}

/// Smallest lon/lat rectangle holding every record, `None` for an empty set.
pub fn bounds_of(records: &[PostalCode]) -> Option<Rect<f64>> {
    points(records).bounding_rect()
}

/// Arithmetic mean of the record positions, `None` for an empty set.
pub fn centroid_of(records: &[PostalCode]) -> Option<GeoPoint> {
    points(records).centroid().map(GeoPoint::from)
}
