//! Boundary to the map widget that draws tiles and markers.

use std::time::Duration;

use geo_types::Rect;
use thiserror::Error;

use super::FitOptions;
use crate::models::GeoPoint;

/// Handle of a marker on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    Normal,
    Selected,
}

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("map container '{0}' is not available")]
    MissingContainer(String),
}

/// A map widget the synchronizer can place markers on and move around.
///
/// Animated moves issued back to back are played one after the other.
pub trait MapCanvas {
    /// Create the map inside `container`
    fn open(&mut self, container: &str) -> Result<(), CanvasError>;

    /// Destroy the map and everything on it
    fn close(&mut self);

    /// Whether the map exists and accepts drawing calls
    fn is_ready(&self) -> bool;

    fn add_marker(&mut self, id: MarkerId, position: GeoPoint, title: &str, icon: MarkerIcon);

    fn clear_markers(&mut self);

    fn set_marker_icon(&mut self, id: MarkerId, icon: MarkerIcon);

    /// Frame `bounds` (lon/lat) within the viewport
    fn fit_bounds(&mut self, bounds: Rect<f64>, options: FitOptions);

    /// Jump without animation
    fn set_view(&mut self, center: GeoPoint, zoom: u8);

    /// Animated move
    fn fly_to(&mut self, center: GeoPoint, zoom: u8, duration: Duration);

    fn center(&self) -> Option<GeoPoint>;

    /// Recompute the viewport after the container was resized
    fn invalidate_size(&mut self);
}
