//! Canvas without a screen, used by the CLI and the tests.
//!
//! It keeps markers and the viewport in memory and records every drawing call.

use std::collections::BTreeMap;
use std::time::Duration;

use geo_types::Rect;

use super::{CanvasError, FitOptions, MapCanvas, MarkerIcon, MarkerId};
use crate::models::GeoPoint;

/// Web-mercator tile edge in pixels
const TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub position: GeoPoint,
    pub title: String,
    pub icon: MarkerIcon,
}

/// A drawing call received by [`HeadlessCanvas`]
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    AddMarker(MarkerId),
    ClearMarkers,
    SetIcon(MarkerId, MarkerIcon),
    FitBounds {
        bounds: Rect<f64>,
        options: FitOptions,
    },
    SetView {
        center: GeoPoint,
        zoom: u8,
    },
    FlyTo {
        center: GeoPoint,
        zoom: u8,
        duration: Duration,
    },
    InvalidateSize,
}

#[derive(Debug, Clone)]
pub struct HeadlessCanvas {
    width: u32,
    height: u32,
    min_zoom: u8,
    max_zoom: u8,
    container: Option<String>,
    center: GeoPoint,
    zoom: u8,
    markers: BTreeMap<MarkerId, HeadlessMarker>,
    ops: Vec<CanvasOp>,
}

impl HeadlessCanvas {
    /// Canvas of `width` x `height` pixels showing the whole world.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            min_zoom: 0,
            max_zoom: 18,
            container: None,
            center: GeoPoint::new(0.0, 0.0),
            zoom: 0,
            markers: BTreeMap::new(),
            ops: Vec::new(),
        }
    }

    pub fn with_view(mut self, center: GeoPoint, zoom: u8) -> Self {
        self.center = center;
        self.zoom = zoom;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn markers(&self) -> &BTreeMap<MarkerId, HeadlessMarker> {
        &self.markers
    }

    pub fn selected_markers(&self) -> Vec<MarkerId> {
        self.markers
            .iter()
            .filter(|(_, m)| m.icon == MarkerIcon::Selected)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Forget recorded calls, keeping markers and viewport
    pub fn take_ops(&mut self) -> Vec<CanvasOp> {
        std::mem::take(&mut self.ops)
    }

    /// Zoom at which `bounds` fills the usable viewport
    fn zoom_to_fit(&self, bounds: &Rect<f64>, options: &FitOptions) -> u8 {
        let usable_w = self.width.saturating_sub(2 * options.padding.0).max(1) as f64;
        let usable_h = self.height.saturating_sub(2 * options.padding.1).max(1) as f64;

        let fit = |pixels: f64, world: f64, span: f64| {
            if span > 0.0 {
                (pixels * world / (TILE_SIZE * span)).log2()
            } else {
                f64::INFINITY
            }
        };
        let zoom = fit(usable_w, 360.0, bounds.width()).min(fit(usable_h, 180.0, bounds.height()));

        let ceiling = options.max_zoom.min(self.max_zoom).max(self.min_zoom);
        zoom.floor().clamp(self.min_zoom as f64, ceiling as f64) as u8
    }
}

impl MapCanvas for HeadlessCanvas {
    fn open(&mut self, container: &str) -> Result<(), CanvasError> {
        if container.trim().is_empty() {
            return Err(CanvasError::MissingContainer(container.to_string()));
        }
        self.container = Some(container.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.container = None;
        self.markers.clear();
        self.ops.clear();
    }

    fn is_ready(&self) -> bool {
        self.container.is_some()
    }

    fn add_marker(&mut self, id: MarkerId, position: GeoPoint, title: &str, icon: MarkerIcon) {
        self.markers.insert(
            id,
            HeadlessMarker {
                position,
                title: title.to_string(),
                icon,
            },
        );
        self.ops.push(CanvasOp::AddMarker(id));
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
        self.ops.push(CanvasOp::ClearMarkers);
    }

    fn set_marker_icon(&mut self, id: MarkerId, icon: MarkerIcon) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.icon = icon;
            self.ops.push(CanvasOp::SetIcon(id, icon));
        }
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>, options: FitOptions) {
        let mid = bounds.center();
        self.center = GeoPoint::new(mid.y, mid.x);
        self.zoom = self.zoom_to_fit(&bounds, &options);
        self.ops.push(CanvasOp::FitBounds { bounds, options });
    }

    fn set_view(&mut self, center: GeoPoint, zoom: u8) {
        self.center = center;
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.ops.push(CanvasOp::SetView {
            center,
            zoom: self.zoom,
        });
    }

    fn fly_to(&mut self, center: GeoPoint, zoom: u8, duration: Duration) {
        self.center = center;
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.ops.push(CanvasOp::FlyTo {
            center,
            zoom: self.zoom,
            duration,
        });
    }

    fn center(&self) -> Option<GeoPoint> {
        self.is_ready().then_some(self.center)
    }

    fn invalidate_size(&mut self) {
        self.ops.push(CanvasOp::InvalidateSize);
    }
}
