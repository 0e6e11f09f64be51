//! Keeps the markers on a [`MapCanvas`] in step with the selection store.
//!
//! Markers are rebuilt only when a new postal-code collection is published.
//! A change of active record only swaps marker icons.

use tokio::sync::watch;
use tracing::debug;

use super::{bounds_of, MapCanvas, MarkerIcon, MarkerId};
use crate::catalog::Catalog;
use crate::config::MapSettings;
use crate::models::{GeoPoint, PostalCode};
use crate::store::{SelectionState, SelectionStore};

/// Degrees under which the viewport is considered already centered on a target
pub const RECENTER_EPSILON: f64 = 1e-4;

/// What a [`MarkerSynchronizer::sync`] call did to the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// The canvas was not ready, nothing was drawn
    pub skipped: bool,
    /// All markers were removed and recreated
    pub rebuilt: bool,
    pub viewport_fitted: bool,
    pub icon_updates: usize,
}

#[derive(Debug, Clone)]
struct PlacedMarker {
    record: PostalCode,
    icon: MarkerIcon,
}

pub struct MarkerSynchronizer<M> {
    canvas: M,
    settings: MapSettings,
    layer: Vec<PlacedMarker>,
    /// Collection version the markers were built from
    rendered_version: Option<u64>,
}

fn icon_for(state: &SelectionState, record: &PostalCode) -> MarkerIcon {
    if state.is_active(record) {
        MarkerIcon::Selected
    } else {
        MarkerIcon::Normal
    }
}

/// Shift `value` by [`RECENTER_EPSILON`], staying within `[-limit, limit]`
fn nudge(value: f64, limit: f64) -> f64 {
    if value + RECENTER_EPSILON > limit {
        value - RECENTER_EPSILON
    } else {
        value + RECENTER_EPSILON
    }
}

impl<M: MapCanvas> MarkerSynchronizer<M> {
    pub fn new(canvas: M, settings: MapSettings) -> Self {
        Self {
            canvas,
            settings,
            layer: Vec::new(),
            rendered_version: None,
        }
    }

    pub fn canvas(&self) -> &M {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut M {
        &mut self.canvas
    }

    pub fn marker_count(&self) -> usize {
        self.layer.len()
    }

    /// Records currently shown, in marker id order
    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &PostalCode)> {
        self.layer
            .iter()
            .enumerate()
            .map(|(i, placed)| (MarkerId(i), &placed.record))
    }

    /// Bring the canvas up to date with `state`.
    pub fn sync(&mut self, state: &SelectionState) -> SyncReport {
        if !self.canvas.is_ready() {
            return SyncReport {
                skipped: true,
                ..Default::default()
            };
        }

        if self.rendered_version != Some(state.collection_version) {
            return self.rebuild(state);
        }

        let mut report = SyncReport::default();
        for (i, placed) in self.layer.iter_mut().enumerate() {
            let icon = icon_for(state, &placed.record);
            if placed.icon != icon {
                self.canvas.set_marker_icon(MarkerId(i), icon);
                placed.icon = icon;
                report.icon_updates += 1;
            }
        }
        report
    }

    fn rebuild(&mut self, state: &SelectionState) -> SyncReport {
        self.canvas.clear_markers();
        self.layer.clear();

        for (i, record) in state.postal_codes.iter().enumerate() {
            let icon = icon_for(state, record);
            self.canvas
                .add_marker(MarkerId(i), record.position(), &record.title(), icon);
            self.layer.push(PlacedMarker {
                record: record.clone(),
                icon,
            });
        }
        self.rendered_version = Some(state.collection_version);

        let mut report = SyncReport {
            rebuilt: true,
            ..Default::default()
        };
        if let Some(bounds) = bounds_of(&state.postal_codes) {
            self.canvas.fit_bounds(bounds, self.settings.fit_options());
            report.viewport_fitted = true;
        }
        debug!("Placed {} markers", self.layer.len());
        report
    }

    /// Make the clicked marker's record active and fly to it.
    pub fn marker_clicked<C: Catalog>(
        &mut self,
        id: MarkerId,
        store: &SelectionStore<C>,
    ) -> Option<PostalCode> {
        if !self.canvas.is_ready() {
            return None;
        }
        let record = self.layer.get(id.0)?.record.clone();
        store.set_active_record(Some(record.clone()));
        self.focus(&record);
        Some(record)
    }

    /// Fly to `record` at the marker zoom.
    ///
    /// When the viewport is already centered on it, the move goes through a
    /// small offset so the animation is still visible.
    pub fn focus(&mut self, record: &PostalCode) -> bool {
        if !self.canvas.is_ready() {
            return false;
        }

        let target = record.position();
        let zoom = self.settings.marker_zoom;
        let duration = self.settings.animation();

        let centered = self
            .canvas
            .center()
            .is_some_and(|center| center.is_near(&target, RECENTER_EPSILON));
        if centered {
            let detour = GeoPoint::new(nudge(target.lat, 90.0), nudge(target.lon, 180.0));
            self.canvas.fly_to(detour, zoom, duration / 2);
            self.canvas.fly_to(target, zoom, duration / 2);
        } else {
            self.canvas.fly_to(target, zoom, duration);
        }
        true
    }

    /// Remove all markers and go back to the default view.
    pub fn reset_to_initial_view(&mut self) {
        self.layer.clear();
        self.rendered_version = None;
        if !self.canvas.is_ready() {
            return;
        }
        self.canvas.clear_markers();
        self.canvas
            .set_view(self.settings.initial_center(), self.settings.initial_zoom);
    }

    pub fn handle_resize(&mut self) {
        if self.canvas.is_ready() {
            self.canvas.invalidate_size();
        }
    }

    /// Sync on every published snapshot until the store goes away.
    pub async fn follow(&mut self, mut updates: watch::Receiver<SelectionState>) {
        loop {
            let state = updates.borrow_and_update().clone();
            self.sync(&state);
            if updates.changed().await.is_err() {
                debug!("Selection store closed, marker sync stopped");
                break;
            }
        }
    }
}
