//! Spatial marker layer: canvas boundary, viewport geometry and the
//! synchronizer that keeps markers in step with the selection store.

mod canvas;
mod headless;
mod synchronizer;
mod viewport;

pub use canvas::{CanvasError, MapCanvas, MarkerIcon, MarkerId};
pub use headless::{CanvasOp, HeadlessCanvas, HeadlessMarker};
pub use synchronizer::{MarkerSynchronizer, SyncReport, RECENTER_EPSILON};
pub use viewport::{bounds_of, centroid_of, FitOptions};
