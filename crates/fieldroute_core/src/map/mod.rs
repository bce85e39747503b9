//! Map-visible route artifacts.
//!
//! # Responsibility
//! - Define the map surface contract the core renders through.
//! - Own marker/line lifecycle for the displayed route.
//!
//! # Invariants
//! - Only `MarkerManager` creates or removes route markers and the route line.
//! - At most one route marker is in the active style at any time.

pub mod markers;
pub mod recording;
pub mod surface;

pub use markers::{MarkerManager, MarkerRecord};
pub use recording::{RecordedView, RecordingMapSurface};
pub use surface::{Bounds, MapSurface, MarkerHandle, MarkerSpec, MarkerStyle, PolylineHandle};
