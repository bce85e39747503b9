//! Rendering-agnostic map surface contract.

use crate::model::address::Coordinates;

pub type MarkerHandle = u64;
pub type PolylineHandle = u64;

/// Visual style of a route marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Start stop, visually distinct from numbered stops.
    Start,
    /// Regular stop labelled with its 1-based order.
    Numbered(usize),
    /// Currently highlighted stop: larger icon, alternate color.
    Active(usize),
}

/// Everything a surface needs to place one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: Coordinates,
    pub label: String,
    pub title: String,
    pub style: MarkerStyle,
}

/// Geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest box containing every point; `None` for an empty slice.
    pub fn from_points(points: &[Coordinates]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for point in rest {
            bounds.south = bounds.south.min(point.lat);
            bounds.north = bounds.north.max(point.lat);
            bounds.west = bounds.west.min(point.lng);
            bounds.east = bounds.east.max(point.lng);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }
}

/// Map widget operations used by the route display.
///
/// Implementations may refuse a marker (returning `None`); callers treat that
/// as "skip this stop", never as an error.
pub trait MapSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Option<MarkerHandle>;
    fn set_marker_style(&mut self, handle: MarkerHandle, style: MarkerStyle);
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn draw_polyline(&mut self, path: &[Coordinates]) -> Option<PolylineHandle>;
    fn remove_polyline(&mut self, handle: PolylineHandle);
    /// Fits the viewport to `bounds` without zooming in past `max_zoom`.
    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32, max_zoom: u8);
    fn set_view(&mut self, center: Coordinates, zoom: u8);
    /// Moves the viewport center, keeping the zoom level.
    fn pan_to(&mut self, center: Coordinates);
    /// Shows or hides the independently managed address markers.
    fn set_address_layer_visible(&mut self, visible: bool);
}
