//! In-memory map surface that records the state a real widget would show.
//!
//! Used by tests and by the CLI console view.

use super::surface::{Bounds, MapSurface, MarkerHandle, MarkerSpec, MarkerStyle, PolylineHandle};
use crate::model::address::Coordinates;
use std::collections::BTreeMap;

/// Last viewport instruction applied to the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedView {
    Centered { center: Coordinates, zoom: u8 },
    Fitted { bounds: Bounds, padding_px: u32, max_zoom: u8 },
}

#[derive(Debug, Clone)]
pub struct RecordingMapSurface {
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, MarkerSpec>,
    polylines: BTreeMap<PolylineHandle, Vec<Coordinates>>,
    view: Option<RecordedView>,
    pans: Vec<Coordinates>,
    zoom_changes: usize,
    address_layer_visible: bool,
}

impl Default for RecordingMapSurface {
    fn default() -> Self {
        Self {
            next_handle: 1,
            markers: BTreeMap::new(),
            polylines: BTreeMap::new(),
            view: None,
            pans: Vec::new(),
            zoom_changes: 0,
            address_layer_visible: true,
        }
    }
}

impl RecordingMapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerHandle, &MarkerSpec)> {
        self.markers.iter().map(|(handle, spec)| (*handle, spec))
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&MarkerSpec> {
        self.markers.get(&handle)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Labels of markers currently on the map, in creation order.
    pub fn marker_labels(&self) -> Vec<&str> {
        self.markers.values().map(|spec| spec.label.as_str()).collect()
    }

    pub fn active_markers(&self) -> Vec<MarkerHandle> {
        self.markers
            .iter()
            .filter(|(_, spec)| matches!(spec.style, MarkerStyle::Active(_)))
            .map(|(handle, _)| *handle)
            .collect()
    }

    pub fn polylines(&self) -> Vec<&[Coordinates]> {
        self.polylines.values().map(Vec::as_slice).collect()
    }

    pub fn view(&self) -> Option<&RecordedView> {
        self.view.as_ref()
    }

    pub fn pans(&self) -> &[Coordinates] {
        &self.pans
    }

    /// Number of viewport changes that may alter the zoom level.
    pub fn zoom_changes(&self) -> usize {
        self.zoom_changes
    }

    pub fn address_layer_visible(&self) -> bool {
        self.address_layer_visible
    }

    fn allocate_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl MapSurface for RecordingMapSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Option<MarkerHandle> {
        if !spec.position.is_valid() {
            return None;
        }
        let handle = self.allocate_handle();
        self.markers.insert(handle, spec.clone());
        Some(handle)
    }

    fn set_marker_style(&mut self, handle: MarkerHandle, style: MarkerStyle) {
        if let Some(spec) = self.markers.get_mut(&handle) {
            spec.style = style;
        }
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
    }

    fn draw_polyline(&mut self, path: &[Coordinates]) -> Option<PolylineHandle> {
        if path.len() < 2 {
            return None;
        }
        let handle = self.allocate_handle();
        self.polylines.insert(handle, path.to_vec());
        Some(handle)
    }

    fn remove_polyline(&mut self, handle: PolylineHandle) {
        self.polylines.remove(&handle);
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32, max_zoom: u8) {
        self.zoom_changes += 1;
        self.view = Some(RecordedView::Fitted {
            bounds,
            padding_px,
            max_zoom,
        });
    }

    fn set_view(&mut self, center: Coordinates, zoom: u8) {
        self.zoom_changes += 1;
        self.view = Some(RecordedView::Centered { center, zoom });
    }

    fn pan_to(&mut self, center: Coordinates) {
        self.pans.push(center);
    }

    fn set_address_layer_visible(&mut self, visible: bool) {
        self.address_layer_visible = visible;
    }
}
