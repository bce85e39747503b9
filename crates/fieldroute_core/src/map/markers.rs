//! Route marker and route line lifecycle.
//!
//! # Responsibility
//! - Render one numbered marker per drawable stop plus the connecting line.
//! - Track the single "active" marker used by navigation.
//! - Hide the underlying address markers while a route is shown and restore
//!   them when the route display is cleared.
//!
//! # Invariants
//! - `display_route` leaves exactly the new route's artifacts on the surface.
//! - At most one record is active; activating another reverts the previous one.
//! - Stops without usable coordinates are skipped, never fatal.

use super::surface::{Bounds, MapSurface, MarkerHandle, MarkerSpec, MarkerStyle, PolylineHandle};
use crate::config::MapViewConfig;
use crate::model::address::{Coordinates, GeocodedStop};
use crate::model::route::{Route, RouteId};
use log::{debug, info};

/// Map artifact bound to one route position.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub handle: MarkerHandle,
    /// Zero-based position in the route.
    pub route_index: usize,
    /// One-based display number.
    pub order: usize,
    pub is_start: bool,
    pub stop: GeocodedStop,
}

impl MarkerRecord {
    fn normal_style(&self) -> MarkerStyle {
        if self.is_start {
            MarkerStyle::Start
        } else {
            MarkerStyle::Numbered(self.order)
        }
    }

    fn position(&self) -> Option<Coordinates> {
        self.stop.valid_coordinates()
    }
}

/// Owner of every map-visible artifact of the displayed route.
pub struct MarkerManager<S: MapSurface> {
    surface: S,
    view: MapViewConfig,
    records: Vec<MarkerRecord>,
    route_line: Option<PolylineHandle>,
    active: Option<usize>,
    displayed_route: Option<RouteId>,
    address_layer_hidden: bool,
}

impl<S: MapSurface> MarkerManager<S> {
    pub fn new(surface: S, view: MapViewConfig) -> Self {
        Self {
            surface,
            view,
            records: Vec::new(),
            route_line: None,
            active: None,
            displayed_route: None,
            address_layer_hidden: false,
        }
    }

    /// Replaces whatever is displayed with `route`'s markers and line.
    pub fn display_route(&mut self, route: &Route) {
        self.remove_route_artifacts();

        if !self.address_layer_hidden {
            self.surface.set_address_layer_visible(false);
            self.address_layer_hidden = true;
        }

        for (route_index, stop) in route.stops().iter().enumerate() {
            self.add_stop_marker(route_index, stop);
        }

        let path: Vec<Coordinates> = route
            .stops()
            .iter()
            .filter_map(GeocodedStop::valid_coordinates)
            .collect();
        if path.len() >= 2 {
            self.route_line = self.surface.draw_polyline(&path);
        }

        self.displayed_route = Some(route.id());
        self.fit_view_to_route();

        info!(
            "event=route_display module=markers status=ok route_id={} stops={} markers={} line_points={}",
            route.id(),
            route.len(),
            self.records.len(),
            if self.route_line.is_some() { path.len() } else { 0 }
        );
    }

    fn add_stop_marker(&mut self, route_index: usize, stop: &GeocodedStop) {
        let Some(position) = stop.valid_coordinates() else {
            debug!(
                "event=marker_add module=markers status=skip route_index={route_index} reason=no_coordinates"
            );
            return;
        };

        let order = route_index + 1;
        let is_start = stop.is_start();
        let style = if is_start {
            MarkerStyle::Start
        } else {
            MarkerStyle::Numbered(order)
        };
        let spec = MarkerSpec {
            position,
            label: order.to_string(),
            title: stop.candidate.label().to_string(),
            style,
        };

        match self.surface.add_marker(&spec) {
            Some(handle) => self.records.push(MarkerRecord {
                handle,
                route_index,
                order,
                is_start,
                stop: stop.clone(),
            }),
            None => debug!(
                "event=marker_add module=markers status=skip route_index={route_index} reason=surface_rejected"
            ),
        }
    }

    /// Removes the route's markers and line and restores the address markers.
    pub fn clear_route_display(&mut self) {
        let removed = self.records.len();
        self.remove_route_artifacts();

        if self.address_layer_hidden {
            self.surface.set_address_layer_visible(true);
            self.address_layer_hidden = false;
        }

        info!("event=route_display_clear module=markers status=ok markers_removed={removed}");
    }

    fn remove_route_artifacts(&mut self) {
        for record in self.records.drain(..) {
            self.surface.remove_marker(record.handle);
        }
        if let Some(line) = self.route_line.take() {
            self.surface.remove_polyline(line);
        }
        self.active = None;
        self.displayed_route = None;
    }

    /// Highlights the marker at route position `index`.
    ///
    /// The previously active marker reverts to its normal style first. A
    /// position without a marker (skipped stop, out of range) leaves nothing active.
    pub fn set_active_marker(&mut self, index: usize) {
        self.clear_active_marker();

        let Some(slot) = self.record_slot(index) else {
            debug!("event=marker_activate module=markers status=skip route_index={index}");
            return;
        };
        let record = &self.records[slot];
        self.surface
            .set_marker_style(record.handle, MarkerStyle::Active(record.order));
        self.active = Some(slot);
    }

    /// Reverts the active marker, if any, to its normal style.
    pub fn clear_active_marker(&mut self) {
        if let Some(slot) = self.active.take() {
            if let Some(record) = self.records.get(slot) {
                self.surface
                    .set_marker_style(record.handle, record.normal_style());
            }
        }
    }

    /// Adjusts the viewport to contain every route marker.
    pub fn fit_view_to_route(&mut self) {
        let points: Vec<Coordinates> = self
            .records
            .iter()
            .filter_map(MarkerRecord::position)
            .collect();

        match points.as_slice() {
            [] => {}
            [single] => self.surface.set_view(*single, self.view.single_stop_zoom),
            _ => {
                if let Some(bounds) = Bounds::from_points(&points) {
                    self.surface
                        .fit_bounds(bounds, self.view.fit_padding_px, self.view.max_fit_zoom);
                }
            }
        }
    }

    /// Pans (without zooming) to the stop at route position `index`.
    pub fn focus_stop(&mut self, index: usize) {
        let position = self
            .record_slot(index)
            .and_then(|slot| self.records[slot].position());
        if let Some(position) = position {
            self.surface.pan_to(position);
        }
    }

    fn record_slot(&self, route_index: usize) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.route_index == route_index)
    }

    pub fn records(&self) -> &[MarkerRecord] {
        &self.records
    }

    /// Route position of the active marker.
    pub fn active_index(&self) -> Option<usize> {
        self.active
            .and_then(|slot| self.records.get(slot))
            .map(|record| record.route_index)
    }

    pub fn displayed_route(&self) -> Option<RouteId> {
        self.displayed_route
    }

    pub fn is_displaying(&self) -> bool {
        self.displayed_route.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerManager;
    use crate::config::MapViewConfig;
    use crate::map::recording::{RecordedView, RecordingMapSurface};
    use crate::map::surface::MarkerStyle;
    use crate::model::address::{AddressCandidate, Coordinates, GeocodedStop, SourceKind};
    use crate::model::route::{Route, RouteSignature};

    fn stop(text: &str, coordinates: Option<(f64, f64)>) -> GeocodedStop {
        let mut stop = GeocodedStop::from_candidate(AddressCandidate::new(text, SourceKind::Manual));
        stop.coordinates = coordinates.map(|(lat, lng)| Coordinates::new(lat, lng));
        stop
    }

    fn route(stops: Vec<GeocodedStop>) -> Route {
        let signature = RouteSignature::from_texts(stops.iter().map(|s| s.text()));
        Route::new(stops, signature).unwrap()
    }

    fn manager() -> MarkerManager<RecordingMapSurface> {
        MarkerManager::new(RecordingMapSurface::new(), MapViewConfig::default())
    }

    #[test]
    fn single_stop_centers_at_fixed_zoom() {
        let mut markers = manager();
        markers.display_route(&route(vec![stop("1 Solo Rd", Some((1.0, 2.0)))]));

        assert_eq!(
            markers.surface().view(),
            Some(&RecordedView::Centered {
                center: Coordinates::new(1.0, 2.0),
                zoom: 15
            })
        );
        assert!(markers.surface().polylines().is_empty());
    }

    #[test]
    fn multiple_stops_fit_bounds_with_zoom_ceiling() {
        let mut markers = manager();
        markers.display_route(&route(vec![
            stop("1 A St", Some((1.0, 1.0))),
            stop("2 B St", Some((1.001, 1.001))),
        ]));

        match markers.surface().view() {
            Some(RecordedView::Fitted {
                padding_px,
                max_zoom,
                ..
            }) => {
                assert_eq!(*padding_px, 50);
                assert_eq!(*max_zoom, 16);
            }
            other => panic!("expected fitted view, got {other:?}"),
        }
    }

    #[test]
    fn active_marker_is_exclusive() {
        let mut markers = manager();
        markers.display_route(&route(vec![
            stop("1 A St", Some((1.0, 1.0))),
            stop("2 B St", Some((2.0, 2.0))),
            stop("3 C St", Some((3.0, 3.0))),
        ]));

        markers.set_active_marker(0);
        markers.set_active_marker(2);

        let active = markers.surface().active_markers();
        assert_eq!(active.len(), 1);
        assert_eq!(markers.active_index(), Some(2));
        let first = markers.records()[0].handle;
        assert_eq!(
            markers.surface().marker(first).map(|spec| spec.style),
            Some(MarkerStyle::Numbered(1))
        );
    }

    #[test]
    fn clearing_active_restores_start_style() {
        let mut markers = manager();
        let mut start = GeocodedStop::from_candidate(AddressCandidate::start("100 Main St"));
        start.coordinates = Some(Coordinates::new(0.5, 0.5));
        markers.display_route(&route(vec![start, stop("2 B St", Some((2.0, 2.0)))]));

        markers.set_active_marker(0);
        markers.clear_active_marker();

        let handle = markers.records()[0].handle;
        assert_eq!(
            markers.surface().marker(handle).map(|spec| spec.style),
            Some(MarkerStyle::Start)
        );
        assert_eq!(markers.active_index(), None);
    }

    #[test]
    fn activating_skipped_stop_leaves_nothing_active() {
        let mut markers = manager();
        markers.display_route(&route(vec![
            stop("1 A St", Some((1.0, 1.0))),
            stop("2 B St", None),
        ]));

        markers.set_active_marker(0);
        markers.set_active_marker(1);
        assert!(markers.surface().active_markers().is_empty());
        assert_eq!(markers.active_index(), None);
    }
}
