//! Stop-by-stop navigation over the active route.
//!
//! # Responsibility
//! - Keep the navigation cursor and drive marker highlight and map focus.
//!
//! # Invariants
//! - The cursor is `None` (inactive) or a valid index into the bound route.
//! - Stepping past either end is a no-op, not an error.
//! - Stepping pans the map; only `start_navigation` changes zoom.

use crate::map::markers::MarkerManager;
use crate::map::surface::MapSurface;
use crate::model::address::GeocodedStop;
use crate::model::route::{Route, RouteId};
use log::{debug, info};
use std::rc::Rc;

/// Navigation cursor over one route.
#[derive(Debug, Default)]
pub struct NavigationController {
    route: Option<Rc<Route>>,
    cursor: Option<usize>,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `route`, shows it whole once, then highlights the first stop.
    pub fn start_navigation<S: MapSurface>(
        &mut self,
        route: Rc<Route>,
        markers: &mut MarkerManager<S>,
    ) {
        markers.fit_view_to_route();
        markers.set_active_marker(0);
        info!(
            "event=navigation_start module=navigation status=ok route_id={} stops={}",
            route.id(),
            route.len()
        );
        self.cursor = Some(0);
        self.route = Some(route);
    }

    /// Advances one stop; returns the new index when the cursor moved.
    pub fn next<S: MapSurface>(&mut self, markers: &mut MarkerManager<S>) -> Option<usize> {
        let (cursor, len) = self.position()?;
        if cursor + 1 >= len {
            debug!("event=navigation_next module=navigation status=skip reason=at_last_stop");
            return None;
        }
        Some(self.move_to(cursor + 1, markers))
    }

    /// Steps back one stop; returns the new index when the cursor moved.
    pub fn previous<S: MapSurface>(&mut self, markers: &mut MarkerManager<S>) -> Option<usize> {
        let (cursor, _) = self.position()?;
        if cursor == 0 {
            debug!("event=navigation_previous module=navigation status=skip reason=at_first_stop");
            return None;
        }
        Some(self.move_to(cursor - 1, markers))
    }

    /// Moves to `index`; out-of-range indices and inactive navigation are ignored.
    pub fn jump_to<S: MapSurface>(
        &mut self,
        index: usize,
        markers: &mut MarkerManager<S>,
    ) -> Option<usize> {
        let (cursor, len) = self.position()?;
        if index >= len {
            debug!(
                "event=navigation_jump module=navigation status=skip index={index} len={len}"
            );
            return None;
        }
        if index == cursor {
            return None;
        }
        Some(self.move_to(index, markers))
    }

    /// Resets the cursor and clears the highlight; the route stays displayed.
    ///
    /// Returns the id of the route that was being navigated.
    pub fn stop_navigation<S: MapSurface>(
        &mut self,
        markers: &mut MarkerManager<S>,
    ) -> Option<RouteId> {
        self.cursor = None;
        let route = self.route.take()?;
        markers.clear_active_marker();
        info!(
            "event=navigation_stop module=navigation status=ok route_id={}",
            route.id()
        );
        Some(route.id())
    }

    fn move_to<S: MapSurface>(&mut self, index: usize, markers: &mut MarkerManager<S>) -> usize {
        self.cursor = Some(index);
        markers.set_active_marker(index);
        markers.focus_stop(index);
        debug!("event=navigation_move module=navigation status=ok index={index}");
        index
    }

    fn position(&self) -> Option<(usize, usize)> {
        let route = self.route.as_ref()?;
        let cursor = self.cursor?;
        Some((cursor, route.len()))
    }

    pub fn is_active(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current_stop(&self) -> Option<&GeocodedStop> {
        let route = self.route.as_ref()?;
        route.get(self.cursor?)
    }

    pub fn route(&self) -> Option<&Rc<Route>> {
        self.route.as_ref()
    }

    /// One-based progress label such as `"2 / 5"`.
    pub fn progress(&self) -> Option<String> {
        let (cursor, len) = self.position()?;
        Some(format!("{} / {}", cursor + 1, len))
    }
}
