//! Top-level route pipeline: collect -> create -> display -> navigate.
//!
//! # Responsibility
//! - Serialize route creation; reject (not queue) overlapping requests.
//! - Commit a created route to the map and notify subscribers.
//! - Expose navigation and route ending to the UI layer.
//!
//! # Invariants
//! - The in-flight marker is released on every exit path of `create_route`.
//! - Events are emitted after state changes and outside internal borrows.

use crate::events::{EventBus, RouteEvent, RouteEventListener};
use crate::map::markers::MarkerManager;
use crate::map::surface::MapSurface;
use crate::model::route::Route;
use crate::remote::{GeocodingClient, OptimizationClient, TripPlanner};
use crate::repo::geocode_repo::GeocodeCacheRepository;
use crate::service::collector::{AddressCollector, CollectWarning, CollectorInputs};
use crate::service::navigation::NavigationController;
use crate::service::route_manager::{RouteError, RouteManager, RouteResult};
use log::{info, warn};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a successful `create_route` request.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// A new route was built and displayed.
    Created {
        route: Rc<Route>,
        warnings: Vec<CollectWarning>,
    },
    /// Inputs match the displayed route; nothing was recomputed.
    Reused {
        route: Rc<Route>,
        warnings: Vec<CollectWarning>,
    },
}

impl CreateOutcome {
    pub fn route(&self) -> &Rc<Route> {
        match self {
            Self::Created { route, .. } | Self::Reused { route, .. } => route,
        }
    }

    pub fn warnings(&self) -> &[CollectWarning] {
        match self {
            Self::Created { warnings, .. } | Self::Reused { warnings, .. } => warnings,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, Self::Reused { .. })
    }
}

/// Wires collector, route manager, markers, navigation and events together.
pub struct RouteCreationOrchestrator<C, R, O, T, S>
where
    C: GeocodingClient,
    R: GeocodeCacheRepository,
    O: OptimizationClient,
    T: TripPlanner,
    S: MapSurface,
{
    collector: AddressCollector,
    routes: RouteManager<C, R, O, T>,
    markers: RefCell<MarkerManager<S>>,
    navigation: RefCell<NavigationController>,
    events: EventBus,
    in_flight: AtomicBool,
}

impl<C, R, O, T, S> RouteCreationOrchestrator<C, R, O, T, S>
where
    C: GeocodingClient,
    R: GeocodeCacheRepository,
    O: OptimizationClient,
    T: TripPlanner,
    S: MapSurface,
{
    pub fn new(
        collector: AddressCollector,
        routes: RouteManager<C, R, O, T>,
        markers: MarkerManager<S>,
    ) -> Self {
        Self {
            collector,
            routes,
            markers: RefCell::new(markers),
            navigation: RefCell::new(NavigationController::new()),
            events: EventBus::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self, listener: Rc<dyn RouteEventListener>) {
        self.events.subscribe(listener);
    }

    /// Collects candidates from `inputs` and builds, displays and announces a route.
    ///
    /// # Errors
    /// - `CreationInProgress` when another call has not finished.
    /// - `EmptyRoute` when collection yields no valid candidate.
    /// - `NoGeocodableAddresses` / `Superseded` from the route manager.
    pub async fn create_route(&self, inputs: &CollectorInputs) -> RouteResult<CreateOutcome> {
        let Some(_in_flight) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("event=route_request module=orchestrator status=error error_code=creation_in_progress");
            return Err(RouteError::CreationInProgress);
        };

        let collection = self.collector.collect(inputs);
        if collection.stops.is_empty() {
            warn!("event=route_request module=orchestrator status=error error_code=empty_route");
            return Err(RouteError::EmptyRoute);
        }

        if let Some(route) = self.routes.current_route() {
            if *route.signature() == collection.signature() {
                info!(
                    "event=route_request module=orchestrator status=ok outcome=reused route_id={}",
                    route.id()
                );
                return Ok(CreateOutcome::Reused {
                    route,
                    warnings: collection.warnings,
                });
            }
        }

        let route = self.routes.create_route(&collection.stops).await?;

        let stopped = {
            let mut markers = self.markers.borrow_mut();
            let stopped = self.navigation.borrow_mut().stop_navigation(&mut markers);
            markers.display_route(&route);
            stopped
        };
        if let Some(route_id) = stopped {
            self.events.emit(RouteEvent::NavigationStopped { route_id });
        }
        self.events.emit(RouteEvent::Created {
            route: Rc::clone(&route),
        });

        info!(
            "event=route_request module=orchestrator status=ok outcome=created route_id={} warnings={}",
            route.id(),
            collection.warnings.len()
        );
        Ok(CreateOutcome::Created {
            route,
            warnings: collection.warnings,
        })
    }

    /// Whether a create action would do new work for `inputs`.
    pub fn can_create_route(&self, inputs: &CollectorInputs) -> bool {
        if self.is_creating() {
            return false;
        }
        let collection = self.collector.collect(inputs);
        !collection.stops.is_empty() && !self.routes.is_current_route(&collection.stops)
    }

    pub fn is_creating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Starts navigation at the first stop of the current route.
    pub fn start_navigation(&self) -> RouteResult<usize> {
        let route = self.routes.current_route().ok_or(RouteError::NoActiveRoute)?;
        let route_id = route.id();
        {
            let mut markers = self.markers.borrow_mut();
            self.navigation
                .borrow_mut()
                .start_navigation(route, &mut markers);
        }
        self.events.emit(RouteEvent::NavigationStarted { route_id });
        self.events
            .emit(RouteEvent::ActiveStopChanged { route_id, index: 0 });
        Ok(0)
    }

    pub fn next(&self) -> Option<usize> {
        self.step(|navigation, markers| navigation.next(markers))
    }

    pub fn previous(&self) -> Option<usize> {
        self.step(|navigation, markers| navigation.previous(markers))
    }

    pub fn jump_to(&self, index: usize) -> Option<usize> {
        self.step(|navigation, markers| navigation.jump_to(index, markers))
    }

    fn step(
        &self,
        action: impl FnOnce(&mut NavigationController, &mut MarkerManager<S>) -> Option<usize>,
    ) -> Option<usize> {
        let (moved, route_id) = {
            let mut navigation = self.navigation.borrow_mut();
            let mut markers = self.markers.borrow_mut();
            let moved = action(&mut *navigation, &mut *markers);
            (moved, navigation.route().map(|route| route.id()))
        };
        if let (Some(index), Some(route_id)) = (moved, route_id) {
            self.events
                .emit(RouteEvent::ActiveStopChanged { route_id, index });
        }
        moved
    }

    /// Ends stop-by-stop navigation but keeps the route on the map.
    pub fn stop_navigation(&self) {
        let stopped = {
            let mut markers = self.markers.borrow_mut();
            self.navigation.borrow_mut().stop_navigation(&mut markers)
        };
        if let Some(route_id) = stopped {
            self.events.emit(RouteEvent::NavigationStopped { route_id });
        }
    }

    /// Ends the route: stops navigation, removes route artifacts, restores the
    /// address markers and forgets the route.
    pub fn end_route(&self) {
        self.stop_navigation();
        self.markers.borrow_mut().clear_route_display();
        if let Some(route) = self.routes.clear_route() {
            self.events
                .emit(RouteEvent::Cleared { route_id: route.id() });
        }
    }

    pub fn current_route(&self) -> Option<Rc<Route>> {
        self.routes.current_route()
    }

    pub fn routes(&self) -> &RouteManager<C, R, O, T> {
        &self.routes
    }

    pub fn markers(&self) -> Ref<'_, MarkerManager<S>> {
        self.markers.borrow()
    }

    pub fn navigation(&self) -> Ref<'_, NavigationController> {
        self.navigation.borrow()
    }
}

/// Single in-flight marker for route creation.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::InFlightGuard;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn guard_rejects_second_holder_and_releases_on_drop() {
        let flag = AtomicBool::new(false);
        let first = InFlightGuard::acquire(&flag).expect("first acquire");
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(first);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }
}
