//! Current-route lifecycle: creation, reuse detection and clearing.
//!
//! # Responsibility
//! - Run geocode -> filter -> optimize for a candidate set.
//! - Own the single current route and its signature.
//!
//! # Invariants
//! - Every creation works on fresh `GeocodedStop` copies of the candidates.
//! - Geocoding completes before optimization starts.
//! - A failed creation leaves the previous route untouched.
//! - A creation overtaken by `clear_route` is discarded, never stored.

use crate::model::address::{AddressCandidate, GeocodedStop};
use crate::model::route::{Route, RouteSignature, RouteValidationError};
use crate::remote::{GeocodingClient, OptimizationClient, TripPlanner};
use crate::repo::geocode_repo::GeocodeCacheRepository;
use crate::service::geocode_service::{GeocodeResolver, ResolveStats};
use crate::service::optimizer::{OptimizationStrategy, RouteOptimizer};
use log::{info, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::Instant;

pub type RouteResult<T> = Result<T, RouteError>;

/// User-facing route creation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No candidates were supplied.
    EmptyRoute,
    /// Every candidate failed geocoding.
    NoGeocodableAddresses { attempted: usize },
    /// Another creation is still in flight.
    CreationInProgress,
    /// The route was cleared while this creation was suspended.
    Superseded,
    /// Operation needs a route but none is active.
    NoActiveRoute,
    InvalidRoute(RouteValidationError),
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRoute => write!(f, "no addresses to build a route from"),
            Self::NoGeocodableAddresses { attempted } => {
                write!(f, "none of the {attempted} addresses could be located")
            }
            Self::CreationInProgress => write!(f, "a route is already being created"),
            Self::Superseded => write!(f, "route creation was superseded by a clear"),
            Self::NoActiveRoute => write!(f, "no active route"),
            Self::InvalidRoute(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRoute(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RouteValidationError> for RouteError {
    fn from(value: RouteValidationError) -> Self {
        Self::InvalidRoute(value)
    }
}

/// Lifecycle state of the route manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Idle,
    Creating,
    Active,
}

/// Diagnostics of the last successful creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationReport {
    pub geocode: ResolveStats,
    pub dropped_ungeocoded: usize,
    pub strategy: OptimizationStrategy,
}

/// Owner of the current route.
pub struct RouteManager<C, R, O, T>
where
    C: GeocodingClient,
    R: GeocodeCacheRepository,
    O: OptimizationClient,
    T: TripPlanner,
{
    resolver: GeocodeResolver<C, R>,
    optimizer: RouteOptimizer<O, T>,
    current: RefCell<Option<Rc<Route>>>,
    last_report: Cell<Option<CreationReport>>,
    creating: Cell<usize>,
    generation: Cell<u64>,
}

impl<C, R, O, T> RouteManager<C, R, O, T>
where
    C: GeocodingClient,
    R: GeocodeCacheRepository,
    O: OptimizationClient,
    T: TripPlanner,
{
    pub fn new(resolver: GeocodeResolver<C, R>, optimizer: RouteOptimizer<O, T>) -> Self {
        Self {
            resolver,
            optimizer,
            current: RefCell::new(None),
            last_report: Cell::new(None),
            creating: Cell::new(0),
            generation: Cell::new(0),
        }
    }

    /// Geocodes, filters and orders `candidates`, then stores the result as
    /// the current route.
    pub async fn create_route(&self, candidates: &[AddressCandidate]) -> RouteResult<Rc<Route>> {
        if candidates.is_empty() {
            return Err(RouteError::EmptyRoute);
        }

        let _creating = CreatingMark::enter(&self.creating);
        let generation = self.generation.get();
        let started_at = Instant::now();
        info!(
            "event=route_create module=route_manager status=start candidates={}",
            candidates.len()
        );

        let candidates = {
            let distinct = distinct_candidates(candidates);
            if distinct.len() < candidates.len() {
                warn!(
                    "event=route_create module=route_manager status=skip dropped_duplicates={}",
                    candidates.len() - distinct.len()
                );
            }
            distinct
        };
        let mut stops: Vec<GeocodedStop> = candidates
            .iter()
            .cloned()
            .map(GeocodedStop::from_candidate)
            .collect();
        let geocode = self.resolver.resolve(&mut stops).await;

        let attempted = stops.len();
        stops.retain(GeocodedStop::is_geocoded);
        let dropped_ungeocoded = attempted - stops.len();
        if stops.is_empty() {
            warn!(
                "event=route_create module=route_manager status=error error_code=no_geocodable_addresses attempted={attempted}"
            );
            return Err(RouteError::NoGeocodableAddresses { attempted });
        }

        let start_index = stops.iter().position(GeocodedStop::is_start);
        let start = start_index.map(|index| stops.remove(index));
        let optimized = self.optimizer.optimize(start, stops).await;

        if self.generation.get() != generation {
            info!("event=route_create module=route_manager status=skip reason=superseded");
            return Err(RouteError::Superseded);
        }

        let route = Rc::new(Route::new(
            optimized.stops,
            RouteSignature::from_candidates(&candidates),
        )?);
        *self.current.borrow_mut() = Some(Rc::clone(&route));
        self.last_report.set(Some(CreationReport {
            geocode,
            dropped_ungeocoded,
            strategy: optimized.strategy,
        }));

        info!(
            "event=route_create module=route_manager status=ok route_id={} stops={} dropped={} strategy={} duration_ms={}",
            route.id(),
            route.len(),
            dropped_ungeocoded,
            optimized.strategy.as_str(),
            started_at.elapsed().as_millis()
        );
        Ok(route)
    }

    /// Drops the current route; in-flight creations will be discarded.
    pub fn clear_route(&self) -> Option<Rc<Route>> {
        self.generation.set(self.generation.get().wrapping_add(1));
        let cleared = self.current.borrow_mut().take();
        if let Some(route) = &cleared {
            info!(
                "event=route_clear module=route_manager status=ok route_id={}",
                route.id()
            );
        }
        cleared
    }

    pub fn has_active_route(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn current_route(&self) -> Option<Rc<Route>> {
        self.current.borrow().clone()
    }

    /// Whether `candidates` describe the address set of the current route.
    pub fn is_current_route(&self, candidates: &[AddressCandidate]) -> bool {
        let signature = RouteSignature::from_candidates(&distinct_candidates(candidates));
        match self.current.borrow().as_ref() {
            Some(route) => *route.signature() == signature,
            None => false,
        }
    }

    pub fn state(&self) -> RouteState {
        if self.creating.get() > 0 {
            RouteState::Creating
        } else if self.has_active_route() {
            RouteState::Active
        } else {
            RouteState::Idle
        }
    }

    pub fn last_report(&self) -> Option<CreationReport> {
        self.last_report.get()
    }

    pub fn resolver(&self) -> &GeocodeResolver<C, R> {
        &self.resolver
    }
}

/// Drops repeated addresses (first seen wins) and demotes every start after
/// the first to a waypoint, so no remote work is spent on an invalid route.
fn distinct_candidates(candidates: &[AddressCandidate]) -> Vec<AddressCandidate> {
    let mut seen = HashSet::new();
    let mut has_start = false;
    let mut distinct = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !seen.insert(candidate.key()) {
            continue;
        }
        let mut candidate = candidate.clone();
        if candidate.is_start {
            candidate.is_start = !has_start;
            has_start = true;
        }
        distinct.push(candidate);
    }
    distinct
}

/// Counts in-flight creations for `state()`; released on every exit path.
struct CreatingMark<'a> {
    counter: &'a Cell<usize>,
}

impl<'a> CreatingMark<'a> {
    fn enter(counter: &'a Cell<usize>) -> Self {
        counter.set(counter.get() + 1);
        Self { counter }
    }
}

impl Drop for CreatingMark<'_> {
    fn drop(&mut self) {
        self.counter.set(self.counter.get().saturating_sub(1));
    }
}
