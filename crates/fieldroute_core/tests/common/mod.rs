#![allow(dead_code)]

use fieldroute_core::{
    normalize_address, AddressCollector, Coordinates, GeocodeResolver, GeocodingClient,
    MapViewConfig, MarkerManager, MemoryGeocodeCache, OptimizationClient, RecordingMapSurface,
    RemoteError, RemoteResult, RouteCreationOrchestrator, RouteManager, RouteOptimizer,
    TripPlanner,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

pub const START: &str = "100 Main St";
pub const OAK: &str = "200 Oak Ave";
pub const ELM: &str = "300 Elm St";
pub const PINE: &str = "400 Pine Rd";

/// Geocoder answering from a fixed table; unknown addresses fail.
#[derive(Clone, Default)]
pub struct FakeGeocoder {
    known: Rc<HashMap<String, Coordinates>>,
    pub calls: Rc<Cell<usize>>,
    pub requested: Rc<RefCell<Vec<String>>>,
    /// Scheduler yields before answering, to keep a call suspended.
    yields: usize,
}

impl FakeGeocoder {
    pub fn new(entries: &[(&str, f64, f64)]) -> Self {
        let known = entries
            .iter()
            .map(|(text, lat, lng)| (normalize_address(text), Coordinates::new(*lat, *lng)))
            .collect();
        Self {
            known: Rc::new(known),
            ..Self::default()
        }
    }

    pub fn standard() -> Self {
        Self::new(&[
            (START, 40.00, -75.00),
            (OAK, 40.01, -75.01),
            (ELM, 40.02, -75.02),
            (PINE, 40.03, -75.03),
        ])
    }

    pub fn with_yields(mut self, yields: usize) -> Self {
        self.yields = yields;
        self
    }
}

impl GeocodingClient for FakeGeocoder {
    async fn geocode(&self, address: &str) -> RemoteResult<Coordinates> {
        for _ in 0..self.yields {
            tokio::task::yield_now().await;
        }
        self.calls.set(self.calls.get() + 1);
        self.requested.borrow_mut().push(address.to_string());
        self.known
            .get(&normalize_address(address))
            .copied()
            .ok_or_else(|| RemoteError::Provider("ZERO_RESULTS".to_string()))
    }
}

/// Scripted answer of a fake remote service.
#[derive(Clone, Debug)]
pub enum Scripted {
    Order(Vec<usize>),
    Fail,
}

#[derive(Clone)]
pub struct FakeOptimizer {
    answer: Scripted,
    pub calls: Rc<Cell<usize>>,
    pub last_addresses: Rc<RefCell<Vec<String>>>,
}

impl FakeOptimizer {
    pub fn new(answer: Scripted) -> Self {
        Self {
            answer,
            calls: Rc::new(Cell::new(0)),
            last_addresses: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl OptimizationClient for FakeOptimizer {
    async fn optimize(&self, addresses: &[String]) -> RemoteResult<Vec<usize>> {
        self.calls.set(self.calls.get() + 1);
        *self.last_addresses.borrow_mut() = addresses.to_vec();
        match &self.answer {
            Scripted::Order(order) => Ok(order.clone()),
            Scripted::Fail => Err(RemoteError::Status(500)),
        }
    }
}

#[derive(Clone)]
pub struct FakeTripPlanner {
    answer: Scripted,
    pub calls: Rc<Cell<usize>>,
    pub last_points: Rc<RefCell<Vec<Coordinates>>>,
}

impl FakeTripPlanner {
    pub fn new(answer: Scripted) -> Self {
        Self {
            answer,
            calls: Rc::new(Cell::new(0)),
            last_points: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl TripPlanner for FakeTripPlanner {
    async fn plan_trip(&self, coordinates: &[Coordinates]) -> RemoteResult<Vec<usize>> {
        self.calls.set(self.calls.get() + 1);
        *self.last_points.borrow_mut() = coordinates.to_vec();
        match &self.answer {
            Scripted::Order(order) => Ok(order.clone()),
            Scripted::Fail => Err(RemoteError::Provider("NoTrips".to_string())),
        }
    }
}

pub type TestResolver = GeocodeResolver<FakeGeocoder, MemoryGeocodeCache>;
pub type TestOptimizer = RouteOptimizer<FakeOptimizer, FakeTripPlanner>;
pub type TestRouteManager =
    RouteManager<FakeGeocoder, MemoryGeocodeCache, FakeOptimizer, FakeTripPlanner>;
pub type TestOrchestrator = RouteCreationOrchestrator<
    FakeGeocoder,
    MemoryGeocodeCache,
    FakeOptimizer,
    FakeTripPlanner,
    RecordingMapSurface,
>;

pub fn resolver(geocoder: FakeGeocoder) -> TestResolver {
    GeocodeResolver::new(geocoder, MemoryGeocodeCache::new(), Duration::ZERO)
}

pub fn route_manager(
    geocoder: FakeGeocoder,
    optimizer: FakeOptimizer,
    trip: FakeTripPlanner,
) -> TestRouteManager {
    RouteManager::new(resolver(geocoder), RouteOptimizer::new(optimizer, trip))
}

pub fn orchestrator(
    geocoder: FakeGeocoder,
    optimizer: FakeOptimizer,
    trip: FakeTripPlanner,
) -> TestOrchestrator {
    RouteCreationOrchestrator::new(
        AddressCollector::default(),
        route_manager(geocoder, optimizer, trip),
        MarkerManager::new(RecordingMapSurface::new(), MapViewConfig::default()),
    )
}
