//! Core of the field route planner.
//!
//! Turns a loose set of addresses into a geocoded, optimized, displayed and
//! step-navigable route.

pub mod config;
pub mod db;
pub mod events;
pub mod logging;
pub mod map;
pub mod model;
pub mod pipeline;
pub mod remote;
pub mod repo;
pub mod service;

pub use config::{ConfigError, MapViewConfig, RouteConfig};
pub use events::{EventBus, RecordingListener, RouteEvent, RouteEventListener};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use map::{MapSurface, MarkerManager, MarkerRecord, MarkerStyle, RecordingMapSurface};
pub use model::address::{normalize_address, AddressCandidate, Coordinates, GeocodedStop, SourceKind};
pub use model::route::{Route, RouteId, RouteSignature, RouteValidationError};
pub use pipeline::{build_http_orchestrator, HttpRouteOrchestrator, PipelineError};
pub use remote::{
    GeocodingClient, OptimizationClient, RemoteError, RemoteResult, TripPlanner,
};
pub use repo::geocode_repo::{
    CacheError, CacheResult, GeocodeCacheRepository, MemoryGeocodeCache, SqliteGeocodeCache,
};
pub use service::collector::{
    AddressCollector, AddressRecord, CollectWarning, Collection, CollectorInputs,
    DestinationSource,
};
pub use service::geocode_service::{GeocodeResolver, ResolveStats};
pub use service::navigation::NavigationController;
pub use service::optimizer::{OptimizationStrategy, OptimizedRoute, RouteOptimizer};
pub use service::orchestrator::{CreateOutcome, RouteCreationOrchestrator};
pub use service::route_manager::{
    CreationReport, RouteError, RouteManager, RouteResult, RouteState,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
