//! Assembly of the production pipeline from `RouteConfig`.

use crate::config::RouteConfig;
use crate::map::markers::MarkerManager;
use crate::map::surface::MapSurface;
use crate::remote::{
    HttpGeocodingClient, HttpOptimizationClient, OsrmTripPlanner, RemoteError,
};
use crate::repo::geocode_repo::{CacheError, SqliteGeocodeCache};
use crate::service::collector::AddressCollector;
use crate::service::geocode_service::GeocodeResolver;
use crate::service::optimizer::RouteOptimizer;
use crate::service::orchestrator::RouteCreationOrchestrator;
use crate::service::route_manager::RouteManager;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Orchestrator backed by the HTTP clients and the SQLite geocode cache.
pub type HttpRouteOrchestrator<S> = RouteCreationOrchestrator<
    HttpGeocodingClient,
    SqliteGeocodeCache,
    HttpOptimizationClient,
    OsrmTripPlanner,
    S,
>;

#[derive(Debug)]
pub enum PipelineError {
    Remote(RemoteError),
    Cache(CacheError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(err) => write!(f, "failed to build http client: {err}"),
            Self::Cache(err) => write!(f, "failed to open geocode cache: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Cache(err) => Some(err),
        }
    }
}

impl From<RemoteError> for PipelineError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<CacheError> for PipelineError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// Builds the full pipeline rendering onto `surface`.
pub fn build_http_orchestrator<S: MapSurface>(
    config: &RouteConfig,
    surface: S,
) -> Result<HttpRouteOrchestrator<S>, PipelineError> {
    let cache = match &config.cache_db_path {
        Some(path) => SqliteGeocodeCache::open(path)?,
        None => SqliteGeocodeCache::in_memory()?,
    };
    let resolver = GeocodeResolver::new(
        HttpGeocodingClient::new(&config.geocoding)?,
        cache,
        config.geocoding.request_delay(),
    );
    let optimizer = RouteOptimizer::new(
        HttpOptimizationClient::new(&config.optimization)?,
        OsrmTripPlanner::new(&config.trip_planner)?,
    );

    Ok(RouteCreationOrchestrator::new(
        AddressCollector::new(config.collector),
        RouteManager::new(resolver, optimizer),
        MarkerManager::new(surface, config.map),
    ))
}
