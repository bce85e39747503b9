//! Address geocoding with a two-tier cache.
//!
//! # Responsibility
//! - Fill in coordinates for stops, preferring the in-process cache, then the
//!   durable cache, then the remote geocoder.
//! - Space out remote calls to respect provider rate limits.
//!
//! # Invariants
//! - Resolution is best-effort per stop: failures leave `coordinates = None`
//!   and never abort the batch.
//! - A successful remote result is written through to both cache tiers.
//! - The durable cache is only appended to, never invalidated here.

use crate::model::address::{normalize_address, Coordinates, GeocodedStop};
use crate::remote::GeocodingClient;
use crate::repo::geocode_repo::GeocodeCacheRepository;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-batch resolution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Stops that already carried coordinates.
    pub preset: usize,
    pub memory_hits: usize,
    pub durable_hits: usize,
    pub remote_hits: usize,
    pub failures: usize,
}

impl ResolveStats {
    pub fn resolved(&self) -> usize {
        self.preset + self.memory_hits + self.durable_hits + self.remote_hits
    }
}

/// Resolves stop coordinates through memory cache, durable cache and remote service.
pub struct GeocodeResolver<C: GeocodingClient, R: GeocodeCacheRepository> {
    client: C,
    durable: R,
    memory: RefCell<HashMap<String, Coordinates>>,
    request_delay: Duration,
}

impl<C: GeocodingClient, R: GeocodeCacheRepository> GeocodeResolver<C, R> {
    pub fn new(client: C, durable: R, request_delay: Duration) -> Self {
        Self {
            client,
            durable,
            memory: RefCell::new(HashMap::new()),
            request_delay,
        }
    }

    /// Resolves every stop in place.
    pub async fn resolve(&self, stops: &mut [GeocodedStop]) -> ResolveStats {
        let started_at = Instant::now();
        let mut stats = ResolveStats::default();
        let mut remote_calls = 0usize;

        for stop in stops.iter_mut() {
            if stop.is_geocoded() {
                stats.preset += 1;
                continue;
            }

            let key = normalize_address(stop.text());
            if let Some(coordinates) = self.lookup_cached(&key, &mut stats) {
                stop.coordinates = Some(coordinates);
                continue;
            }

            if remote_calls > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            remote_calls += 1;

            stop.coordinates = self.resolve_remote(stop.text(), &key).await;
            if stop.coordinates.is_some() {
                stats.remote_hits += 1;
            } else {
                stats.failures += 1;
            }
        }

        info!(
            "event=geocode_batch module=geocode status=ok stops={} preset={} memory_hits={} durable_hits={} remote_hits={} failures={} duration_ms={}",
            stops.len(),
            stats.preset,
            stats.memory_hits,
            stats.durable_hits,
            stats.remote_hits,
            stats.failures,
            started_at.elapsed().as_millis()
        );
        stats
    }

    fn lookup_cached(&self, key: &str, stats: &mut ResolveStats) -> Option<Coordinates> {
        if let Some(coordinates) = self.memory.borrow().get(key).copied() {
            stats.memory_hits += 1;
            return Some(coordinates);
        }

        match self.durable.get(key) {
            Ok(Some(coordinates)) => {
                self.memory.borrow_mut().insert(key.to_string(), coordinates);
                stats.durable_hits += 1;
                Some(coordinates)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(
                    "event=geocode_cache_read module=geocode status=error error_code=durable_cache_read error={err}"
                );
                None
            }
        }
    }

    async fn resolve_remote(&self, address: &str, key: &str) -> Option<Coordinates> {
        debug!("event=geocode_remote module=geocode status=start address={address}");
        match self.client.geocode(address).await {
            Ok(coordinates) => {
                self.memory.borrow_mut().insert(key.to_string(), coordinates);
                if let Err(err) = self.durable.put(key, coordinates) {
                    warn!(
                        "event=geocode_cache_write module=geocode status=error error_code=durable_cache_write error={err}"
                    );
                }
                Some(coordinates)
            }
            Err(err) => {
                warn!(
                    "event=geocode_remote module=geocode status=error error_code={} error={err}",
                    err.code()
                );
                None
            }
        }
    }

    /// Number of entries in the in-process cache.
    pub fn memory_cache_len(&self) -> usize {
        self.memory.borrow().len()
    }

    pub fn durable_cache(&self) -> &R {
        &self.durable
    }
}
