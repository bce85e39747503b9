//! Stop ordering with a primary optimizer, a trip-planner fallback and an
//! identity fallback.
//!
//! # Responsibility
//! - Decide visiting order for waypoints after a fixed origin.
//! - Absorb every remote failure; optimization never blocks route creation.
//!
//! # Invariants
//! - Output starts with the origin, followed by each usable waypoint exactly once.
//! - 0 or 1 waypoints are returned unchanged without any remote call.
//! - Waypoints without usable coordinates are dropped before remote calls.

use crate::model::address::{Coordinates, GeocodedStop};
use crate::remote::{
    validate_permutation, OptimizationClient, RemoteError, RemoteResult, TripPlanner,
};
use log::{info, warn};
use std::time::Instant;

/// Which path produced the final order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationStrategy {
    /// Too few waypoints to reorder.
    Unchanged,
    Primary,
    TripPlanner,
    /// Both remote paths failed; input order kept.
    OriginalOrder,
}

impl OptimizationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Primary => "primary",
            Self::TripPlanner => "trip_planner",
            Self::OriginalOrder => "original_order",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedRoute {
    pub stops: Vec<GeocodedStop>,
    pub strategy: OptimizationStrategy,
}

/// Orders stops through the fallback chain primary -> trip planner -> identity.
pub struct RouteOptimizer<O: OptimizationClient, T: TripPlanner> {
    primary: O,
    trip_planner: T,
}

impl<O: OptimizationClient, T: TripPlanner> RouteOptimizer<O, T> {
    pub fn new(primary: O, trip_planner: T) -> Self {
        Self {
            primary,
            trip_planner,
        }
    }

    /// Returns `[start, ...waypoints]` in visiting order.
    ///
    /// Without a start, the first waypoint is the fixed origin.
    pub async fn optimize(
        &self,
        start: Option<GeocodedStop>,
        waypoints: Vec<GeocodedStop>,
    ) -> OptimizedRoute {
        if waypoints.len() <= 1 {
            return OptimizedRoute {
                stops: start.into_iter().chain(waypoints).collect(),
                strategy: OptimizationStrategy::Unchanged,
            };
        }

        let (origin, waypoints) = match start {
            Some(start) => (start, waypoints),
            None => {
                let mut rest = waypoints;
                let origin = rest.remove(0);
                (origin, rest)
            }
        };

        let before = waypoints.len();
        let waypoints: Vec<GeocodedStop> = waypoints
            .into_iter()
            .filter(GeocodedStop::is_geocoded)
            .collect();
        if waypoints.len() < before {
            warn!(
                "event=optimize module=optimizer status=skip dropped_waypoints={} reason=no_coordinates",
                before - waypoints.len()
            );
        }

        if waypoints.len() <= 1 {
            return OptimizedRoute {
                stops: std::iter::once(origin).chain(waypoints).collect(),
                strategy: OptimizationStrategy::Unchanged,
            };
        }

        let started_at = Instant::now();
        let (order, strategy) = match self.try_primary(&origin, &waypoints).await {
            Ok(order) => (order, OptimizationStrategy::Primary),
            Err(err) => {
                warn!(
                    "event=optimize module=optimizer status=error stage=primary error_code={} error={err}",
                    err.code()
                );
                match self.try_trip_planner(&origin, &waypoints).await {
                    Ok(order) => (order, OptimizationStrategy::TripPlanner),
                    Err(err) => {
                        warn!(
                            "event=optimize module=optimizer status=error stage=trip_planner error_code={} error={err}",
                            err.code()
                        );
                        ((0..waypoints.len()).collect(), OptimizationStrategy::OriginalOrder)
                    }
                }
            }
        };

        info!(
            "event=optimize module=optimizer status=ok strategy={} waypoints={} duration_ms={}",
            strategy.as_str(),
            waypoints.len(),
            started_at.elapsed().as_millis()
        );

        OptimizedRoute {
            stops: apply_order(origin, waypoints, &order),
            strategy,
        }
    }

    async fn try_primary(
        &self,
        origin: &GeocodedStop,
        waypoints: &[GeocodedStop],
    ) -> RemoteResult<Vec<usize>> {
        let origin_text = origin.text().to_string();
        let addresses: Vec<String> = std::iter::once(origin_text.clone())
            .chain(waypoints.iter().map(|stop| stop.text().to_string()))
            .chain(std::iter::once(origin_text))
            .collect();
        let order = self.primary.optimize(&addresses).await?;
        validate_permutation(&order, waypoints.len())?;
        Ok(order)
    }

    async fn try_trip_planner(
        &self,
        origin: &GeocodedStop,
        waypoints: &[GeocodedStop],
    ) -> RemoteResult<Vec<usize>> {
        let origin_point = origin.valid_coordinates().ok_or_else(|| {
            RemoteError::InvalidRequest("origin has no coordinates".to_string())
        })?;
        let points: Vec<Coordinates> = std::iter::once(origin_point)
            .chain(waypoints.iter().filter_map(GeocodedStop::valid_coordinates))
            .collect();
        let order = self.trip_planner.plan_trip(&points).await?;
        validate_permutation(&order, waypoints.len())?;
        Ok(order)
    }
}

/// Rebuilds `[origin] + order.map(|i| waypoints[i])`.
///
/// `order` is a validated permutation; repeated or out-of-range indices
/// are still skipped rather than panicking.
fn apply_order(
    origin: GeocodedStop,
    waypoints: Vec<GeocodedStop>,
    order: &[usize],
) -> Vec<GeocodedStop> {
    let mut slots: Vec<Option<GeocodedStop>> = waypoints.into_iter().map(Some).collect();
    let mut stops = Vec::with_capacity(slots.len() + 1);
    stops.push(origin);
    for &index in order {
        if let Some(stop) = slots.get_mut(index).and_then(Option::take) {
            stops.push(stop);
        }
    }
    stops
}

#[cfg(test)]
mod tests {
    use super::apply_order;
    use crate::model::address::{AddressCandidate, GeocodedStop, SourceKind};

    fn stop(text: &str) -> GeocodedStop {
        GeocodedStop::from_candidate(AddressCandidate::new(text, SourceKind::Manual))
    }

    #[test]
    fn apply_order_ignores_repeats_and_out_of_range() {
        let stops = apply_order(stop("origin"), vec![stop("a"), stop("b")], &[1, 1, 7, 0]);
        let texts: Vec<&str> = stops.iter().map(GeocodedStop::text).collect();
        assert_eq!(texts, vec!["origin", "b", "a"]);
    }
}
