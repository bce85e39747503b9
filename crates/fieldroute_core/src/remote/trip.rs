//! Road-network trip planning fallback (OSRM `trip` service).
//!
//! Request: `GET <endpoint>/<lng,lat;lng,lat;...>?source=first&roundtrip=true`.
//! Response: `{ "code": "Ok", "trips": [..], "waypoints": [..] }`.

use super::{build_http_client, ensure_success, validate_permutation, RemoteError, RemoteResult};
use crate::config::TripPlannerConfig;
use crate::model::address::Coordinates;
use serde::Deserialize;

const CODE_OK: &str = "Ok";

/// Coordinate-based trip planning seam.
#[allow(async_fn_in_trait)]
pub trait TripPlanner {
    /// `coordinates[0]` is the fixed origin; returns the visiting order of
    /// `coordinates[1..]` as zero-based waypoint indices.
    async fn plan_trip(&self, coordinates: &[Coordinates]) -> RemoteResult<Vec<usize>>;
}

#[derive(Debug, Deserialize)]
struct TripResponse {
    code: String,
    #[serde(default)]
    trips: Vec<Trip>,
    #[serde(default)]
    waypoints: Vec<TripWaypoint>,
}

#[derive(Debug, Deserialize)]
struct Trip {
    #[serde(default)]
    #[allow(dead_code)]
    legs: Vec<serde_json::Value>,
    /// Input indices in visiting order, origin included.
    waypoint_order: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct TripWaypoint {
    /// Position of this input coordinate within the trip.
    waypoint_index: usize,
}

/// Parses a trip response into waypoint visiting order.
///
/// `input_count` is the number of coordinates sent, origin included.
pub fn parse_trip_body(body: &str, input_count: usize) -> RemoteResult<Vec<usize>> {
    let response: TripResponse =
        serde_json::from_str(body).map_err(|err| RemoteError::Malformed(err.to_string()))?;
    if response.code != CODE_OK {
        return Err(RemoteError::Provider(response.code));
    }
    let trip = response
        .trips
        .first()
        .ok_or_else(|| RemoteError::Malformed("no trips in response".to_string()))?;

    let visit_order = match &trip.waypoint_order {
        Some(order) => order.clone(),
        None => visit_order_from_positions(&response.waypoints)?,
    };
    validate_permutation(&visit_order, input_count)?;

    // Rotate so the origin leads, then map inputs 1.. onto waypoint indices.
    let origin_at = visit_order
        .iter()
        .position(|&index| index == 0)
        .ok_or_else(|| RemoteError::Malformed("trip does not visit the origin".to_string()))?;
    let waypoint_order = visit_order[origin_at + 1..]
        .iter()
        .chain(visit_order[..origin_at].iter())
        .map(|&index| index - 1)
        .collect();
    Ok(waypoint_order)
}

fn visit_order_from_positions(waypoints: &[TripWaypoint]) -> RemoteResult<Vec<usize>> {
    if waypoints.is_empty() {
        return Err(RemoteError::Malformed(
            "trip has neither waypoint_order nor waypoints".to_string(),
        ));
    }
    let mut order = vec![usize::MAX; waypoints.len()];
    for (input_index, waypoint) in waypoints.iter().enumerate() {
        let slot = order.get_mut(waypoint.waypoint_index).ok_or_else(|| {
            RemoteError::Malformed(format!(
                "waypoint_index {} out of range",
                waypoint.waypoint_index
            ))
        })?;
        *slot = input_index;
    }
    Ok(order)
}

/// Formats coordinates as the OSRM `lng,lat;lng,lat` path segment.
pub fn coordinate_path(coordinates: &[Coordinates]) -> String {
    coordinates
        .iter()
        .map(|point| format!("{:.6},{:.6}", point.lng, point.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// `reqwest` OSRM trip client.
pub struct OsrmTripPlanner {
    http: reqwest::Client,
    endpoint: String,
}

impl OsrmTripPlanner {
    pub fn new(config: &TripPlannerConfig) -> RemoteResult<Self> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

impl TripPlanner for OsrmTripPlanner {
    async fn plan_trip(&self, coordinates: &[Coordinates]) -> RemoteResult<Vec<usize>> {
        if coordinates.len() < 2 {
            return Err(RemoteError::InvalidRequest(format!(
                "trip needs at least 2 coordinates, got {}",
                coordinates.len()
            )));
        }
        if let Some(bad) = coordinates.iter().find(|point| !point.is_valid()) {
            return Err(RemoteError::InvalidRequest(format!(
                "invalid coordinate ({}, {})",
                bad.lat, bad.lng
            )));
        }

        let url = format!("{}/{}", self.endpoint, coordinate_path(coordinates));
        let response = self
            .http
            .get(url)
            .query(&[("source", "first"), ("roundtrip", "true")])
            .send()
            .await?;
        ensure_success(&response)?;
        let body = response.text().await?;
        parse_trip_body(&body, coordinates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{coordinate_path, parse_trip_body};
    use crate::model::address::Coordinates;
    use crate::remote::RemoteError;

    #[test]
    fn derives_order_from_waypoint_positions() {
        // Inputs: origin, A, B, C. Trip visits origin, C, A, B.
        let body = r#"{
            "code": "Ok",
            "trips": [{"legs": []}],
            "waypoints": [
                {"waypoint_index": 0, "trips_index": 0},
                {"waypoint_index": 2, "trips_index": 0},
                {"waypoint_index": 3, "trips_index": 0},
                {"waypoint_index": 1, "trips_index": 0}
            ]
        }"#;
        assert_eq!(parse_trip_body(body, 4).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn uses_explicit_waypoint_order_and_rotates_origin_first() {
        let body = r#"{"code": "Ok", "trips": [{"legs": [], "waypoint_order": [2, 0, 1]}]}"#;
        assert_eq!(parse_trip_body(body, 3).unwrap(), vec![0, 1]);
    }

    #[test]
    fn non_ok_code_is_provider_error() {
        let error = parse_trip_body(r#"{"code": "NoTrips", "trips": []}"#, 3).unwrap_err();
        assert!(matches!(error, RemoteError::Provider(code) if code == "NoTrips"));
    }

    #[test]
    fn missing_trips_is_malformed() {
        let error = parse_trip_body(r#"{"code": "Ok", "trips": []}"#, 3).unwrap_err();
        assert!(matches!(error, RemoteError::Malformed(_)));
    }

    #[test]
    fn path_is_lng_lat_pairs() {
        let path = coordinate_path(&[Coordinates::new(1.5, 2.25), Coordinates::new(-3.0, 4.0)]);
        assert_eq!(path, "2.250000,1.500000;4.000000,-3.000000");
    }
}
