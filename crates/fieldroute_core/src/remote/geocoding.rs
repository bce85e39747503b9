//! Address to coordinate lookups against a Google-style geocoding endpoint.

use super::{build_http_client, ensure_success, RemoteError, RemoteResult};
use crate::config::GeocodingConfig;
use crate::model::address::Coordinates;
use serde::Deserialize;

const STATUS_OK: &str = "OK";

/// Remote geocoding seam.
#[allow(async_fn_in_trait)]
pub trait GeocodingClient {
    /// Resolves one address to the coordinates of its first result.
    async fn geocode(&self, address: &str) -> RemoteResult<Coordinates>;
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Location,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Extracts the first result's coordinates from a decoded response.
pub fn coordinates_from_response(response: &GeocodeResponse) -> RemoteResult<Coordinates> {
    if response.status != STATUS_OK {
        return Err(RemoteError::Provider(response.status.clone()));
    }
    let first = response
        .results
        .first()
        .ok_or_else(|| RemoteError::Malformed("status OK with empty results".to_string()))?;
    let coordinates = Coordinates::new(first.geometry.location.lat, first.geometry.location.lng);
    if !coordinates.is_valid() {
        return Err(RemoteError::Malformed(format!(
            "location ({}, {}) out of range",
            coordinates.lat, coordinates.lng
        )));
    }
    Ok(coordinates)
}

/// Parses a raw response body.
pub fn parse_geocode_body(body: &str) -> RemoteResult<Coordinates> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|err| RemoteError::Malformed(err.to_string()))?;
    coordinates_from_response(&response)
}

/// `reqwest` geocoding client.
pub struct HttpGeocodingClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpGeocodingClient {
    pub fn new(config: &GeocodingConfig) -> RemoteResult<Self> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl GeocodingClient for HttpGeocodingClient {
    async fn geocode(&self, address: &str) -> RemoteResult<Coordinates> {
        if address.trim().is_empty() {
            return Err(RemoteError::InvalidRequest("empty address".to_string()));
        }

        let mut query = vec![("address", address)];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("key", key));
        }

        let response = self.http.get(&self.endpoint).query(&query).send().await?;
        ensure_success(&response)?;
        let body = response.text().await?;
        parse_geocode_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::parse_geocode_body;
    use crate::remote::RemoteError;

    #[test]
    fn parses_first_result_location() {
        let body = r#"{
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 40.71, "lng": -74.0}}},
                {"geometry": {"location": {"lat": 1.0, "lng": 1.0}}}
            ]
        }"#;
        let coordinates = parse_geocode_body(body).unwrap();
        assert_eq!(coordinates.lat, 40.71);
        assert_eq!(coordinates.lng, -74.0);
    }

    #[test]
    fn non_ok_status_is_provider_error() {
        let error = parse_geocode_body(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap_err();
        assert!(matches!(error, RemoteError::Provider(status) if status == "ZERO_RESULTS"));
    }

    #[test]
    fn ok_without_results_is_malformed() {
        let error = parse_geocode_body(r#"{"status": "OK"}"#).unwrap_err();
        assert!(matches!(error, RemoteError::Malformed(_)));
    }

    #[test]
    fn unexpected_shape_is_malformed() {
        let error = parse_geocode_body(r#"{"status": "OK", "results": [{"geometry": {}}]}"#)
            .unwrap_err();
        assert!(matches!(error, RemoteError::Malformed(_)));
    }
}
