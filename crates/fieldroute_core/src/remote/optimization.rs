//! Primary route-order optimization service client.
//!
//! Request: `POST { "addresses": [origin, waypoint..., destination] }`.
//! Response: `{ "order": [..] }`, zero-based indices into the waypoint sub-list.

use super::{build_http_client, ensure_success, validate_permutation, RemoteError, RemoteResult};
use crate::config::OptimizationConfig;
use serde::{Deserialize, Serialize};

/// Remote optimization seam.
#[allow(async_fn_in_trait)]
pub trait OptimizationClient {
    /// Returns the visiting order of the waypoints between the first and last address.
    async fn optimize(&self, addresses: &[String]) -> RemoteResult<Vec<usize>>;
}

#[derive(Debug, Serialize)]
struct OptimizeRequest<'a> {
    addresses: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OptimizeResponse {
    order: Vec<usize>,
}

/// Number of waypoints in a round-trip address list.
pub fn waypoint_count(addresses: &[String]) -> RemoteResult<usize> {
    addresses.len().checked_sub(2).ok_or_else(|| {
        RemoteError::InvalidRequest(format!(
            "need origin and destination, got {} addresses",
            addresses.len()
        ))
    })
}

/// Parses and validates an optimization response body.
pub fn parse_order_body(body: &str, waypoint_count: usize) -> RemoteResult<Vec<usize>> {
    let response: OptimizeResponse =
        serde_json::from_str(body).map_err(|err| RemoteError::Malformed(err.to_string()))?;
    validate_permutation(&response.order, waypoint_count)?;
    Ok(response.order)
}

/// `reqwest` client for the primary optimizer.
pub struct HttpOptimizationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpOptimizationClient {
    pub fn new(config: &OptimizationConfig) -> RemoteResult<Self> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl OptimizationClient for HttpOptimizationClient {
    async fn optimize(&self, addresses: &[String]) -> RemoteResult<Vec<usize>> {
        let waypoints = waypoint_count(addresses)?;
        let response = self
            .http
            .post(&self.endpoint)
            .json(&OptimizeRequest { addresses })
            .send()
            .await?;
        ensure_success(&response)?;
        let body = response.text().await?;
        parse_order_body(&body, waypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_order_body, waypoint_count};
    use crate::remote::RemoteError;

    #[test]
    fn accepts_valid_order() {
        assert_eq!(parse_order_body(r#"{"order": [1, 0]}"#, 2).unwrap(), vec![1, 0]);
    }

    #[test]
    fn rejects_missing_order_and_bad_indices() {
        assert!(matches!(
            parse_order_body(r#"{"routes": []}"#, 2).unwrap_err(),
            RemoteError::Malformed(_)
        ));
        assert!(parse_order_body(r#"{"order": [0, 5]}"#, 2).is_err());
        assert!(parse_order_body(r#"{"order": [-1, 0]}"#, 2).is_err());
    }

    #[test]
    fn waypoint_count_excludes_origin_and_destination() {
        let addresses: Vec<String> = ["a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(waypoint_count(&addresses).unwrap(), 2);
        assert!(waypoint_count(&addresses[..1]).is_err());
    }
}
