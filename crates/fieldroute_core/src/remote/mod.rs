//! Clients for the external geocoding, optimization and trip-planning services.
//!
//! # Responsibility
//! - Define the async seams the services depend on.
//! - Provide `reqwest` implementations and pure response validators.
//!
//! # Invariants
//! - A client either returns fully validated data or a `RemoteError`.
//! - Clients never retry; fallback policy lives in the services.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod geocoding;
pub mod optimization;
pub mod trip;

pub use geocoding::{GeocodingClient, HttpGeocodingClient};
pub use optimization::{HttpOptimizationClient, OptimizationClient};
pub use trip::{OsrmTripPlanner, TripPlanner};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of one remote call.
#[derive(Debug)]
pub enum RemoteError {
    /// Connection, timeout or body decoding failure.
    Transport(reqwest::Error),
    /// Non-success HTTP status.
    Status(u16),
    /// Provider-level status other than success (e.g. `ZERO_RESULTS`).
    Provider(String),
    /// Response body did not have the expected shape.
    Malformed(String),
    /// Request could not be built from the given input.
    InvalidRequest(String),
}

impl RemoteError {
    /// Short stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status(_) => "http_status",
            Self::Provider(_) => "provider_status",
            Self::Malformed(_) => "malformed_response",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Status(status) => write!(f, "unexpected http status {status}"),
            Self::Provider(status) => write!(f, "provider returned status `{status}`"),
            Self::Malformed(message) => write!(f, "malformed response: {message}"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

pub(crate) fn build_http_client(timeout: std::time::Duration) -> RemoteResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub(crate) fn ensure_success(response: &reqwest::Response) -> RemoteResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(RemoteError::Status(status.as_u16()))
    }
}

/// Checks that `order` visits each of `len` indices exactly once.
pub(crate) fn validate_permutation(order: &[usize], len: usize) -> RemoteResult<()> {
    if order.len() != len {
        return Err(RemoteError::Malformed(format!(
            "order has {} entries, expected {len}",
            order.len()
        )));
    }
    let mut seen = vec![false; len];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(RemoteError::Malformed(format!(
                    "order repeats index {index}"
                )))
            }
            None => {
                return Err(RemoteError::Malformed(format!(
                    "order index {index} out of range for {len} waypoints"
                )))
            }
        }
    }
    Ok(())
}
