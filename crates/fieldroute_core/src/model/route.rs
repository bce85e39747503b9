//! Route and route signature model.
//!
//! # Responsibility
//! - Hold one ordered, geocoded route with a stable identity.
//! - Derive order-independent signatures for reuse checks.
//!
//! # Invariants
//! - A route has at least one stop and no duplicate address keys.
//! - When a start stop exists it is the first element.
//! - Signatures are order-insensitive and content-sensitive.

use crate::model::address::{normalize_address, AddressCandidate, GeocodedStop};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one created route.
pub type RouteId = Uuid;

const SIGNATURE_SEPARATOR: &str = "|";

/// Canonical order-independent fingerprint of an address set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteSignature(String);

impl RouteSignature {
    /// Builds a signature from raw address texts.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut keys: Vec<String> = texts.into_iter().map(normalize_address).collect();
        keys.sort();
        Self(keys.join(SIGNATURE_SEPARATOR))
    }

    pub fn from_candidates(candidates: &[AddressCandidate]) -> Self {
        Self::from_texts(candidates.iter().map(|candidate| candidate.text.as_str()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RouteSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Route construction invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteValidationError {
    Empty,
    DuplicateStop(String),
    StartNotFirst,
}

impl Display for RouteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "route must contain at least one stop"),
            Self::DuplicateStop(key) => write!(f, "route contains duplicate stop `{key}`"),
            Self::StartNotFirst => write!(f, "start stop must be the first route element"),
        }
    }
}

impl Error for RouteValidationError {}

/// Ordered sequence of geocoded stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    id: RouteId,
    stops: Vec<GeocodedStop>,
    signature: RouteSignature,
}

impl Route {
    /// Creates a route with a generated id.
    ///
    /// `signature` identifies the candidate set the route was created from,
    /// which may contain addresses that failed geocoding.
    pub fn new(
        stops: Vec<GeocodedStop>,
        signature: RouteSignature,
    ) -> Result<Self, RouteValidationError> {
        if stops.is_empty() {
            return Err(RouteValidationError::Empty);
        }

        let mut seen = HashSet::new();
        for stop in &stops {
            let key = stop.key();
            if !seen.insert(key.clone()) {
                return Err(RouteValidationError::DuplicateStop(key));
            }
        }

        if stops.iter().skip(1).any(GeocodedStop::is_start) {
            return Err(RouteValidationError::StartNotFirst);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            stops,
            signature,
        })
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn stops(&self) -> &[GeocodedStop] {
        &self.stops
    }

    pub fn get(&self, index: usize) -> Option<&GeocodedStop> {
        self.stops.get(index)
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always `false` for a constructed route; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn start(&self) -> Option<&GeocodedStop> {
        self.stops.first().filter(|stop| stop.is_start())
    }

    pub fn signature(&self) -> &RouteSignature {
        &self.signature
    }

    /// Address texts in visiting order.
    pub fn texts(&self) -> Vec<&str> {
        self.stops.iter().map(GeocodedStop::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Route, RouteSignature, RouteValidationError};
    use crate::model::address::{AddressCandidate, GeocodedStop, SourceKind};

    fn stop(text: &str) -> GeocodedStop {
        GeocodedStop::from_candidate(AddressCandidate::new(text, SourceKind::Manual))
    }

    #[test]
    fn signature_is_order_insensitive() {
        assert_eq!(
            RouteSignature::from_texts(["A", "B"]),
            RouteSignature::from_texts(["B", "A"])
        );
    }

    #[test]
    fn signature_is_content_sensitive() {
        assert_ne!(
            RouteSignature::from_texts(["A", "B"]),
            RouteSignature::from_texts(["A", "C"])
        );
    }

    #[test]
    fn signature_ignores_case_and_padding() {
        assert_eq!(
            RouteSignature::from_texts([" 100 Main St", "200 OAK AVE"]),
            RouteSignature::from_texts(["200 oak ave", "100 main st "])
        );
    }

    #[test]
    fn route_rejects_duplicates_and_empty() {
        let signature = RouteSignature::from_texts(["a"]);
        assert_eq!(
            Route::new(Vec::new(), signature.clone()).unwrap_err(),
            RouteValidationError::Empty
        );
        let error = Route::new(vec![stop("1 A St"), stop("1 a st ")], signature).unwrap_err();
        assert!(matches!(error, RouteValidationError::DuplicateStop(_)));
    }

    #[test]
    fn route_requires_start_first() {
        let start = GeocodedStop::from_candidate(AddressCandidate::start("100 Main St"));
        let signature = RouteSignature::from_texts(["x"]);
        let error = Route::new(vec![stop("200 Oak Ave"), start.clone()], signature.clone())
            .unwrap_err();
        assert_eq!(error, RouteValidationError::StartNotFirst);

        let route = Route::new(vec![start, stop("200 Oak Ave")], signature).unwrap();
        assert_eq!(route.start().map(|s| s.text()), Some("100 Main St"));
    }
}
