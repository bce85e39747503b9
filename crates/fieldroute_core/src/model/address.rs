//! Address candidate and geocoded stop model.
//!
//! # Responsibility
//! - Represent user/file supplied addresses before and after geocoding.
//! - Provide the canonical normalization used for dedup and cache keys.
//!
//! # Invariants
//! - `normalize_address` is the only identity function for address text.
//! - Coordinates are only considered usable when finite and in WGS84 range.

use serde::{Deserialize, Serialize};

/// Origin of an address candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Typed into the start/destination fields.
    Manual,
    /// Chosen by drawing a shape over address markers.
    ShapeSelection,
    /// Taken from a bulk imported address file.
    FileImport,
}

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns whether both values are finite and inside latitude/longitude range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Candidate stop produced by the address collector.
///
/// Immutable once a collection pass produced it; geocoding always works on
/// `GeocodedStop` copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressCandidate {
    /// Raw address text as entered or imported.
    pub text: String,
    pub is_start: bool,
    pub source_kind: SourceKind,
    pub display_name: Option<String>,
    /// Coordinates already known by the source (file import rows may carry them).
    pub coordinates: Option<Coordinates>,
    /// Opaque per-record payload carried through for external consumers.
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl AddressCandidate {
    pub fn new(text: impl Into<String>, source_kind: SourceKind) -> Self {
        Self {
            text: text.into(),
            is_start: false,
            source_kind,
            display_name: None,
            coordinates: None,
            meta: serde_json::Value::Null,
        }
    }

    /// Creates the manual start candidate.
    pub fn start(text: impl Into<String>) -> Self {
        Self {
            is_start: true,
            ..Self::new(text, SourceKind::Manual)
        }
    }

    /// Identity key used for dedup, signatures and cache lookups.
    pub fn key(&self) -> String {
        normalize_address(&self.text)
    }

    /// Label shown on map markers and in listings.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.text.as_str())
    }
}

/// Address candidate plus resolved coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedStop {
    pub candidate: AddressCandidate,
    /// `None` until resolved, and after a failed resolution.
    pub coordinates: Option<Coordinates>,
}

impl GeocodedStop {
    /// Creates a fresh stop, seeded with valid coordinates the source already had.
    pub fn from_candidate(candidate: AddressCandidate) -> Self {
        let coordinates = candidate.coordinates.filter(Coordinates::is_valid);
        Self {
            candidate,
            coordinates,
        }
    }

    pub fn text(&self) -> &str {
        self.candidate.text.as_str()
    }

    pub fn key(&self) -> String {
        self.candidate.key()
    }

    pub fn is_start(&self) -> bool {
        self.candidate.is_start
    }

    /// Returns coordinates only when they are usable for routing/rendering.
    pub fn valid_coordinates(&self) -> Option<Coordinates> {
        self.coordinates.filter(Coordinates::is_valid)
    }

    pub fn is_geocoded(&self) -> bool {
        self.valid_coordinates().is_some()
    }
}

/// Normalizes address text into its identity key.
pub fn normalize_address(text: &str) -> String {
    text.trim().to_lowercase()
}
