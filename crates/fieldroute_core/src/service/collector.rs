//! Candidate stop collection from manual fields, shape selection and file import.
//!
//! # Responsibility
//! - Pick exactly one destination source by precedence.
//! - Deduplicate by address identity and validate each candidate.
//!
//! # Invariants
//! - Manual destinations win over shape selection whenever any manual field
//!   is non-empty; imported rows are used only on explicit request.
//! - Dedup keeps the first-seen candidate and preserves order.
//! - Problems are reported as warnings; the caller decides what blocks.

use crate::config::CollectorConfig;
use crate::model::address::{normalize_address, AddressCandidate, Coordinates, SourceKind};
use crate::model::route::RouteSignature;
use once_cell::sync::Lazy;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

static HAS_ALPHANUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]").expect("valid alphanumeric regex"));

/// Address row supplied by the shape tool or the file importer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl AddressRecord {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: None,
            coordinates: None,
            meta: serde_json::Value::Null,
        }
    }

    fn to_candidate(&self, source_kind: SourceKind) -> AddressCandidate {
        AddressCandidate {
            text: self.address.clone(),
            is_start: false,
            source_kind,
            display_name: self.display_name.clone(),
            coordinates: self.coordinates,
            meta: self.meta.clone(),
        }
    }
}

/// Current values of every collaborator the collector reads.
#[derive(Debug, Clone, Default)]
pub struct CollectorInputs {
    /// Manual start field.
    pub start: String,
    /// Manual destination fields; blank entries are ignored.
    pub destinations: Vec<String>,
    /// Addresses currently selected with the shape tool.
    pub shape_selection: Vec<AddressRecord>,
    /// Rows from the bulk file import.
    pub imported: Vec<AddressRecord>,
    /// Explicit user request to route every imported row.
    pub route_all_imported: bool,
}

/// Destination source chosen for one collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationSource {
    Manual,
    ShapeSelection,
    FileImport,
    None,
}

/// Non-fatal collection findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectWarning {
    DuplicateDropped { text: String },
    InvalidAddress { text: String, reason: String },
    NoValidCandidates,
    NoWaypoints,
    NoStartAddress,
}

impl Display for CollectWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateDropped { text } => write!(f, "duplicate address dropped: {text}"),
            Self::InvalidAddress { text, reason } => {
                write!(f, "invalid address `{text}`: {reason}")
            }
            Self::NoValidCandidates => write!(f, "no valid addresses to route"),
            Self::NoWaypoints => write!(f, "only one address; add destinations to build a route"),
            Self::NoStartAddress => write!(f, "no start address; the first stop is used as start"),
        }
    }
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub stops: Vec<AddressCandidate>,
    pub warnings: Vec<CollectWarning>,
    pub source: DestinationSource,
}

impl Collection {
    pub fn signature(&self) -> RouteSignature {
        RouteSignature::from_candidates(&self.stops)
    }

    pub fn has_warning(&self, warning: &CollectWarning) -> bool {
        self.warnings.contains(warning)
    }

    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Builds candidate stop lists from collaborator inputs.
#[derive(Debug, Clone, Default)]
pub struct AddressCollector {
    config: CollectorConfig,
}

impl AddressCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn collect(&self, inputs: &CollectorInputs) -> Collection {
        let mut raw = Vec::new();
        let mut warnings = Vec::new();

        let has_start = !inputs.start.trim().is_empty();
        if has_start {
            raw.push(AddressCandidate::start(inputs.start.trim()));
        }

        let source = choose_source(inputs);
        match source {
            DestinationSource::Manual => raw.extend(
                inputs
                    .destinations
                    .iter()
                    .filter(|text| !text.trim().is_empty())
                    .map(|text| AddressCandidate::new(text.trim(), SourceKind::Manual)),
            ),
            DestinationSource::ShapeSelection => raw.extend(
                inputs
                    .shape_selection
                    .iter()
                    .map(|record| record.to_candidate(SourceKind::ShapeSelection)),
            ),
            DestinationSource::FileImport => raw.extend(
                inputs
                    .imported
                    .iter()
                    .map(|record| record.to_candidate(SourceKind::FileImport)),
            ),
            DestinationSource::None => {}
        }

        let mut seen = HashSet::new();
        let mut stops = Vec::new();
        for candidate in raw {
            if !seen.insert(normalize_address(&candidate.text)) {
                warnings.push(CollectWarning::DuplicateDropped {
                    text: candidate.text,
                });
                continue;
            }
            match self.validate(&candidate) {
                Ok(()) => stops.push(candidate),
                Err(reason) => warnings.push(CollectWarning::InvalidAddress {
                    text: candidate.text,
                    reason,
                }),
            }
        }

        match stops.len() {
            0 => warnings.push(CollectWarning::NoValidCandidates),
            1 => warnings.push(CollectWarning::NoWaypoints),
            _ => {}
        }
        if !stops.iter().any(|candidate| candidate.is_start) {
            warnings.push(CollectWarning::NoStartAddress);
        }

        debug!(
            "event=collect module=collector status=ok source={source:?} stops={} warnings={}",
            stops.len(),
            warnings.len()
        );

        Collection {
            stops,
            warnings,
            source,
        }
    }

    fn validate(&self, candidate: &AddressCandidate) -> Result<(), String> {
        let text = candidate.text.trim();
        if text.is_empty() {
            return Err("address is empty".to_string());
        }
        if text.chars().count() < self.config.min_address_len {
            return Err(format!(
                "address shorter than {} characters",
                self.config.min_address_len
            ));
        }
        if !HAS_ALPHANUMERIC_RE.is_match(text) {
            return Err("address has no letters or digits".to_string());
        }
        if let Some(coordinates) = candidate.coordinates {
            if !coordinates.is_valid() {
                return Err(format!(
                    "coordinates ({}, {}) out of range",
                    coordinates.lat, coordinates.lng
                ));
            }
        }
        Ok(())
    }
}

fn choose_source(inputs: &CollectorInputs) -> DestinationSource {
    // Any non-blank manual field wins, even a single character.
    if inputs
        .destinations
        .iter()
        .any(|text| !text.trim().is_empty())
    {
        DestinationSource::Manual
    } else if !inputs.shape_selection.is_empty() {
        DestinationSource::ShapeSelection
    } else if inputs.route_all_imported && !inputs.imported.is_empty() {
        DestinationSource::FileImport
    } else {
        DestinationSource::None
    }
}
