//! Domain records flowing through the route pipeline.
//!
//! # Responsibility
//! - Define address candidates, geocoded stops and routes.
//! - Own address normalization and route signature derivation.
//!
//! # Invariants
//! - Address identity is the trimmed, lower-cased address text.
//! - A `Route` never holds two stops with the same identity.

pub mod address;
pub mod route;
