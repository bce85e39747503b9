//! Route pipeline services.
//!
//! # Responsibility
//! - Turn collected addresses into a geocoded, ordered, displayed route.
//! - Keep UI/host layers decoupled from remote clients and storage.
//!
//! # Invariants
//! - Services receive their collaborators by constructor; no ambient globals.

pub mod collector;
pub mod geocode_service;
pub mod navigation;
pub mod optimizer;
pub mod orchestrator;
pub mod route_manager;
