//! Persistence layer for resolved geocodes.
//!
//! # Responsibility
//! - Define the durable key-value contract used by the geocode resolver.
//! - Isolate SQLite query details from service orchestration.

pub mod geocode_repo;
