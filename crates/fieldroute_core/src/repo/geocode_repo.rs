//! Durable geocode cache contracts and implementations.
//!
//! # Responsibility
//! - Map normalized address keys to resolved coordinates across restarts.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - The store is append-only: the first stored value for a key wins.
//! - Read paths reject invalid persisted coordinates instead of masking them.
//! - Entries never expire.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::address::Coordinates;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type CacheResult<T> = Result<T, CacheError>;

/// Durable cache error.
#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    InvalidKey,
    InvalidData(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey => write!(f, "geocode cache key cannot be empty"),
            Self::InvalidData(message) => write!(f, "invalid cached geocode: {message}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-keyed durable store of resolved coordinates.
///
/// Keys are already-normalized address texts.
pub trait GeocodeCacheRepository {
    fn get(&self, key: &str) -> CacheResult<Option<Coordinates>>;
    /// Stores `coordinates` unless the key already exists.
    fn put(&self, key: &str, coordinates: Coordinates) -> CacheResult<()>;
    fn len(&self) -> CacheResult<usize>;

    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// SQLite-backed durable geocode cache.
pub struct SqliteGeocodeCache {
    conn: Connection,
}

impl SqliteGeocodeCache {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) the cache file at `path`.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn in_memory() -> CacheResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl GeocodeCacheRepository for SqliteGeocodeCache {
    fn get(&self, key: &str) -> CacheResult<Option<Coordinates>> {
        let row = self
            .conn
            .query_row(
                "SELECT lat, lng FROM geocode_cache WHERE address_key = ?1;",
                [key],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
            )
            .optional()?;

        match row {
            Some((lat, lng)) => {
                let coordinates = Coordinates::new(lat, lng);
                if !coordinates.is_valid() {
                    return Err(CacheError::InvalidData(format!(
                        "out of range coordinates ({lat}, {lng}) in geocode_cache"
                    )));
                }
                Ok(Some(coordinates))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, coordinates: Coordinates) -> CacheResult<()> {
        validate_entry(key, coordinates)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO geocode_cache (address_key, lat, lng) VALUES (?1, ?2, ?3);",
            params![key, coordinates.lat, coordinates.lng],
        )?;
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM geocode_cache;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| CacheError::InvalidData(format!("negative row count {count}")))
    }
}

/// Process-local implementation of the durable cache contract.
#[derive(Debug, Default)]
pub struct MemoryGeocodeCache {
    entries: RefCell<HashMap<String, Coordinates>>,
}

impl MemoryGeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeocodeCacheRepository for MemoryGeocodeCache {
    fn get(&self, key: &str) -> CacheResult<Option<Coordinates>> {
        Ok(self.entries.borrow().get(key).copied())
    }

    fn put(&self, key: &str, coordinates: Coordinates) -> CacheResult<()> {
        validate_entry(key, coordinates)?;
        self.entries
            .borrow_mut()
            .entry(key.to_string())
            .or_insert(coordinates);
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.entries.borrow().len())
    }
}

fn validate_entry(key: &str, coordinates: Coordinates) -> CacheResult<()> {
    if key.trim().is_empty() {
        return Err(CacheError::InvalidKey);
    }
    if !coordinates.is_valid() {
        return Err(CacheError::InvalidData(format!(
            "refusing to store out of range coordinates ({}, {})",
            coordinates.lat, coordinates.lng
        )));
    }
    Ok(())
}
