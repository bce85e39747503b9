use fieldroute_core::{
    CacheError, Coordinates, GeocodeCacheRepository, MemoryGeocodeCache, SqliteGeocodeCache,
};

#[test]
fn sqlite_cache_put_and_get() {
    let cache = SqliteGeocodeCache::in_memory().unwrap();
    assert!(cache.is_empty().unwrap());

    cache
        .put("100 main st", Coordinates::new(40.0, -75.0))
        .unwrap();

    assert_eq!(
        cache.get("100 main st").unwrap(),
        Some(Coordinates::new(40.0, -75.0))
    );
    assert_eq!(cache.get("200 oak ave").unwrap(), None);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn sqlite_cache_is_append_only() {
    let cache = SqliteGeocodeCache::in_memory().unwrap();
    cache.put("100 main st", Coordinates::new(1.0, 1.0)).unwrap();
    cache.put("100 main st", Coordinates::new(2.0, 2.0)).unwrap();

    assert_eq!(
        cache.get("100 main st").unwrap(),
        Some(Coordinates::new(1.0, 1.0))
    );
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn sqlite_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geocode.sqlite3");

    {
        let cache = SqliteGeocodeCache::open(&path).unwrap();
        cache.put("300 elm st", Coordinates::new(3.0, 4.0)).unwrap();
    }

    let reopened = SqliteGeocodeCache::open(&path).unwrap();
    assert_eq!(
        reopened.get("300 elm st").unwrap(),
        Some(Coordinates::new(3.0, 4.0))
    );
}

#[test]
fn sqlite_cache_rejects_invalid_entries() {
    let cache = SqliteGeocodeCache::in_memory().unwrap();
    assert!(matches!(
        cache.put("  ", Coordinates::new(1.0, 1.0)).unwrap_err(),
        CacheError::InvalidKey
    ));
    assert!(matches!(
        cache.put("bad", Coordinates::new(95.0, 1.0)).unwrap_err(),
        CacheError::InvalidData(_)
    ));
}

#[test]
fn sqlite_cache_reports_corrupt_rows() {
    let cache = SqliteGeocodeCache::in_memory().unwrap();
    cache
        .connection()
        .execute(
            "INSERT INTO geocode_cache (address_key, lat, lng) VALUES ('broken', 500.0, 0.0);",
            [],
        )
        .unwrap();

    assert!(matches!(
        cache.get("broken").unwrap_err(),
        CacheError::InvalidData(_)
    ));
}

#[test]
fn memory_cache_keeps_first_value() {
    let cache = MemoryGeocodeCache::new();
    cache.put("a st 1", Coordinates::new(1.0, 1.0)).unwrap();
    cache.put("a st 1", Coordinates::new(9.0, 9.0)).unwrap();

    assert_eq!(cache.get("a st 1").unwrap(), Some(Coordinates::new(1.0, 1.0)));
    assert_eq!(cache.len().unwrap(), 1);
}
