//! Cache handle over the file store, with a manually driven clock

use rankscope_ai::cache::{Cache, CacheBackendConfig, CacheBackendKind, FileStore};
use rankscope_common::hash::content_hash;
use rankscope_common::time::ManualClock;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn file_cache() -> (Cache, Arc<ManualClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = Cache::new(Arc::new(FileStore::new(dir.path())), clock.clone());
    (cache, clock, dir)
}

#[tokio::test]
async fn test_set_then_get_round_trips() {
    let (cache, _clock, _dir) = file_cache();
    let value = json!({"title": "Best shoes", "wordCount": 1200});

    cache.set("page:abc:2024-01-01", &value, 24).await;

    assert_eq!(cache.get::<Value>("page:abc:2024-01-01").await, Some(value));
    assert!(cache.has("page:abc:2024-01-01").await);
}

#[tokio::test]
async fn test_repeated_gets_agree() {
    let (cache, clock, _dir) = file_cache();
    cache.set("k", &vec![1, 2, 3], 1).await;

    let first: Option<Vec<u32>> = cache.get("k").await;
    clock.advance_millis(1_000);
    let second: Option<Vec<u32>> = cache.get("k").await;

    assert_eq!(first, Some(vec![1, 2, 3]));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_entry_is_absent_and_removed() {
    // Given: an entry with a one-hour TTL
    let (cache, clock, dir) = file_cache();
    cache.set("serp:shoes", &"cached", 1).await;
    let record = dir.path().join(format!("{}.json", content_hash("serp:shoes")));
    assert!(record.exists());

    // When: the clock passes expiresAt
    clock.advance_hours(1);
    assert_eq!(cache.get::<String>("serp:shoes").await.as_deref(), Some("cached"));
    clock.advance_millis(1);

    // Then: absent, and the record is deleted eagerly
    assert_eq!(cache.get::<String>("serp:shoes").await, None);
    assert!(!record.exists());
}

#[tokio::test]
async fn test_record_is_enveloped() {
    let (cache, _clock, dir) = file_cache();
    cache.set("k", &json!({"a": 1}), 2).await;

    let path = dir.path().join(format!("{}.json", content_hash("k")));
    let stored: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(stored["value"], json!({"a": 1}));
    assert_eq!(stored["expiresAt"], 1_700_000_000_000i64 + 2 * 3_600_000);
}

#[tokio::test]
async fn test_delete_and_clear() {
    let (cache, _clock, dir) = file_cache();
    cache.set("a", &1, 1).await;
    cache.set("b", &2, 1).await;
    cache.set("c", &3, 1).await;

    cache.delete("a").await;
    assert!(!cache.has("a").await);
    assert!(cache.has("b").await);

    cache.clear().await;
    assert!(!cache.has("b").await);
    assert!(!cache.has("c").await);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_corrupt_record_is_a_miss() {
    let (cache, _clock, dir) = file_cache();
    let path = dir.path().join(format!("{}.json", content_hash("bad")));
    std::fs::write(&path, "not an envelope").unwrap();

    assert_eq!(cache.get::<Value>("bad").await, None);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_missing_directory_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = Cache::new(
        Arc::new(FileStore::new(dir.path().join("not-yet-created"))),
        Arc::new(ManualClock::new(0)),
    );

    assert_eq!(cache.get::<Value>("anything").await, None);
    cache.clear().await;

    // First write creates the directory
    cache.set("anything", &true, 1).await;
    assert_eq!(cache.get::<bool>("anything").await, Some(true));
}

#[tokio::test]
async fn test_malformed_redis_url_falls_back_to_file() {
    let dir = TempDir::new().unwrap();
    let cache = Cache::from_config(
        &CacheBackendConfig::Redis {
            url: "not a redis url".to_string(),
        },
        dir.path().to_path_buf(),
    );

    assert_eq!(cache.kind(), CacheBackendKind::File);
}
