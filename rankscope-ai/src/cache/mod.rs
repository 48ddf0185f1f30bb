//! Content-addressed cache with TTL expiry and a pluggable backend
//!
//! Callers work with [`Cache`], a cheap-to-clone handle built once at
//! startup. The handle wraps every value in a `{value, expiresAt}` envelope
//! and enforces expiry itself, so a backend's native eviction is only a
//! courtesy. Every failure is logged and degrades to a miss or a no-op; the
//! cache can never fail an analysis.

mod file_store;
pub mod keys;
mod redis_store;

pub use file_store::FileStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use rankscope_common::time::{Clock, SystemClock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Backend failure
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Which backend a [`Cache`] handle is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    File,
    Redis,
}

impl fmt::Display for CacheBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackendKind::File => f.write_str("file"),
            CacheBackendKind::Redis => f.write_str("redis"),
        }
    }
}

/// Backend selection resolved from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackendConfig {
    File { dir: PathBuf },
    Redis { url: String },
}

/// Raw record storage
///
/// Stores see opaque payload strings; envelope handling and expiry live in
/// [`Cache`]. `write` receives the TTL so stores with native expiry can use it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn kind(&self) -> CacheBackendKind;

    async fn read(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn write(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    async fn remove_all(&self) -> Result<(), CacheError>;
}

/// Stored envelope
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    value: T,
    #[serde(rename = "expiresAt")]
    expires_at: i64,
}

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Shared cache handle
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Build the process-wide handle from the resolved backend choice
    ///
    /// An unusable Redis URL falls back to the file store in `fallback_dir`.
    pub fn from_config(backend: &CacheBackendConfig, fallback_dir: PathBuf) -> Self {
        let store: Arc<dyn CacheStore> = match backend {
            CacheBackendConfig::File { dir } => {
                info!(dir = %dir.display(), "Using file-based cache");
                Arc::new(FileStore::new(dir.clone()))
            }
            CacheBackendConfig::Redis { url } => match RedisStore::open(url) {
                Ok(store) => {
                    info!("Using Redis cache");
                    Arc::new(store)
                }
                Err(e) => {
                    warn!(error = %e, dir = %fallback_dir.display(), "Redis cache unavailable, falling back to file cache");
                    Arc::new(FileStore::new(fallback_dir))
                }
            },
        };
        Self::new(store, Arc::new(SystemClock))
    }

    pub fn kind(&self) -> CacheBackendKind {
        self.store.kind()
    }

    /// Clock used for expiry and date buckets
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Resolve a key to its value
    ///
    /// Expired entries are deleted eagerly and reported as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match self.store.read(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache get failed");
                return None;
            }
        };

        let entry: CacheEntry<Value> = match serde_json::from_str(&payload) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable cache entry");
                self.delete(key).await;
                return None;
            }
        };

        if self.clock.now_millis() > entry.expires_at {
            debug!(key, "Cache entry expired");
            self.delete(key).await;
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Cache entry has unexpected shape");
                None
            }
        }
    }

    /// Store a value for `ttl_hours`; a zero TTL stores nothing
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_hours: u64) {
        if ttl_hours == 0 {
            debug!(key, "Skipping cache write with zero TTL");
            return;
        }

        let ttl_millis = (ttl_hours as i64).saturating_mul(MILLIS_PER_HOUR);
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now_millis().saturating_add(ttl_millis),
        };

        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Cache value could not be encoded");
                return;
            }
        };

        let ttl = Duration::from_secs(ttl_hours.saturating_mul(3600));
        if let Err(e) = self.store.write(key, &payload, ttl).await {
            warn!(key, error = %e, "Cache set failed");
        }
    }

    /// True when the key resolves to a live entry
    pub async fn has(&self, key: &str) -> bool {
        self.get::<Value>(key).await.is_some()
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!(key, error = %e, "Cache delete failed");
        }
    }

    pub async fn clear(&self) {
        match self.store.remove_all().await {
            Ok(()) => info!(backend = %self.kind(), "Cache cleared"),
            Err(e) => warn!(error = %e, "Cache clear failed"),
        }
    }
}
