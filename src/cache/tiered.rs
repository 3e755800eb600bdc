//! A2 — Two-Level Cache.
//!
//! Hot in-process LRU tier backed by the SQLite-backed persistent tier from
//! `storage.rs` (L1 `lru::LruCache` promoted from an L2 SQLite store).
//!
//! - [`TieredCache::get`] is hot-tier-preferring (the normal, fast path used
//!   by the channel driver); [`TieredCache::get_persistent_first`] instead
//!   checks the persistent tier first, so a plugin refreshed out-of-band by
//!   writing straight to L2 is observed on the very next plugin search.
//! - Construction is "enhanced, falling back to basic": the enhanced path
//!   adds the in-memory LRU tier and transparent compression of L1 entries
//!   over the compression threshold; the basic path is the persistent tier
//!   alone. Callers go through [`TwoLevelCache`] and never branch on which
//!   succeeded.
//! - Every hot-tier entry carries the same `expires_at` as its L2
//!   counterpart (stamped from the caller's `ttl` on write, or copied over
//!   from L2 on promotion); a read past that point is treated as a miss.
//!   Entries live for their configured TTL (§3 Lifecycles), not until LRU
//!   capacity happens to evict them.

use std::io::{Read, Write};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use lru::LruCache;

use crate::cache::storage::SqliteStorage;
use crate::error::Result;

/// The two-level cache contract every driver talks to. One impl
/// ([`TieredCache`]) backs both the "enhanced" and "basic" construction
/// paths — the distinction is internal.
#[async_trait]
pub trait TwoLevelCache: Send + Sync {
    /// Hot-tier-preferring read: L1 first, falling back to L2 and promoting
    /// on an L2 hit. This is what C3 (the channel driver) uses.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Persistent-tier-preferring read: L2 first. Used by C4 (the plugin
    /// driver) so that out-of-band writers targeting L2 directly are
    /// observed without waiting for an L1 entry to expire.
    async fn get_persistent_first(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Best-effort write to both tiers.
    async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<()>;
}

/// Configuration for the hot (L1) tier.
#[derive(Debug, Clone)]
pub struct L1Config {
    pub max_entries: usize,
    /// Entries at or above this size (in bytes) are deflate-compressed
    /// before being stored in L1.
    pub compression_threshold: usize,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            compression_threshold: 1024,
        }
    }
}

struct L1Entry {
    data: Vec<u8>,
    compressed: bool,
    expires_at: DateTime<Utc>,
}

impl L1Entry {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

pub struct TieredCache {
    l1: Option<Mutex<LruCache<String, L1Entry>>>,
    l2: Arc<SqliteStorage>,
    config: L1Config,
}

impl TieredCache {
    /// The "enhanced" constructor: hot LRU tier plus the persistent tier.
    /// Preferred at construction time.
    pub async fn new_enhanced<P: AsRef<std::path::Path>>(db_path: P, config: L1Config) -> Result<Self> {
        let l2 = SqliteStorage::open(db_path).await?;
        let capacity = NonZeroUsize::new(config.max_entries.max(1)).unwrap();
        Ok(Self {
            l1: Some(Mutex::new(LruCache::new(capacity))),
            l2: Arc::new(l2),
            config,
        })
    }

    /// The "basic" constructor: persistent tier only. Used when enhanced
    /// construction fails (e.g. the hot tier cannot be allocated).
    pub async fn new_basic<P: AsRef<std::path::Path>>(db_path: P) -> Result<Self> {
        let l2 = SqliteStorage::open(db_path).await?;
        Ok(Self {
            l1: None,
            l2: Arc::new(l2),
            config: L1Config::default(),
        })
    }

    /// `None` both when there's no hot tier and when the entry is absent or
    /// expired. An expired entry is evicted eagerly rather than left for the
    /// LRU to reclaim later.
    fn get_from_l1(&self, key: &str) -> Option<Vec<u8>> {
        let l1 = self.l1.as_ref()?;
        let mut cache = l1.lock().unwrap();

        if cache.peek(key).map(L1Entry::is_expired).unwrap_or(false) {
            cache.pop(key);
            return None;
        }

        let entry = cache.get(key)?;
        Some(if entry.compressed {
            decompress(&entry.data)
        } else {
            entry.data.clone()
        })
    }

    /// `expires_at` should be the same wall-clock deadline the entry carries
    /// in L2, so a promoted or freshly-written L1 entry never outlives its
    /// own TTL (spec §3 Lifecycles).
    fn put_in_l1(&self, key: &str, data: &[u8], expires_at: DateTime<Utc>) {
        let Some(l1) = self.l1.as_ref() else { return };
        let (stored, compressed) = if data.len() >= self.config.compression_threshold {
            (compress(data), true)
        } else {
            (data.to_vec(), false)
        };
        l1.lock().unwrap().put(
            key.to_string(),
            L1Entry {
                data: stored,
                compressed,
                expires_at,
            },
        );
    }
}

#[async_trait]
impl TwoLevelCache for TieredCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(hit) = self.get_from_l1(key) {
            return Ok(Some(hit));
        }
        match self.l2.get_with_expiry(key).await? {
            Some((data, expires_at)) => {
                self.put_in_l1(key, &data, expires_at);
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    async fn get_persistent_first(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.l2.get_with_expiry(key).await? {
            Some((data, expires_at)) => {
                self.put_in_l1(key, &data, expires_at);
                Ok(Some(data))
            }
            None => Ok(self.get_from_l1(key)),
        }
    }

    async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<()> {
        let expires_at = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        self.put_in_l1(key, &bytes, expires_at);
        self.l2.set(key, bytes, ttl).await
    }
}

fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
    // Writes to an in-memory Vec never fail.
    encoder.write_all(data).expect("in-memory compression cannot fail");
    encoder.finish().expect("in-memory compression cannot fail")
}

fn decompress(data: &[u8]) -> Vec<u8> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    // A corrupt L1 entry would be a bug in this module, not caller input.
    decoder
        .read_to_end(&mut out)
        .expect("L1 entries are only ever written by compress()");
    out
}
