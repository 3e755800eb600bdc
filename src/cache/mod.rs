//! Two-level cache: hot in-process tier backed by a persistent SQLite tier.
//!
//! See `tiered.rs` for the implementation and `key.rs` for the per-family
//! key derivation (C1). This module owns the "prefer enhanced, fall back to
//! basic" construction dance from spec §6/§9 and the serializer both
//! drivers use to turn `Vec<SearchResult>` into cache bytes and back.

pub mod key;
pub mod storage;
pub mod tiered;

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use tiered::{L1Config, TieredCache, TwoLevelCache};

use crate::error::Result;

/// Guards whether construction has already succeeded once. Per spec §5: "a
/// boolean `cache_initialized` flag is set at most once; construction may
/// retry initialization but never downgrades a successful init." A
/// successful `Arc<dyn TwoLevelCache>` is cached here so a later retry of
/// `build_cache` is a no-op once one attempt has already succeeded.
static CACHE_HANDLE: OnceCell<Arc<dyn TwoLevelCache>> = OnceCell::new();

/// Build (or return the already-built) process-wide cache handle, preferring
/// the enhanced (LRU + compression) constructor and falling back to the
/// basic (persistent-tier-only) constructor if that fails.
pub async fn build_cache(db_path: impl AsRef<Path>, l1: L1Config) -> Result<Arc<dyn TwoLevelCache>> {
    if let Some(existing) = CACHE_HANDLE.get() {
        return Ok(Arc::clone(existing));
    }

    let handle: Arc<dyn TwoLevelCache> = match TieredCache::new_enhanced(&db_path, l1).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            log::warn!("enhanced cache construction failed ({err}), falling back to basic cache");
            Arc::new(TieredCache::new_basic(&db_path).await?)
        }
    };

    // If another task raced us and already installed a handle, keep that
    // one; never downgrade a successful init.
    match CACHE_HANDLE.set(Arc::clone(&handle)) {
        Ok(()) => Ok(handle),
        Err(_) => Ok(Arc::clone(
            CACHE_HANDLE.get().expect("set just failed, so a value is present"),
        )),
    }
}

/// Serialize a value the way cache entries are stored on the wire.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a cache entry. Corruption is the caller's problem to treat as
/// a miss (spec §7: "SerializationError on read: treated as a miss").
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SearchResult;

    #[test]
    fn serialize_then_deserialize_round_trips() {
        let result = SearchResult {
            unique_id: "a".to_string(),
            title: "foo bar".to_string(),
            datetime: None,
            links: vec![],
            source_tag: "chan".to_string(),
            extra: serde_json::Map::new(),
        };
        let bytes = serialize(&vec![result.clone()]).unwrap();
        let decoded: Vec<SearchResult> = deserialize(&bytes).unwrap();
        assert_eq!(decoded, vec![result]);
    }
}
