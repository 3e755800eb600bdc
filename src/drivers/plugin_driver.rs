//! C4 — Plugin Search Driver.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::cache::{key, TwoLevelCache};
use crate::domain::SearchResult;
use crate::error::Result;
use crate::pool;
use crate::sources::{PluginRegistry, SearchPlugin};

pub struct PluginSearchDriver {
    cache: Arc<dyn TwoLevelCache>,
    registry: Arc<dyn PluginRegistry>,
    cache_enabled: bool,
    cache_ttl: Duration,
    batch_timeout: Duration,
}

impl PluginSearchDriver {
    pub fn new(
        cache: Arc<dyn TwoLevelCache>,
        registry: Arc<dyn PluginRegistry>,
        cache_enabled: bool,
        cache_ttl: Duration,
        batch_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            registry,
            cache_enabled,
            cache_ttl,
            batch_timeout,
        }
    }

    /// Contract: `search_plugins(keyword, plugins, force_refresh,
    /// concurrency, ext)`.
    pub async fn search(
        &self,
        keyword: &str,
        plugins: Option<&[String]>,
        force_refresh: bool,
        concurrency: usize,
        ext: &Map<String, Value>,
    ) -> Result<Vec<SearchResult>> {
        let cache_key = key::plugin_key(keyword, plugins);

        if self.cache_enabled && !force_refresh {
            // Persistent-tier-preferring read per spec §4.4 step 2 / §9: an
            // out-of-band refresher writing straight to L2 must be observed
            // here, not masked by a stale L1 entry.
            if let Some(bytes) = self.cache.get_persistent_first(&cache_key).await.unwrap_or_else(|err| {
                log::warn!("plugin cache read failed for {cache_key}: {err}");
                None
            }) {
                match crate::cache::deserialize::<Vec<SearchResult>>(&bytes) {
                    Ok(cached) => return Ok(cached),
                    Err(err) => log::warn!("plugin cache entry for {cache_key} was corrupt: {err}"),
                }
            }
        }

        let resolved = self.resolve_plugins(plugins);
        if resolved.is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<_> = resolved
            .into_iter()
            .map(|plugin| {
                let keyword = keyword.to_string();
                let ext = ext.clone();
                async move {
                    match plugin.search(&keyword, &ext).await {
                        Ok(results) => Some(results),
                        Err(err) => {
                            log::warn!("plugin '{}' search failed: {err}", plugin.name());
                            None
                        }
                    }
                }
            })
            .collect();

        let outcomes = pool::execute_batch_with_timeout(tasks, concurrency, self.batch_timeout).await;
        let results: Vec<SearchResult> = outcomes.into_iter().flatten().flatten().collect();

        if self.cache_enabled {
            self.spawn_background_write(cache_key, results.clone());
        }

        Ok(results)
    }

    /// §4.4 rule 3: `None` means "all registered"; otherwise filter the
    /// registry to lowercased-name matches, preserving registry order.
    fn resolve_plugins(&self, requested: Option<&[String]>) -> Vec<Arc<dyn SearchPlugin>> {
        let all = self.registry.plugins();
        match requested {
            None => all,
            Some(names) => {
                let wanted: std::collections::HashSet<&str> =
                    names.iter().map(String::as_str).collect();
                all.into_iter()
                    .filter(|plugin| wanted.contains(plugin.name().to_lowercase().as_str()))
                    .collect()
            }
        }
    }

    fn spawn_background_write(&self, cache_key: String, results: Vec<SearchResult>) {
        let cache = Arc::clone(&self.cache);
        let ttl = self.cache_ttl;
        tokio::spawn(async move {
            let bytes = match crate::cache::serialize(&results) {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("failed to serialize plugin cache entry for {cache_key}: {err}");
                    return;
                }
            };
            if let Err(err) = cache.set(&cache_key, bytes, ttl).await {
                log::warn!("failed to write plugin cache entry for {cache_key}: {err}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{L1Config, TieredCache};
    use crate::domain::SearchResult;
    use crate::sources::InMemoryPluginRegistry;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    struct StubPlugin {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl SearchPlugin for StubPlugin {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, keyword: &str, _ext: &Map<String, Value>) -> Result<Vec<SearchResult>> {
            if self.fail {
                return Err(crate::error::SearchError::Task("boom".to_string()));
            }
            Ok(vec![SearchResult {
                unique_id: format!("{}-1", self.name),
                title: format!("{keyword} via {}", self.name),
                datetime: None,
                links: vec![],
                source_tag: self.name.to_string(),
                extra: serde_json::Map::new(),
            }])
        }
    }

    async fn cache() -> (Arc<dyn TwoLevelCache>, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = TieredCache::new_enhanced(dir.path().join("c.db"), L1Config::default())
            .await
            .unwrap();
        (Arc::new(cache), dir)
    }

    #[tokio::test]
    async fn plugin_failure_is_isolated() {
        let (cache, _dir) = cache().await;
        let registry: Arc<dyn PluginRegistry> = Arc::new(InMemoryPluginRegistry::new(vec![
            Arc::new(StubPlugin { name: "p1", fail: false }),
            Arc::new(StubPlugin { name: "p2", fail: true }),
        ]));
        let driver = PluginSearchDriver::new(cache, registry, true, Duration::from_secs(60), Duration::from_secs(1));

        let results = driver
            .search("foo", None, false, 10, &Map::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_tag, "p1");
    }

    #[tokio::test]
    async fn empty_plugins_hits_preseeded_cache_without_invoking_any_plugin() {
        let (cache, _dir) = cache().await;
        let registry: Arc<dyn PluginRegistry> = Arc::new(InMemoryPluginRegistry::new(vec![]));

        let preseeded = vec![SearchResult {
            unique_id: "a".to_string(),
            title: "foo bar".to_string(),
            datetime: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            links: vec![crate::domain::Link {
                url: "u".to_string(),
                storage_type: "baidu".into(),
                password: None,
            }],
            source_tag: "cached".to_string(),
            extra: serde_json::Map::new(),
        }];
        let cache_key = key::plugin_key("foo", None);
        let bytes = crate::cache::serialize(&preseeded).unwrap();
        cache.set(&cache_key, bytes, Duration::from_secs(60)).await.unwrap();

        let driver = PluginSearchDriver::new(cache, registry, true, Duration::from_secs(60), Duration::from_secs(1));
        let results = driver
            .search("foo", None, false, 10, &Map::new())
            .await
            .unwrap();
        assert_eq!(results, preseeded);
    }
}
