//! C3 — Channel Search Driver.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{key, TwoLevelCache};
use crate::domain::SearchResult;
use crate::error::Result;
use crate::pool;
use crate::sources::ChannelScraper;

pub struct ChannelSearchDriver {
    cache: Arc<dyn TwoLevelCache>,
    scraper: Arc<dyn ChannelScraper>,
    cache_enabled: bool,
    cache_ttl: Duration,
    batch_timeout: Duration,
}

impl ChannelSearchDriver {
    pub fn new(
        cache: Arc<dyn TwoLevelCache>,
        scraper: Arc<dyn ChannelScraper>,
        cache_enabled: bool,
        cache_ttl: Duration,
        batch_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            scraper,
            cache_enabled,
            cache_ttl,
            batch_timeout,
        }
    }

    /// Contract: `search_tg(keyword, channels, force_refresh)`. Errors
    /// returned here are driver-level (cache machinery) and propagate to the
    /// caller per spec §7; per-channel failures never reach this far.
    pub async fn search(
        &self,
        keyword: &str,
        channels: &[String],
        force_refresh: bool,
    ) -> Result<Vec<SearchResult>> {
        let cache_key = key::tg_key(keyword, channels);

        if self.cache_enabled && !force_refresh {
            if let Some(bytes) = self.cache.get(&cache_key).await.unwrap_or_else(|err| {
                log::warn!("tg cache read failed for {cache_key}: {err}");
                None
            }) {
                match crate::cache::deserialize::<Vec<SearchResult>>(&bytes) {
                    Ok(cached) => return Ok(cached),
                    Err(err) => log::warn!("tg cache entry for {cache_key} was corrupt: {err}"),
                }
            }
        }

        if channels.is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<_> = channels
            .iter()
            .map(|channel| {
                let scraper = Arc::clone(&self.scraper);
                let keyword = keyword.to_string();
                let channel = channel.clone();
                async move {
                    match scraper.search(&keyword, &channel).await {
                        Ok(results) => Some(results),
                        Err(err) => {
                            log::warn!("channel '{channel}' search failed: {err}");
                            None
                        }
                    }
                }
            })
            .collect();

        let outcomes = pool::execute_batch_with_timeout(tasks, channels.len(), self.batch_timeout).await;

        // `outcomes` is `Vec<Option<Vec<SearchResult>>>`: `None` marks a
        // task that timed out or whose scraper call failed. Two
        // `flatten()`s peel through the `Option` and then each channel's
        // `Vec` to give a flat stream of results.
        let results: Vec<SearchResult> = outcomes.into_iter().flatten().flatten().collect();

        if self.cache_enabled {
            self.spawn_background_write(cache_key, results.clone());
        }

        Ok(results)
    }

    /// Fire-and-forget cache write per spec §4.3 step 5 / §5: never awaited
    /// in the request path, failures are logged and dropped.
    fn spawn_background_write(&self, cache_key: String, results: Vec<SearchResult>) {
        let cache = Arc::clone(&self.cache);
        let ttl = self.cache_ttl;
        tokio::spawn(async move {
            let bytes = match crate::cache::serialize(&results) {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("failed to serialize tg cache entry for {cache_key}: {err}");
                    return;
                }
            };
            if let Err(err) = cache.set(&cache_key, bytes, ttl).await {
                log::warn!("failed to write tg cache entry for {cache_key}: {err}");
            }
        });
    }
}
