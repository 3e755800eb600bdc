//! C9 — Orchestrator.
//!
//! Wires C2 → (C3 ‖ C4) → C5 → C6 → C7 → C8 behind a single
//! [`SearchAggregator::search`] entry point.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::SearchResponse;
use crate::drivers::{ChannelSearchDriver, PluginSearchDriver};
use crate::error::{Result, SearchError};
use crate::merge;
use crate::normalize;
use crate::rank::{self, SubstringMatcher};
use crate::request::SearchRequest;
use crate::response;
use crate::sources::PluginRegistry;

pub struct SearchAggregator {
    channel_driver: Arc<ChannelSearchDriver>,
    plugin_driver: Arc<PluginSearchDriver>,
    registry: Arc<dyn PluginRegistry>,
}

impl SearchAggregator {
    pub fn new(
        channel_driver: Arc<ChannelSearchDriver>,
        plugin_driver: Arc<PluginSearchDriver>,
        registry: Arc<dyn PluginRegistry>,
    ) -> Self {
        Self {
            channel_driver,
            plugin_driver,
            registry,
        }
    }

    /// The single upstream entry point (§6): normalize, fan out to whichever
    /// source families `source_type` enables, merge, rank, group, and
    /// assemble a response. If `request.deadline` is set and elapses before
    /// both drivers finish, both are aborted and `Err` is returned with the
    /// partial results discarded (§5 Cancellation).
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let registry_names: HashSet<String> = self
            .registry
            .plugins()
            .iter()
            .map(|plugin| plugin.name().to_lowercase())
            .collect();
        let params = normalize::normalize(&request, &registry_names);

        let wants_channels = params.source_type.wants_channels();
        let wants_plugins = params.source_type.wants_plugins();

        // Sibling tasks per §5: the two families run in parallel on their
        // own spawned tokio tasks rather than being polled concurrently
        // in-place, so a slow or panicking driver on one side can't stall
        // the other.
        let channel_task = {
            let driver = Arc::clone(&self.channel_driver);
            let keyword = params.keyword.clone();
            let channels = params.channels.clone();
            let force_refresh = params.force_refresh;
            tokio::spawn(async move {
                if wants_channels {
                    driver.search(&keyword, &channels, force_refresh).await
                } else {
                    Ok(Vec::new())
                }
            })
        };

        let plugin_task = {
            let driver = Arc::clone(&self.plugin_driver);
            let keyword = params.keyword.clone();
            let plugins = params.plugins.clone();
            let force_refresh = params.force_refresh;
            let concurrency = params.concurrency;
            let ext = params.ext.clone();
            tokio::spawn(async move {
                if wants_plugins {
                    driver
                        .search(&keyword, plugins.as_deref(), force_refresh, concurrency, &ext)
                        .await
                } else {
                    Ok(Vec::new())
                }
            })
        };

        // §5 Cancellation: a caller-supplied deadline aborts both drivers
        // together, racing the join against a sleep rather than threading a
        // deadline through every suspension point in the drivers themselves.
        let channel_abort = channel_task.abort_handle();
        let plugin_abort = plugin_task.abort_handle();
        let joined = async { tokio::join!(channel_task, plugin_task) };

        let (channel_joined, plugin_joined) = match params.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, joined).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    channel_abort.abort();
                    plugin_abort.abort();
                    return Err(SearchError::driver(
                        "orchestrator",
                        format!("request deadline of {deadline:?} exceeded; partial results discarded"),
                    ));
                }
            },
            None => joined.await,
        };

        let channel_outcome = join_result(channel_joined, "channel");
        let plugin_outcome = join_result(plugin_joined, "plugin");

        // §7/§4.9 step 3: propagate the first Driver error, channel side
        // wins when both fail.
        let tg_results = match channel_outcome {
            Err(err) => return Err(err),
            Ok(results) => results,
        };
        let plugin_results = match plugin_outcome {
            Err(err) => return Err(err),
            Ok(results) => results,
        };

        let merged = merge::merge(tg_results, plugin_results);
        let sorted = rank::filter_and_sort(merged, &params.keyword, &SubstringMatcher);
        Ok(response::assemble(sorted, params.view_mode))
    }
}

/// Collapse a spawned driver task's outcome. A panic inside a driver task
/// becomes a surfaced `Driver` error tagged with `source_family` — a panic
/// is exactly the kind of setup failure §7 says should fail the whole
/// request, not one more task-level failure to swallow.
fn join_result<T>(
    joined: std::result::Result<Result<T>, tokio::task::JoinError>,
    source_family: &'static str,
) -> Result<T> {
    match joined {
        Ok(inner) => inner,
        Err(join_err) => Err(SearchError::driver(source_family, join_err.to_string())),
    }
}
