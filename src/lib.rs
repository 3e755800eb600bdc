//! # pansou
//!
//! A federated search aggregator: fans a keyword out to a set of channel
//! scrapers and a registry of named search plugins, merges the results,
//! filters and ranks them, and returns either a flat list or a view grouped
//! by storage provider.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use pansou::cache::{build_cache, L1Config};
//! use pansou::config::Config;
//! use pansou::drivers::{ChannelSearchDriver, PluginSearchDriver};
//! use pansou::orchestrator::SearchAggregator;
//! use pansou::request::SearchRequest;
//! use pansou::sources::InMemoryPluginRegistry;
//!
//! # struct MyScraper;
//! # #[async_trait::async_trait]
//! # impl pansou::sources::ChannelScraper for MyScraper {
//! #     async fn search(&self, _k: &str, _c: &str) -> pansou::error::Result<Vec<pansou::domain::SearchResult>> {
//! #         Ok(vec![])
//! #     }
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let cache = build_cache(config.cache.db_path()?, L1Config::default()).await?;
//!
//!     let channel_driver = Arc::new(ChannelSearchDriver::new(
//!         cache.clone(),
//!         Arc::new(MyScraper),
//!         config.cache.enabled,
//!         config.cache.ttl(),
//!         config.cache.plugin_timeout(),
//!     ));
//!     let registry = Arc::new(InMemoryPluginRegistry::default());
//!     let plugin_driver = Arc::new(PluginSearchDriver::new(
//!         cache,
//!         registry.clone(),
//!         config.cache.enabled,
//!         config.cache.ttl(),
//!         config.cache.plugin_timeout(),
//!     ));
//!
//!     let aggregator = SearchAggregator::new(channel_driver, plugin_driver, registry);
//!     let response = aggregator.search(SearchRequest::new("keyword")).await?;
//!     println!("found {} results", response.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Module map
//!
//! - [`domain`] / [`request`]: the data model and request shapes.
//! - [`normalize`]: request canonicalization (C2).
//! - [`cache`]: the two-level cache and cache-key derivation (A2, C1).
//! - [`sources`]: the `ChannelScraper` and `SearchPlugin`/`PluginRegistry`
//!   collaborator contracts.
//! - [`pool`]: the bounded-concurrency worker pool (A1).
//! - [`drivers`]: the channel and plugin search drivers (C3, C4).
//! - [`merge`], [`rank`], [`group`], [`response`]: the merge → filter/rank →
//!   group → assemble pipeline (C5–C8).
//! - [`orchestrator`]: the single entry point wiring everything together
//!   (C9).
//! - [`config`]: TOML-backed configuration (A3).
//! - [`error`]: the crate's error taxonomy (A4).

pub mod cache;
pub mod config;
pub mod domain;
pub mod drivers;
pub mod error;
pub mod group;
pub mod merge;
pub mod normalize;
pub mod orchestrator;
pub mod pool;
pub mod rank;
pub mod request;
pub mod response;
pub mod sources;
