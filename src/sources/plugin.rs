//! `SearchPlugin` + `PluginRegistry` — the C4 collaborators. Plugin
//! discovery and concrete plugin implementations are out of scope per spec
//! §1/§6; this module owns the contract plus a minimal in-memory registry,
//! grounded in the same `LegalApiClient`-shaped trait the channel scraper
//! uses.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::SearchResult;
use crate::error::Result;

#[async_trait]
pub trait SearchPlugin: Send + Sync {
    /// The name this plugin is registered and selected under. Matched
    /// case-insensitively against a request's `plugins` selector (§4.4
    /// rule 3).
    fn name(&self) -> &str;

    async fn search(&self, keyword: &str, ext: &Map<String, Value>) -> Result<Vec<SearchResult>>;
}

/// Exposes the set of currently registered plugins. Concrete discovery
/// (loading plugin binaries, watching a directory, …) is an external
/// collaborator; this crate only needs to read the current set.
pub trait PluginRegistry: Send + Sync {
    fn plugins(&self) -> Vec<Arc<dyn SearchPlugin>>;
}

/// A static, in-memory registry. Sufficient for tests and for callers that
/// wire up their own plugin set directly rather than discovering one.
#[derive(Default)]
pub struct InMemoryPluginRegistry {
    plugins: RwLock<Vec<Arc<dyn SearchPlugin>>>,
}

impl InMemoryPluginRegistry {
    pub fn new(plugins: Vec<Arc<dyn SearchPlugin>>) -> Self {
        Self {
            plugins: RwLock::new(plugins),
        }
    }

    pub fn register(&self, plugin: Arc<dyn SearchPlugin>) {
        self.plugins.write().unwrap().push(plugin);
    }
}

impl PluginRegistry for InMemoryPluginRegistry {
    fn plugins(&self) -> Vec<Arc<dyn SearchPlugin>> {
        self.plugins.read().unwrap().clone()
    }
}
