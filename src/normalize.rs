//! C2 — Parameter Normalizer.
//!
//! Canonicalizes a caller's [`SearchRequest`] into [`NormalizedParams`] per
//! spec §4.2. Every rule here exists to make two requests that mean the same
//! thing produce the same cache key (see `cache/key.rs`), and to make
//! `normalize(normalize(x)) == normalize(x)` (§8 invariant 6).

use std::collections::HashSet;

use crate::domain::ViewMode;
use crate::request::{NormalizedParams, SearchRequest, SourceType};

/// Canonicalize `req` against the plugin names currently registered.
///
/// `registry_plugin_names` is the full, lowercased set of plugin names known
/// to the caller's [`crate::sources::plugin::PluginRegistry`] — needed for
/// the "full-set collapse" rule (§4.2 rule 3, scenario S2).
pub fn normalize(req: &SearchRequest, registry_plugin_names: &HashSet<String>) -> NormalizedParams {
    let source_type = SourceType::parse(&req.source_type);

    // Rule 2: "tg" ignores any supplied plugin list outright.
    let plugins = if source_type == SourceType::Tg {
        None
    } else {
        resolve_plugins(req.plugins.as_deref(), registry_plugin_names)
    };

    let plugins_resolved_len = plugins
        .as_ref()
        .map(Vec::len)
        .unwrap_or(registry_plugin_names.len());

    let concurrency = if req.concurrency <= 0 {
        (plugins_resolved_len + 10).max(1)
    } else {
        req.concurrency as usize
    };

    NormalizedParams {
        keyword: req.keyword.clone(),
        channels: req.channels.clone(),
        concurrency,
        force_refresh: req.force_refresh,
        view_mode: ViewMode::parse(&req.result_type),
        source_type,
        plugins,
        ext: req.ext.clone().unwrap_or_default(),
        deadline: req.deadline,
    }
}

/// Rule 3: strip blanks, dedup+lowercase, collapse to `None` if the result is
/// empty or equals the full registry.
fn resolve_plugins(
    requested: Option<&[String]>,
    registry_plugin_names: &HashSet<String>,
) -> Option<Vec<String>> {
    let requested = requested?;

    let mut seen = HashSet::new();
    let mut cleaned: Vec<String> = Vec::new();
    for name in requested {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if seen.insert(lower.clone()) {
            cleaned.push(lower);
        }
    }

    if cleaned.is_empty() {
        return None;
    }

    let cleaned_set: HashSet<&str> = cleaned.iter().map(String::as_str).collect();
    if !registry_plugin_names.is_empty()
        && cleaned_set.len() == registry_plugin_names.len()
        && cleaned_set
            .iter()
            .all(|name| registry_plugin_names.contains(*name))
    {
        return None;
    }

    Some(cleaned)
}
