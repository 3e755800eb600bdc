//! C7 — Grouper.

use std::collections::BTreeMap;

use crate::domain::{Link, SearchResult};

/// Partition links from `entries` (the full filtered-and-sorted set,
/// pre-gate per §4.7) into buckets keyed by storage-type wire tag. Entries
/// are walked in the order given, and each entry's links are appended to
/// their bucket in order, so bucket order matches C6's sort order.
pub fn group_by_storage_type(entries: &[SearchResult]) -> BTreeMap<String, Vec<Link>> {
    let mut grouped: BTreeMap<String, Vec<Link>> = BTreeMap::new();
    for entry in entries {
        for link in &entry.links {
            grouped
                .entry(link.storage_type.as_str().to_string())
                .or_default()
                .push(link.clone());
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn link(url: &str, storage: &str) -> Link {
        Link {
            url: url.to_string(),
            storage_type: storage.into(),
            password: None,
        }
    }

    fn result(id: &str, links: Vec<Link>) -> SearchResult {
        SearchResult {
            unique_id: id.to_string(),
            title: "t".to_string(),
            datetime: None,
            links,
            source_tag: "s".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn links_bucket_by_storage_type_preserving_walk_order() {
        let entries = vec![
            result("a", vec![link("u1", "baidu"), link("u2", "quark")]),
            result("b", vec![link("u3", "baidu")]),
        ];
        let grouped = group_by_storage_type(&entries);
        assert_eq!(grouped["baidu"].len(), 2);
        assert_eq!(grouped["baidu"][0].url, "u1");
        assert_eq!(grouped["baidu"][1].url, "u3");
        assert_eq!(grouped["quark"].len(), 1);
    }

    #[test]
    fn entry_with_no_links_contributes_nothing() {
        let entries = vec![result("a", vec![])];
        let grouped = group_by_storage_type(&entries);
        assert!(grouped.is_empty());
    }

    #[test]
    fn unrecognized_storage_tag_buckets_as_opaque_other() {
        let entries = vec![result("a", vec![link("u1", "mystery")])];
        let grouped = group_by_storage_type(&entries);
        assert_eq!(grouped["mystery"].len(), 1);
    }
}
