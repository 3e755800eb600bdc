//! C5 — Merger.

use std::collections::HashMap;

use crate::domain::SearchResult;

/// Union `tg` and `plugin` results by `unique_id`. On collision the entry
/// with the strictly greater `datetime` wins; a `None` timestamp loses to any
/// `Some`. If both are `None`, the later-seen entry wins — `plugin` is
/// processed after `tg`, so a plugin-side collision beats a tg-side one when
/// neither carries a timestamp, giving a deterministic tie-break without an
/// arbitrary secondary key.
///
/// Output order is the order each `unique_id` was *first seen* (tg order,
/// then plugin order for ids not already present) — a winning value can
/// replace an earlier one without moving its slot. C6's `filter_and_sort`
/// uses this as its insertion-order tiebreak for entries that otherwise
/// compare equal, so it must be deterministic rather than the arbitrary
/// order a `HashMap` iterates in.
pub fn merge(tg: Vec<SearchResult>, plugin: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut order: Vec<String> = Vec::with_capacity(tg.len() + plugin.len());
    let mut by_id: HashMap<String, SearchResult> = HashMap::with_capacity(tg.len() + plugin.len());

    for result in tg.into_iter().chain(plugin) {
        match by_id.get(&result.unique_id) {
            Some(existing) if !is_fresher_or_equal(&result, existing) => {}
            _ => {
                if !by_id.contains_key(&result.unique_id) {
                    order.push(result.unique_id.clone());
                }
                by_id.insert(result.unique_id.clone(), result);
            }
        }
    }

    order
        .into_iter()
        .map(|id| by_id.remove(&id).expect("id is only pushed to order once it's inserted into by_id"))
        .collect()
}

/// True when `candidate` should replace `existing`: strictly newer, or both
/// timestampless (later-seen wins by construction since callers insert in
/// encounter order).
fn is_fresher_or_equal(candidate: &SearchResult, existing: &SearchResult) -> bool {
    match (candidate.datetime, existing.datetime) {
        (Some(c), Some(e)) => c >= e,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::Map;

    fn result(id: &str, source: &str, datetime: Option<DateTime<Utc>>) -> SearchResult {
        SearchResult {
            unique_id: id.to_string(),
            title: format!("title {id}"),
            datetime,
            links: vec![],
            source_tag: source.to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn disjoint_ids_are_both_kept() {
        let tg = vec![result("a", "tg", None)];
        let plugin = vec![result("b", "plugin", None)];
        let merged = merge(tg, plugin);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn newer_timestamp_wins_on_collision() {
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let tg = vec![result("a", "tg", Some(older))];
        let plugin = vec![result("a", "plugin", Some(newer))];
        let merged = merge(tg, plugin);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_tag, "plugin");
    }

    #[test]
    fn timestamped_entry_beats_timestampless_regardless_of_side() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let tg = vec![result("a", "tg", None)];
        let plugin = vec![result("a", "plugin", Some(ts))];
        let merged = merge(tg, plugin);
        assert_eq!(merged[0].source_tag, "plugin");

        let tg = vec![result("a", "tg", Some(ts))];
        let plugin = vec![result("a", "plugin", None)];
        let merged = merge(tg, plugin);
        assert_eq!(merged[0].source_tag, "tg");
    }

    #[test]
    fn both_timestampless_later_seen_wins() {
        let tg = vec![result("a", "tg", None)];
        let plugin = vec![result("a", "plugin", None)];
        let merged = merge(tg, plugin);
        assert_eq!(merged[0].source_tag, "plugin");
    }

    #[test]
    fn output_order_is_first_seen_order_not_hashmap_order() {
        let tg = vec![result("c", "tg", None), result("a", "tg", None)];
        let plugin = vec![result("a", "plugin", None), result("b", "plugin", None)];
        let merged = merge(tg, plugin);
        let ids: Vec<&str> = merged.iter().map(|r| r.unique_id.as_str()).collect();
        // "c" and "a" are first seen on the tg side (in that order); "b" is
        // first seen on the plugin side. "a"'s winning value comes from the
        // plugin side, but its position stays where it was first seen.
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(merged[1].source_tag, "plugin");
    }

    #[test]
    fn merge_is_deterministic_across_repeated_calls() {
        let tg = vec![
            result("a", "tg", None),
            result("b", "tg", None),
            result("c", "tg", None),
        ];
        let plugin = vec![result("d", "plugin", None), result("b", "plugin", None)];

        let first: Vec<String> = merge(tg.clone(), plugin.clone())
            .into_iter()
            .map(|r| r.unique_id)
            .collect();
        for _ in 0..20 {
            let again: Vec<String> = merge(tg.clone(), plugin.clone())
                .into_iter()
                .map(|r| r.unique_id)
                .collect();
            assert_eq!(again, first);
        }
    }
}
