//! C6 — Filter/Ranker.
//!
//! Keyword filtering, the priority-keyword gate, and the composite sort that
//! gives `results` its total order.

use std::cmp::Ordering;

use crate::domain::SearchResult;

/// Fixed priority-keyword list, per §4.6. Order doesn't matter: `priority`
/// counts occurrences, it doesn't rank keywords against each other.
const PRIORITY_KEYWORDS: &[&str] = &["全", "合集", "系列", "完", "最新", "附"];

/// Seam for title-vs-keyword matching, left open per the distilled spec's
/// keyword-match-semantics question: resolved here as substring containment,
/// but callers needing tokenized matching can supply their own impl without
/// touching the rest of this module.
pub trait TitleMatcher: Send + Sync {
    fn matches(&self, title: &str, keyword: &str) -> bool;
}

/// Case-insensitive substring containment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl TitleMatcher for SubstringMatcher {
    fn matches(&self, title: &str, keyword: &str) -> bool {
        if keyword.is_empty() {
            return true;
        }
        title.to_lowercase().contains(&keyword.to_lowercase())
    }
}

/// Count of priority keywords occurring (as substrings) in `title`. Zero if
/// none occur.
pub fn priority(title: &str) -> usize {
    PRIORITY_KEYWORDS
        .iter()
        .filter(|kw| title.contains(*kw))
        .count()
}

/// Filter by keyword match, then impose the §4.6 composite sort. Input order
/// is preserved as the insertion-order tie-break for `None`-datetime entries,
/// so callers must pass entries in merge/insertion order, not already sorted.
pub fn filter_and_sort(
    entries: Vec<SearchResult>,
    keyword: &str,
    matcher: &dyn TitleMatcher,
) -> Vec<SearchResult> {
    let mut indexed: Vec<(usize, SearchResult)> = entries
        .into_iter()
        .filter(|entry| matcher.matches(&entry.title, keyword))
        .enumerate()
        .collect();

    indexed.sort_by(|(ia, a), (ib, b)| compare(a, b).then_with(|| ia.cmp(ib)));

    indexed.into_iter().map(|(_, entry)| entry).collect()
}

/// Total order from §4.6: dated before dateless; within each group, higher
/// `priority` first, then (dated) more-recent first. The insertion-order
/// tie-break is applied by the caller, not here, since this comparator alone
/// cannot see original position.
fn compare(a: &SearchResult, b: &SearchResult) -> Ordering {
    match (a.datetime, b.datetime) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(da), Some(db)) => priority(&b.title)
            .cmp(&priority(&a.title))
            .then_with(|| db.cmp(&da)),
        (None, None) => priority(&b.title).cmp(&priority(&a.title)),
    }
}

/// §4.6 results gate: retain iff dated or carrying at least one priority
/// keyword.
pub fn passes_gate(entry: &SearchResult) -> bool {
    entry.has_nonzero_datetime() || priority(&entry.title) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Map;

    fn result(id: &str, title: &str, datetime: Option<chrono::DateTime<Utc>>) -> SearchResult {
        SearchResult {
            unique_id: id.to_string(),
            title: title.to_string(),
            datetime,
            links: vec![],
            source_tag: "t".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn priority_counts_occurrences_not_booleans() {
        assert_eq!(priority("合集 全集 最新"), 3);
        assert_eq!(priority("nothing special"), 0);
    }

    #[test]
    fn keyword_filter_is_case_insensitive_substring() {
        let entries = vec![result("a", "Foo Bar", None), result("b", "baz", None)];
        let filtered = filter_and_sort(entries, "foo", &SubstringMatcher);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].unique_id, "a");
    }

    #[test]
    fn priority_keyword_gate_retains_timeless_entry() {
        let entry = result("a", "合集", None);
        assert!(passes_gate(&entry));
        let entry = result("b", "nothing", None);
        assert!(!passes_gate(&entry));
    }

    #[test]
    fn dated_entries_sort_before_dateless() {
        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entries = vec![result("a", "x", None), result("b", "y", Some(old))];
        let sorted = filter_and_sort(entries, "", &SubstringMatcher);
        assert_eq!(sorted[0].unique_id, "b");
        assert_eq!(sorted[1].unique_id, "a");
    }

    #[test]
    fn among_dated_entries_higher_priority_then_more_recent_wins() {
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let entries = vec![
            result("a", "plain", Some(newer)),
            result("b", "合集", Some(older)),
        ];
        let sorted = filter_and_sort(entries, "", &SubstringMatcher);
        assert_eq!(sorted[0].unique_id, "b");
        assert_eq!(sorted[1].unique_id, "a");
    }

    #[test]
    fn among_dateless_entries_insertion_order_tiebreaks_equal_priority() {
        let entries = vec![result("a", "x", None), result("b", "y", None)];
        let sorted = filter_and_sort(entries, "", &SubstringMatcher);
        assert_eq!(sorted[0].unique_id, "a");
        assert_eq!(sorted[1].unique_id, "b");
    }
}
