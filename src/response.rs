//! C8 — Response Assembler.

use crate::domain::{SearchResponse, SearchResult, ViewMode};
use crate::group;
use crate::rank;

/// Assemble the final [`SearchResponse`] from C6's filtered-and-sorted set
/// (pre-gate) according to `view_mode`, per §4.8.
pub fn assemble(sorted: Vec<SearchResult>, view_mode: ViewMode) -> SearchResponse {
    let merged_by_type = group::group_by_storage_type(&sorted);
    let gated: Vec<SearchResult> = sorted.into_iter().filter(rank::passes_gate).collect();

    match view_mode {
        ViewMode::All => SearchResponse {
            total: gated.len(),
            results: gated,
            merged_by_type,
        },
        ViewMode::Results => SearchResponse {
            total: gated.len(),
            results: gated,
            merged_by_type: Default::default(),
        },
        ViewMode::MergedByType => {
            let total = merged_by_type.values().map(Vec::len).sum();
            SearchResponse {
                total,
                results: Vec::new(),
                merged_by_type,
            }
        }
    }
}
