//! A1 — Worker Pool.
//!
//! Bounded-concurrency batch execution with a per-task wall-clock deadline,
//! built around `futures::stream::buffer_unordered` wrapped in
//! `tokio::time::timeout`.
//!
//! - Results come back aligned to *submission* order, not completion order
//!   — `buffer_unordered` completes tasks out of order internally, so each
//!   task is tagged with its index and the collected results are restored
//!   to submission order before returning.
//! - A timed-out or failed task yields `None` rather than an error; per-task
//!   failure is never surfaced past the pool.

use std::time::Duration;

use futures::stream::{self, StreamExt};

/// Run `tasks` with at most `concurrency` in flight at once, aborting any
/// individual task that runs past `timeout`. The returned vector is the
/// same length as `tasks` and aligned to it index-for-index; a `None` marks
/// a task that failed or timed out.
pub async fn execute_batch_with_timeout<F, T>(
    tasks: Vec<F>,
    concurrency: usize,
    timeout: Duration,
) -> Vec<Option<T>>
where
    F: std::future::Future<Output = Option<T>>,
{
    let concurrency = concurrency.max(1);

    let indexed = tasks.into_iter().enumerate().map(|(index, task)| async move {
        let outcome = tokio::time::timeout(timeout, task).await.ok().flatten();
        (index, outcome)
    });

    let mut results: Vec<Option<T>> = Vec::new();
    let mut completed: Vec<(usize, Option<T>)> = stream::iter(indexed)
        .buffer_unordered(concurrency)
        .collect()
        .await;

    completed.sort_by_key(|(index, _)| *index);
    results.extend(completed.into_iter().map(|(_, outcome)| outcome));
    results
}
