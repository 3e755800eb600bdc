//! Request shapes: the raw, caller-facing [`SearchRequest`] and the
//! canonical [`NormalizedParams`] the rest of the pipeline actually consumes.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::domain::ViewMode;

/// Which source families a request should fan out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    #[default]
    All,
    Tg,
    Plugin,
}

impl SourceType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "tg" => Self::Tg,
            "plugin" => Self::Plugin,
            // "" and "all" (and anything else) both normalize to "all" per §4.2 rule 1.
            _ => Self::All,
        }
    }

    pub fn wants_channels(self) -> bool {
        matches!(self, Self::All | Self::Tg)
    }

    pub fn wants_plugins(self) -> bool {
        matches!(self, Self::All | Self::Plugin)
    }
}

/// The request as the caller submits it, before canonicalization.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub keyword: String,
    pub channels: Vec<String>,
    pub concurrency: i64,
    pub force_refresh: bool,
    pub result_type: String,
    pub source_type: String,
    pub plugins: Option<Vec<String>>,
    pub ext: Option<Map<String, Value>>,
    /// Caller-supplied wall-clock budget for the whole request (§5
    /// Cancellation). `None` means no deadline: the orchestrator waits on
    /// both drivers however long the worker pool's own per-task timeout
    /// lets them run.
    pub deadline: Option<Duration>,
}

impl SearchRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }
}

/// The canonical form C2 produces. Every downstream component reads from
/// here, never from the raw [`SearchRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedParams {
    pub keyword: String,
    pub channels: Vec<String>,
    pub concurrency: usize,
    pub force_refresh: bool,
    pub view_mode: ViewMode,
    pub source_type: SourceType,
    /// `None` means "all registered plugins" (either the caller asked for
    /// that explicitly, or their explicit list collapsed to it per §4.2
    /// rule 3).
    pub plugins: Option<Vec<String>>,
    pub ext: Map<String, Value>,
    pub deadline: Option<Duration>,
}
