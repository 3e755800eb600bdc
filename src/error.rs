use thiserror::Error;

/// Error taxonomy for the search aggregator.
///
/// [`SearchError::Driver`] is the only variant the orchestrator propagates to
/// callers (see `orchestrator.rs`); everything else is swallowed at the
/// boundary where it occurs (a per-task failure, a cache miss, a corrupt
/// cache entry) and never escapes as a request failure.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A driver's own setup or cache machinery failed outright. Surfaced to
    /// the caller; the whole request fails.
    #[error("{source_family} driver failed: {message}")]
    Driver {
        source_family: &'static str,
        message: String,
    },

    /// A single channel or plugin task failed. Never returned from a public
    /// API; drivers catch this at the task boundary and contribute nothing
    /// for that task instead.
    #[error("task failed: {0}")]
    Task(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub fn driver(source_family: &'static str, message: impl Into<String>) -> Self {
        Self::Driver {
            source_family,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
