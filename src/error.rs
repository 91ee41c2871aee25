//! Failure taxonomy for a single category refresh

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("rendering category code {code} timed out after {timeout:?}")]
    RenderTimeout { code: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no product nodes found for category {category}")]
    ExtractionEmpty { category: String },

    #[error("persisting snapshot for category {category} failed: {source}")]
    Persistence {
        category: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl ScrapeError {
    /// Whether the failure happened before any page was loaded.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::UnknownCategory(_))
    }
}
