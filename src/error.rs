//! Error types for the search-to-report pipeline.
//!
//! Each stage has its own error; [`PipelineError`] is what the pipeline
//! entry point returns to its caller.

use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the patent-search provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider rejected the API key (HTTP {status})")]
    Authentication { status: u16 },

    #[error("Provider rate limit exceeded (HTTP 429)")]
    RateLimited,

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Whether a single retry is allowed for this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Network(_))
    }
}

/// A raw record that is not a JSON object.
#[derive(Debug, Error)]
#[error("Record {index} is not an object (found {found})")]
pub struct MalformedRecordError {
    /// Position of the record in the provider response.
    pub index: usize,
    /// JSON type that was found instead.
    pub found: &'static str,
}

/// Failure writing the report artifact.
#[derive(Debug, Error)]
#[error("Failed to write report to {}: {source}", path.display())]
pub struct RenderError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Any failure of the pipeline as a whole.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecordError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
