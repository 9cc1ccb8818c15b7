//! Report generation errors.

use thiserror::Error;

use crate::cache::CacheError;
use crate::worker::WorkerError;

/// Result type for report generation and metadata sync.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors surfaced by the synchronizer, resolver, join engine and fact linker.
///
/// The first failure aborts the whole operation; nothing is retried.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report definition or provider selection cannot be served.
    #[error("invalid report specification: {0}")]
    InvalidSpec(String),

    /// A provider call failed.
    #[error("provider failure: {0}")]
    ProviderFailure(#[from] WorkerError),

    /// A metadata store call failed.
    #[error("metadata store failure: {0}")]
    StoreFailure(#[from] CacheError),
}

impl ReportError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidSpec(message.into())
    }
}
