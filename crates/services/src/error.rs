//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by session services.
///
/// Bootstrap failures never escape as errors; they become session states.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no valid questions in batch")]
    EmptyBatch,
    #[error("question source failed: {0}")]
    Source(#[source] StorageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
