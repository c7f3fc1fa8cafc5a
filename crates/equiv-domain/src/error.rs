//! Error types for collaborator interactions

use thiserror::Error;

/// Failure of a read-only collaborator (lookup, resolver, search, schedule,
/// summary store)
///
/// These are recoverable at generator granularity: the pipeline treats the
/// affected generator as having found nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    /// Collaborator could not be reached or refused the request
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// Collaborator did not answer in time
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        /// What was being read
        operation: String,
        /// Elapsed time before giving up
        after_ms: u64,
    },

    /// Collaborator returned data that could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Failure of a result handler
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The subject's container has no equivalence summary yet
    #[error("Container summary required for {subject} (container {container})")]
    ContainerSummaryRequired {
        /// Subject URI
        subject: String,
        /// Container URI
        container: String,
    },

    /// A read needed by the handler failed
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Writing the result failed
    #[error("Write error: {0}")]
    Write(String),
}
