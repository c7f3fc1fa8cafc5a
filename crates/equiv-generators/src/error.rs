//! Error types for generators

use equiv_domain::ReadError;
use thiserror::Error;

/// Errors a generator can return
///
/// [`GeneratorError::Read`] is recoverable: the pipeline treats the generator
/// as having found nothing. Every other variant fails the subject's run.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// A collaborator read failed or timed out
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// The subject cannot be handled by this generator
    #[error("Invalid subject {uri}: {reason}")]
    InvalidSubject {
        /// Subject URI
        uri: String,
        /// What is wrong with it
        reason: String,
    },

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GeneratorError {
    /// Whether the pipeline may continue without this generator's output
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GeneratorError::Read(_))
    }
}
