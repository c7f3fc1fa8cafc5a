//! Equiv Generators
//!
//! Candidate discovery. Each generator implements one retrieval strategy
//! over the read-only collaborator traits and labels its output with its
//! name for diagnostics.
//!
//! # Strategies
//!
//! - **Alias resolving**: records sharing one of the subject's expanded aliases
//! - **Title search**: records found by searching the subject's title
//! - **Broadcast matching**: records airing on the same channel at the same time
//! - **Container child**: containers the subject's children were matched into
//! - **Container candidates**: items under the containers the subject's
//!   parent was previously matched to
//!
//! # Contract
//!
//! Finding nothing is an empty [`ScoredCandidates`], never an error. A failed
//! collaborator read is returned as [`GeneratorError::Read`], which the
//! pipeline recovers from; any other error fails the subject.

#![warn(missing_docs)]

use async_trait::async_trait;
use equiv_domain::{Content, ScoredCandidates};

mod alias;
mod broadcast;
pub mod config;
mod container;
mod error;
mod scaling;
mod title_search;

pub use alias::{AliasResolvingGenerator, AliasScoring};
pub use broadcast::BroadcastMatchingGenerator;
pub use config::{AliasGeneratorConfig, BroadcastMatchingConfig, TitleSearchConfig};
pub use container::{ContainerCandidatesItemGenerator, ContainerChildGenerator};
pub use error::GeneratorError;
pub use scaling::ScalingGenerator;
pub use title_search::TitleSearchGenerator;

/// One candidate-discovery strategy
#[async_trait]
pub trait EquivalenceGenerator: Send + Sync {
    /// Source label of the candidates this generator produces
    fn name(&self) -> &str;

    /// Find and score candidates for `subject`
    async fn generate(&self, subject: &Content) -> Result<ScoredCandidates, GeneratorError>;
}
