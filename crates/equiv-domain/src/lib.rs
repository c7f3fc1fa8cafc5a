//! Equiv Domain Layer
//!
//! This crate contains the domain model shared by every stage of the
//! equivalence pipeline. It defines the content records being compared, the
//! score type every stage produces, and the trait interfaces for the
//! read-only collaborators the pipeline consumes.
//!
//! ## Key Concepts
//!
//! - **Content**: a record from one publisher (item, episode, film, brand, series)
//! - **Alias**: a `(namespace, value)` identifier stamped on content by a source system
//! - **Score**: either `Unscored` (no opinion) or `Real(v)`, where negative `v` is
//!   evidence *against* equivalence
//! - **ScoredCandidates**: one generator's or scorer's opinion of a candidate set
//! - **EquivalenceResult**: the accepted candidates for one subject
//!
//! ## Architecture
//!
//! - Pure data and value objects only
//! - No I/O; collaborator traits live in [`traits`] and are implemented elsewhere
//! - Every other crate in the workspace depends on this one

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alias;
pub mod content;
pub mod error;
pub mod result;
pub mod run;
pub mod score;
pub mod scored;
pub mod traits;

// Re-exports for convenience
pub use alias::Alias;
pub use content::{
    Broadcast, Channel, Content, ContentKind, MediaType, Publisher, Specialization, Version,
};
pub use error::{HandlerError, ReadError};
pub use result::{ContentRef, EquivalenceResult, EquivalenceSummary};
pub use run::RunId;
pub use score::Score;
pub use scored::{CombinedScore, ScoredCandidate, ScoredCandidates};
