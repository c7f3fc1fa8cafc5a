//! Equiv Scorers
//!
//! Each scorer computes one confidence signal for a (subject, candidate)
//! pair. Scorers are pure: no I/O, no shared state, and every input they
//! need is already on the records.
//!
//! Scorers return [`Score::Unscored`] when they have no opinion (missing
//! title, not an episode, no year), never zero.
//!
//! # Examples
//!
//! ```
//! use equiv_domain::{Content, ContentKind, Publisher, Score};
//! use equiv_scorers::{EquivalenceScorer, TitleMatchingScorer};
//!
//! let subject = Content::new(1, "a", Publisher::new("a"), ContentKind::Item).with_title("Dr Who");
//! let candidate = Content::new(2, "b", Publisher::new("b"), ContentKind::Item).with_title("Doctor Who");
//!
//! let scorer = TitleMatchingScorer::default();
//! assert_eq!(scorer.score(&subject, &candidate), Score::Real(2.0));
//! ```

#![warn(missing_docs)]

mod alias_namespace;
mod description;
pub mod normalize;
mod sequence;
mod subset;
mod title;
mod year;

pub use alias_namespace::AliasNamespaceScorer;
pub use description::DescriptionMatchingScorer;
pub use sequence::SequenceScorer;
pub use subset::TitleSubsetScorer;
pub use title::{ContentTitleScorer, TitleMatchingScorer, TitleShape};
pub use year::ReleaseYearScorer;

use equiv_domain::{Content, Score, ScoredCandidates};
use std::sync::Arc;

/// One confidence signal over (subject, candidate) pairs
pub trait EquivalenceScorer: Send + Sync {
    /// Source label for the scores this scorer produces
    fn name(&self) -> &str;

    /// Score one candidate
    fn score(&self, subject: &Content, candidate: &Content) -> Score;

    /// Score a candidate set
    ///
    /// Override when work can be shared across candidates.
    fn score_all(&self, subject: &Content, candidates: &[Arc<Content>]) -> ScoredCandidates {
        let mut scores = ScoredCandidates::new(self.name());
        for candidate in candidates {
            scores.set(candidate.clone(), self.score(subject, candidate));
        }
        scores
    }
}
