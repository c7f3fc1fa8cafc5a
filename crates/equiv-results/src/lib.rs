//! Equiv Results
//!
//! Turns the raw outputs of generators and scorers into an
//! [`EquivalenceResult`](equiv_domain::EquivalenceResult).
//!
//! ## Stages
//!
//! 1. **Combine**: fold every score set into one score per candidate
//! 2. **Filter**: veto candidates with an ordered conjunction of predicates
//! 3. **Extract**: per publisher, pick the accepted candidates from a
//!    ranked list
//!
//! Stages are trait objects assembled at start-up; nothing here does I/O.
//!
//! # Examples
//!
//! ```
//! use equiv_results::{
//!     AllOverOrEqThresholdExtractor, ConjunctiveFilter, EquivalenceResultBuilder,
//!     MinimumScoreFilter, NullScoreAwareAveragingCombiner,
//! };
//!
//! let builder = EquivalenceResultBuilder::new(Box::new(NullScoreAwareAveragingCombiner::new()))
//!     .with_filter(ConjunctiveFilter::new().with(MinimumScoreFilter::new(0.25)))
//!     .with_extractor(AllOverOrEqThresholdExtractor::new(1.0).unwrap());
//! assert_eq!(builder.combiner_name(), "Averaging");
//! ```

#![warn(missing_docs)]

mod builder;
mod combiner;
mod error;
mod extractor;
mod filter;

pub use builder::{BuiltResult, EquivalenceResultBuilder, EMPTY_COMBINATION};
pub use combiner::{
    AddingCombiner, EquivalenceCombiner, NullScoreAwareAveragingCombiner,
    RequiredScoreFilteringCombiner, ScoreThreshold,
};
pub use error::ResultsError;
pub use extractor::{
    AllOverOrEqThresholdExtractor, EquivalenceExtractor, HighestNonEmptyThresholdExtractor,
    MultiStageExtractor, MultipleCandidateExtractor, PercentAboveNextBestExtractor,
    PercentOfBestExtractor,
};
pub use filter::{
    ConjunctiveFilter, DummyContainerFilter, EquivalenceFilter, ExclusionListFilter,
    FilmEpisodeFilter, FilmYearFilter, FilterOutcome, MediaTypeFilter, MinimumScoreFilter,
    PublisherFilter, Rejection, RejectionReason, SpecializationFilter, UnpublishedContentFilter,
};
