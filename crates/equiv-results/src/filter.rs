//! Filters veto candidates after combination
//!
//! Filters run as an ordered conjunction: the first filter to object
//! rejects the candidate and the rest are not consulted.

use equiv_domain::{Content, ContentKind, MediaType, Publisher, Score, ScoredCandidate, Specialization};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Why a filter rejected a candidate
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// Combined score below the minimum, or unscored
    BelowMinimumScore {
        /// Required minimum
        minimum: f64,
        /// Combined score
        actual: Score,
    },

    /// Media types differ
    MediaTypeMismatch {
        /// Subject's media type
        subject: MediaType,
        /// Candidate's media type
        candidate: MediaType,
    },

    /// Specializations differ
    SpecializationMismatch {
        /// Subject's specialization
        subject: Specialization,
        /// Candidate's specialization
        candidate: Specialization,
    },

    /// One side is a film and the other an episode
    FilmEpisodeMismatch,

    /// Candidate is a placeholder container
    DummyContainer,

    /// Candidate is no longer published
    Unpublished,

    /// Subject or candidate is on the exclusion list
    Excluded(String),

    /// Both are films released in different years
    FilmYearMismatch {
        /// Subject's year
        subject: i32,
        /// Candidate's year
        candidate: i32,
    },

    /// Candidate shares the subject's publisher
    SamePublisher,

    /// Candidate's publisher is outside the allowed set
    PublisherNotAllowed(Publisher),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::BelowMinimumScore { minimum, actual } => {
                write!(f, "score {} below {}", actual, minimum)
            }
            RejectionReason::MediaTypeMismatch { subject, candidate } => {
                write!(f, "media type {:?} vs {:?}", subject, candidate)
            }
            RejectionReason::SpecializationMismatch { subject, candidate } => {
                write!(f, "specialization {:?} vs {:?}", subject, candidate)
            }
            RejectionReason::FilmEpisodeMismatch => f.write_str("film vs episode"),
            RejectionReason::DummyContainer => f.write_str("dummy container"),
            RejectionReason::Unpublished => f.write_str("unpublished"),
            RejectionReason::Excluded(uri) => write!(f, "{} is excluded", uri),
            RejectionReason::FilmYearMismatch { subject, candidate } => {
                write!(f, "film year {} vs {}", subject, candidate)
            }
            RejectionReason::SamePublisher => f.write_str("same publisher as subject"),
            RejectionReason::PublisherNotAllowed(p) => write!(f, "publisher {} not allowed", p),
        }
    }
}

/// A candidate one filter rejected
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Rejected candidate
    pub uri: String,
    /// Name of the rejecting filter
    pub filter: String,
    /// Why
    pub reason: RejectionReason,
}

/// A single veto over (subject, candidate)
pub trait EquivalenceFilter: Send + Sync {
    /// Filter name used in rejections
    fn name(&self) -> &str;

    /// `None` to let the candidate through, otherwise why it is rejected
    fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason>;
}

/// Accepted candidates and the rejections made on the way
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Survivors, in input order
    pub accepted: Vec<ScoredCandidate>,
    /// One entry per rejected candidate
    pub rejections: Vec<Rejection>,
}

/// Ordered conjunction of filters
#[derive(Default)]
pub struct ConjunctiveFilter {
    filters: Vec<Box<dyn EquivalenceFilter>>,
}

impl ConjunctiveFilter {
    /// Filter that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter
    pub fn with(mut self, filter: impl EquivalenceFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether there are no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// First rejection `candidate` meets, if any
    pub fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<Rejection> {
        self.filters.iter().find_map(|filter| {
            filter.check(subject, candidate).map(|reason| Rejection {
                uri: candidate.uri().to_string(),
                filter: filter.name().to_string(),
                reason,
            })
        })
    }

    /// Split `candidates` into survivors and rejections
    pub fn apply(
        &self,
        subject: &Content,
        candidates: impl IntoIterator<Item = ScoredCandidate>,
    ) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for candidate in candidates {
            match self.check(subject, &candidate) {
                Some(rejection) => {
                    debug!(
                        subject = %subject.canonical_uri,
                        filter = %rejection.filter,
                        "Rejected {}: {}",
                        rejection.uri,
                        rejection.reason
                    );
                    outcome.rejections.push(rejection);
                }
                None => outcome.accepted.push(candidate),
            }
        }
        outcome
    }
}

/// Rejects candidates whose combined score is unscored or below a minimum
#[derive(Debug, Clone, Copy)]
pub struct MinimumScoreFilter {
    minimum: f64,
}

impl MinimumScoreFilter {
    /// Require at least `minimum`
    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }
}

impl EquivalenceFilter for MinimumScoreFilter {
    fn name(&self) -> &str {
        "MinimumScore"
    }

    fn check(&self, _subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        match candidate.score {
            Score::Real(v) if v >= self.minimum => None,
            actual => Some(RejectionReason::BelowMinimumScore {
                minimum: self.minimum,
                actual,
            }),
        }
    }
}

/// Rejects candidates whose media type differs from the subject's
///
/// Records without a media type are not judged.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaTypeFilter;

impl EquivalenceFilter for MediaTypeFilter {
    fn name(&self) -> &str {
        "MediaType"
    }

    fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        match (subject.media_type, candidate.candidate.media_type) {
            (Some(s), Some(c)) if s != c => Some(RejectionReason::MediaTypeMismatch {
                subject: s,
                candidate: c,
            }),
            _ => None,
        }
    }
}

/// Rejects candidates whose specialization differs from the subject's
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecializationFilter;

impl EquivalenceFilter for SpecializationFilter {
    fn name(&self) -> &str {
        "Specialization"
    }

    fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        match (subject.specialization, candidate.candidate.specialization) {
            (Some(s), Some(c)) if s != c => Some(RejectionReason::SpecializationMismatch {
                subject: s,
                candidate: c,
            }),
            _ => None,
        }
    }
}

/// Rejects films matched to episodes and episodes matched to films
#[derive(Debug, Clone, Copy, Default)]
pub struct FilmEpisodeFilter;

impl EquivalenceFilter for FilmEpisodeFilter {
    fn name(&self) -> &str {
        "FilmEpisode"
    }

    fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        match (subject.kind, candidate.candidate.kind) {
            (ContentKind::Film, ContentKind::Episode) | (ContentKind::Episode, ContentKind::Film) => {
                Some(RejectionReason::FilmEpisodeMismatch)
            }
            _ => None,
        }
    }
}

/// Rejects placeholder containers: untitled or without children
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyContainerFilter;

impl EquivalenceFilter for DummyContainerFilter {
    fn name(&self) -> &str {
        "DummyContainer"
    }

    fn check(&self, _subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        let content = &candidate.candidate;
        (content.is_container() && (content.title().is_none() || content.children.is_empty()))
            .then_some(RejectionReason::DummyContainer)
    }
}

/// Rejects candidates that are no longer actively published
#[derive(Debug, Clone, Copy, Default)]
pub struct UnpublishedContentFilter;

impl EquivalenceFilter for UnpublishedContentFilter {
    fn name(&self) -> &str {
        "Unpublished"
    }

    fn check(&self, _subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        (!candidate.candidate.actively_published).then_some(RejectionReason::Unpublished)
    }
}

/// Rejects everything when the subject, or the candidate, is listed
#[derive(Debug, Clone, Default)]
pub struct ExclusionListFilter {
    ids: BTreeSet<u64>,
    uris: BTreeSet<String>,
}

impl ExclusionListFilter {
    /// Empty exclusion list
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a record id
    pub fn with_id(mut self, id: u64) -> Self {
        self.ids.insert(id);
        self
    }

    /// Exclude a canonical URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uris.insert(uri.into());
        self
    }

    fn excludes(&self, content: &Content) -> bool {
        self.ids.contains(&content.id) || self.uris.contains(&content.canonical_uri)
    }
}

impl EquivalenceFilter for ExclusionListFilter {
    fn name(&self) -> &str {
        "ExclusionList"
    }

    fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        [subject, candidate.candidate.as_ref()]
            .into_iter()
            .find(|content| self.excludes(content))
            .map(|content| RejectionReason::Excluded(content.canonical_uri.clone()))
    }
}

/// Rejects a film candidate released in a different year from a film subject
#[derive(Debug, Clone, Copy, Default)]
pub struct FilmYearFilter;

impl EquivalenceFilter for FilmYearFilter {
    fn name(&self) -> &str {
        "FilmYear"
    }

    fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        let content = &candidate.candidate;
        if subject.kind != ContentKind::Film || content.kind != ContentKind::Film {
            return None;
        }
        match (subject.year, content.year) {
            (Some(s), Some(c)) if s != c => Some(RejectionReason::FilmYearMismatch {
                subject: s,
                candidate: c,
            }),
            _ => None,
        }
    }
}

/// Rejects candidates from the subject's own publisher and, when an allowed
/// set is given, from publishers outside it
#[derive(Debug, Clone, Default)]
pub struct PublisherFilter {
    allowed: Option<BTreeSet<Publisher>>,
}

impl PublisherFilter {
    /// Only reject the subject's own publisher
    pub fn new() -> Self {
        Self::default()
    }

    /// Also require membership of `allowed`
    pub fn allowing(allowed: BTreeSet<Publisher>) -> Self {
        Self {
            allowed: Some(allowed),
        }
    }
}

impl EquivalenceFilter for PublisherFilter {
    fn name(&self) -> &str {
        "Publisher"
    }

    fn check(&self, subject: &Content, candidate: &ScoredCandidate) -> Option<RejectionReason> {
        let publisher = candidate.publisher();
        if *publisher == subject.publisher {
            return Some(RejectionReason::SamePublisher);
        }
        match &self.allowed {
            Some(allowed) if !allowed.contains(publisher) => {
                Some(RejectionReason::PublisherNotAllowed(publisher.clone()))
            }
            _ => None,
        }
    }
}
