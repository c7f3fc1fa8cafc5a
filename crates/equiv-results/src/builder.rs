//! Assembles an [`EquivalenceResult`] from raw scores

use crate::{ConjunctiveFilter, EquivalenceCombiner, EquivalenceExtractor, Rejection};
use equiv_domain::{
    Content, EquivalenceResult, Publisher, RunId, ScoredCandidate, ScoredCandidates,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Source label of the combination of nothing
pub const EMPTY_COMBINATION: &str = "empty combination";

/// A built result and the filter rejections behind it
#[derive(Debug, Clone)]
pub struct BuiltResult {
    /// The result
    pub result: EquivalenceResult,
    /// Candidates the filters rejected
    pub rejections: Vec<Rejection>,
}

/// Combine, filter, bin by publisher and extract
///
/// Each publisher bin is sorted by descending score with ties broken by URI,
/// and the first extractor that accepts anything decides the bin.
pub struct EquivalenceResultBuilder {
    combiner: Box<dyn EquivalenceCombiner>,
    filter: ConjunctiveFilter,
    extractors: Vec<Box<dyn EquivalenceExtractor>>,
}

impl EquivalenceResultBuilder {
    /// Create a builder with no filters and no extractors
    pub fn new(combiner: Box<dyn EquivalenceCombiner>) -> Self {
        Self {
            combiner,
            filter: ConjunctiveFilter::new(),
            extractors: Vec::new(),
        }
    }

    /// Use `filter`
    pub fn with_filter(mut self, filter: ConjunctiveFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Append an extractor
    pub fn with_extractor(mut self, extractor: impl EquivalenceExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Combiner name
    pub fn combiner_name(&self) -> &str {
        self.combiner.name()
    }

    /// Build the result for `subject` from every generator and scorer output
    pub fn build(
        &self,
        run_id: RunId,
        subject: Arc<Content>,
        raw_scores: Vec<ScoredCandidates>,
    ) -> BuiltResult {
        let combined = if raw_scores.is_empty() {
            ScoredCandidates::new(EMPTY_COMBINATION)
        } else {
            self.combiner.combine(&raw_scores)
        };

        let outcome = self
            .filter
            .apply(&subject, combined.iter().filter(|c| c.score.is_real()).cloned());

        let mut bins: BTreeMap<Publisher, Vec<ScoredCandidate>> = BTreeMap::new();
        for candidate in outcome.accepted {
            bins.entry(candidate.publisher().clone())
                .or_default()
                .push(candidate);
        }

        let mut accepted = BTreeMap::new();
        for (publisher, mut candidates) in bins {
            candidates.sort_by(|a, b| {
                b.score
                    .rank_cmp(&a.score)
                    .then_with(|| a.uri().cmp(b.uri()))
            });
            let extracted = self.extract(&subject, &candidates);
            if !extracted.is_empty() {
                debug!(
                    subject = %subject.canonical_uri,
                    publisher = %publisher,
                    "Accepted {} of {} candidates",
                    extracted.len(),
                    candidates.len()
                );
                accepted.insert(publisher, extracted);
            }
        }

        BuiltResult {
            result: EquivalenceResult {
                run_id,
                subject,
                raw_scores,
                combined,
                accepted,
            },
            rejections: outcome.rejections,
        }
    }

    fn extract(&self, subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        for extractor in &self.extractors {
            let extracted: Vec<ScoredCandidate> = extractor
                .extract(subject, candidates)
                .into_iter()
                .filter(|c| c.score.is_real())
                .collect();
            if !extracted.is_empty() {
                return extracted;
            }
        }
        Vec::new()
    }
}
