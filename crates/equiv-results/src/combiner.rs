//! Combiners fold the outputs of every generator and scorer into one score
//! per candidate
//!
//! Candidate identity is the canonical URI, so the output never depends on
//! the order of the inputs.

use equiv_domain::{CombinedScore, Content, Publisher, Score, ScoredCandidates};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Folds many score sets into one
pub trait EquivalenceCombiner: Send + Sync {
    /// Component name used in logs
    fn name(&self) -> &str;

    /// Combine `scores` into one score per candidate
    fn combine(&self, scores: &[ScoredCandidates]) -> CombinedScore;
}

/// Distinct input sources in sorted order
fn source_label(scores: &[ScoredCandidates]) -> String {
    scores
        .iter()
        .map(ScoredCandidates::source)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join("/")
}

/// Every candidate with the real scores it received
fn tally(scores: &[ScoredCandidates]) -> BTreeMap<&str, (Arc<Content>, Vec<f64>)> {
    let mut totals: BTreeMap<&str, (Arc<Content>, Vec<f64>)> = BTreeMap::new();
    for candidate in scores.iter().flat_map(ScoredCandidates::iter) {
        let entry = totals
            .entry(candidate.uri())
            .or_insert_with(|| (Arc::clone(&candidate.candidate), Vec::new()));
        if let Score::Real(value) = candidate.score {
            entry.1.push(value);
        }
    }
    totals
}

/// Sum in ascending order so the result is the same for any input order
fn ordered_sum(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    values.iter().sum()
}

/// Sums real scores per candidate
///
/// `Unscored` contributes nothing. A candidate no input scored stays
/// `Unscored`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddingCombiner;

impl AddingCombiner {
    /// Create an adding combiner
    pub fn new() -> Self {
        Self
    }
}

impl EquivalenceCombiner for AddingCombiner {
    fn name(&self) -> &str {
        "Adding"
    }

    fn combine(&self, scores: &[ScoredCandidates]) -> CombinedScore {
        let mut combined = ScoredCandidates::new(source_label(scores));
        for (content, mut values) in tally(scores).into_values() {
            let score = if values.is_empty() {
                Score::Unscored
            } else {
                Score::Real(ordered_sum(&mut values))
            };
            combined.set(content, score);
        }
        combined
    }
}

/// Averages only the real scores each candidate received
///
/// The denominator is the number of real scores for the candidate, or, with
/// [`with_publisher_denominator`](Self::with_publisher_denominator), the
/// largest such count among candidates of the same publisher. A candidate
/// without any real score stays `Unscored`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScoreAwareAveragingCombiner {
    publisher_denominator: bool,
    ignore_sole_score: bool,
}

impl NullScoreAwareAveragingCombiner {
    /// Average over each candidate's own real scores
    pub fn new() -> Self {
        Self::default()
    }

    /// Divide by the highest real-score count among the candidate's publisher
    pub fn with_publisher_denominator(mut self) -> Self {
        self.publisher_denominator = true;
        self
    }

    /// Treat a candidate with exactly one real score as scoring zero
    pub fn ignoring_sole_score(mut self) -> Self {
        self.ignore_sole_score = true;
        self
    }
}

impl EquivalenceCombiner for NullScoreAwareAveragingCombiner {
    fn name(&self) -> &str {
        "Averaging"
    }

    fn combine(&self, scores: &[ScoredCandidates]) -> CombinedScore {
        let totals = tally(scores);

        let mut publisher_counts: BTreeMap<Publisher, usize> = BTreeMap::new();
        if self.publisher_denominator {
            for (content, values) in totals.values() {
                let max = publisher_counts.entry(content.publisher.clone()).or_default();
                *max = (*max).max(values.len());
            }
        }

        let mut combined = ScoredCandidates::new(source_label(scores));
        for (content, mut values) in totals.into_values() {
            let score = match values.len() {
                0 => Score::Unscored,
                1 if self.ignore_sole_score => Score::ZERO,
                count => {
                    let denominator = publisher_counts
                        .get(&content.publisher)
                        .copied()
                        .unwrap_or(count)
                        .max(count);
                    Score::Real(ordered_sum(&mut values) / denominator as f64)
                }
            };
            combined.set(content, score);
        }
        combined
    }
}

/// Test a required source's score must pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreThreshold {
    /// Real and strictly above the value
    GreaterThan(f64),
    /// Real and at least the value
    AtLeast(f64),
    /// Real and strictly positive
    Positive,
}

impl ScoreThreshold {
    /// Whether `score` passes
    pub fn passes(&self, score: Score) -> bool {
        match (self, score) {
            (_, Score::Unscored) => false,
            (ScoreThreshold::GreaterThan(t), Score::Real(v)) => v > *t,
            (ScoreThreshold::AtLeast(t), Score::Real(v)) => v >= *t,
            (ScoreThreshold::Positive, Score::Real(v)) => v > 0.0,
        }
    }
}

/// Gates another combiner on a required signal
///
/// Candidates without a passing score from at least one of the required
/// sources are set to `Unscored` after delegation. When none of the
/// required sources produced output at all, the delegate's result is
/// returned unchanged.
pub struct RequiredScoreFilteringCombiner {
    delegate: Box<dyn EquivalenceCombiner>,
    sources: BTreeSet<String>,
    threshold: ScoreThreshold,
}

impl RequiredScoreFilteringCombiner {
    /// Gate `delegate` on a positive score from `source`
    pub fn new(delegate: Box<dyn EquivalenceCombiner>, source: impl Into<String>) -> Self {
        Self {
            delegate,
            sources: BTreeSet::from([source.into()]),
            threshold: ScoreThreshold::Positive,
        }
    }

    /// Accept a passing score from any of `sources`
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Use a different threshold
    pub fn with_threshold(mut self, threshold: ScoreThreshold) -> Self {
        self.threshold = threshold;
        self
    }
}

impl EquivalenceCombiner for RequiredScoreFilteringCombiner {
    fn name(&self) -> &str {
        "RequiredScore"
    }

    fn combine(&self, scores: &[ScoredCandidates]) -> CombinedScore {
        let combined = self.delegate.combine(scores);

        let required: Vec<&ScoredCandidates> = scores
            .iter()
            .filter(|s| self.sources.contains(s.source()))
            .collect();
        if required.is_empty() {
            return combined;
        }

        let passing: BTreeSet<&str> = required
            .iter()
            .flat_map(|s| s.iter())
            .filter(|c| self.threshold.passes(c.score))
            .map(|c| c.uri())
            .collect();

        combined.map_scores(|candidate| {
            if passing.contains(candidate.uri()) {
                candidate.score
            } else {
                debug!(
                    candidate = candidate.uri(),
                    "No passing score from {:?}", self.sources
                );
                Score::Unscored
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equiv_domain::ContentKind;

    fn content(uri: &str, publisher: &str) -> Arc<Content> {
        Arc::new(Content::new(0, uri, Publisher::new(publisher), ContentKind::Episode))
    }

    fn scores(source: &str, entries: &[(&str, &str, Score)]) -> ScoredCandidates {
        let mut scores = ScoredCandidates::new(source);
        for (uri, publisher, score) in entries {
            scores.set(content(uri, publisher), *score);
        }
        scores
    }

    #[test]
    fn test_adding_ignores_unscored() {
        let inputs = vec![
            scores("title", &[("a", "pa", Score::Real(2.0)), ("b", "pa", Score::Unscored)]),
            scores("year", &[("a", "pa", Score::Unscored), ("b", "pa", Score::Unscored)]),
        ];
        let combined = AddingCombiner::new().combine(&inputs);

        assert_eq!(combined.source(), "title/year");
        assert_eq!(combined.score_for("a"), Some(Score::Real(2.0)));
        assert_eq!(combined.score_for("b"), Some(Score::Unscored));
    }

    #[test]
    fn test_combined_scores_do_not_depend_on_input_order() {
        let forward = vec![
            scores("title", &[("a", "pa", Score::Real(0.1))]),
            scores("year", &[("a", "pa", Score::Real(0.2))]),
            scores("sequence", &[("a", "pa", Score::Real(0.3))]),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let adding = AddingCombiner::new();
        assert_eq!(
            adding.combine(&forward).score_for("a"),
            adding.combine(&reversed).score_for("a")
        );

        let averaging = NullScoreAwareAveragingCombiner::new();
        assert_eq!(
            averaging.combine(&forward).score_for("a"),
            averaging.combine(&reversed).score_for("a")
        );
    }

    #[test]
    fn test_source_label_is_sorted_and_distinct() {
        let inputs = vec![
            scores("year", &[("a", "pa", Score::ONE)]),
            scores("title", &[("a", "pa", Score::ONE)]),
            scores("year", &[("b", "pa", Score::ONE)]),
        ];
        assert_eq!(AddingCombiner::new().combine(&inputs).source(), "title/year");
    }

    #[test]
    fn test_adding_keeps_negative_evidence() {
        let inputs = vec![
            scores("title", &[("a", "pa", Score::Real(2.0))]),
            scores("year", &[("a", "pa", Score::NEGATIVE_ONE)]),
        ];
        let combined = AddingCombiner::new().combine(&inputs);
        assert_eq!(combined.score_for("a"), Some(Score::ONE));
    }

    #[test]
    fn test_averaging_excludes_unscored_from_denominator() {
        let inputs = vec![
            scores("title", &[("a", "pa", Score::Real(2.0))]),
            scores("year", &[("a", "pa", Score::Unscored)]),
            scores("sequence", &[("a", "pa", Score::Unscored)]),
        ];
        let combined = NullScoreAwareAveragingCombiner::new().combine(&inputs);
        assert_eq!(combined.score_for("a"), Some(Score::Real(2.0)));
    }

    #[test]
    fn test_averaging_no_real_scores_is_unscored() {
        let inputs = vec![scores("title", &[("a", "pa", Score::Unscored)])];
        let combined = NullScoreAwareAveragingCombiner::new().combine(&inputs);
        assert_eq!(combined.score_for("a"), Some(Score::Unscored));
    }

    #[test]
    fn test_averaging_publisher_denominator() {
        let inputs = vec![
            scores("title", &[("a", "pa", Score::Real(1.0)), ("b", "pa", Score::Real(1.0))]),
            scores("year", &[("a", "pa", Score::Real(1.0)), ("b", "pa", Score::Unscored)]),
        ];

        let own = NullScoreAwareAveragingCombiner::new().combine(&inputs);
        assert_eq!(own.score_for("b"), Some(Score::Real(1.0)));

        let shared = NullScoreAwareAveragingCombiner::new()
            .with_publisher_denominator()
            .combine(&inputs);
        assert_eq!(shared.score_for("a"), Some(Score::Real(1.0)));
        assert_eq!(shared.score_for("b"), Some(Score::Real(0.5)));
    }

    #[test]
    fn test_averaging_ignoring_sole_score() {
        let inputs = vec![
            scores("title", &[("a", "pa", Score::Real(2.0)), ("b", "pa", Score::Real(2.0))]),
            scores("year", &[("b", "pa", Score::Real(1.0))]),
        ];
        let combined = NullScoreAwareAveragingCombiner::new()
            .ignoring_sole_score()
            .combine(&inputs);

        assert_eq!(combined.score_for("a"), Some(Score::ZERO));
        assert_eq!(combined.score_for("b"), Some(Score::Real(1.5)));
    }

    #[test]
    fn test_required_score_gate() {
        let inputs = vec![
            scores("Title", &[("a", "pa", Score::Real(2.0)), ("b", "pa", Score::ZERO)]),
            scores("broadcast", &[("a", "pa", Score::ONE), ("b", "pa", Score::ONE), ("c", "pa", Score::ONE)]),
        ];
        let combiner = RequiredScoreFilteringCombiner::new(Box::new(AddingCombiner), "Title");
        let combined = combiner.combine(&inputs);

        assert_eq!(combined.score_for("a"), Some(Score::Real(3.0)));
        assert_eq!(combined.score_for("b"), Some(Score::Unscored));
        assert_eq!(combined.score_for("c"), Some(Score::Unscored));
    }

    #[test]
    fn test_required_score_threshold() {
        let inputs = vec![scores(
            "Title",
            &[("a", "pa", Score::Real(2.0)), ("b", "pa", Score::Real(1.0))],
        )];
        let combiner = RequiredScoreFilteringCombiner::new(Box::new(AddingCombiner), "Title")
            .with_threshold(ScoreThreshold::AtLeast(2.0));
        let combined = combiner.combine(&inputs);

        assert_eq!(combined.score_for("a"), Some(Score::Real(2.0)));
        assert_eq!(combined.score_for("b"), Some(Score::Unscored));
    }

    #[test]
    fn test_required_source_absent_leaves_scores() {
        let inputs = vec![scores("broadcast", &[("a", "pa", Score::ONE)])];
        let combiner = RequiredScoreFilteringCombiner::new(Box::new(AddingCombiner), "Title");
        assert_eq!(combiner.combine(&inputs).score_for("a"), Some(Score::ONE));
    }

    #[test]
    fn test_score_threshold() {
        assert!(ScoreThreshold::GreaterThan(1.0).passes(Score::Real(1.5)));
        assert!(!ScoreThreshold::GreaterThan(1.0).passes(Score::ONE));
        assert!(ScoreThreshold::AtLeast(1.0).passes(Score::ONE));
        assert!(!ScoreThreshold::Positive.passes(Score::ZERO));
        assert!(!ScoreThreshold::AtLeast(-5.0).passes(Score::Unscored));
    }
}
