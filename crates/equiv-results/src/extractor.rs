//! Extractors decide which filtered candidates become equivalents
//!
//! An extractor sees one publisher's candidates at a time, sorted by
//! descending combined score. `Unscored` candidates are never accepted.

use crate::error::{finite, ResultsError};
use chrono::Duration;
use equiv_domain::{Broadcast, Content, Score, ScoredCandidate};

/// Picks the accepted candidates from one publisher's ranked list
pub trait EquivalenceExtractor: Send + Sync {
    /// Component name used in logs
    fn name(&self) -> &str;

    /// Accepted candidates from `candidates`, which are sorted by
    /// descending score
    fn extract(&self, subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate>;
}

fn value(candidate: &ScoredCandidate) -> Option<f64> {
    candidate.score.value()
}

fn at_least(candidates: &[ScoredCandidate], threshold: f64) -> Vec<ScoredCandidate> {
    candidates
        .iter()
        .filter(|c| value(c).is_some_and(|v| v >= threshold))
        .cloned()
        .collect()
}

fn best(candidates: &[ScoredCandidate]) -> Option<(&ScoredCandidate, f64)> {
    candidates
        .iter()
        .filter_map(|c| value(c).map(|v| (c, v)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Accepts every candidate at or above an absolute threshold
///
/// Several candidates from one publisher may be accepted.
#[derive(Debug, Clone, Copy)]
pub struct AllOverOrEqThresholdExtractor {
    threshold: f64,
}

impl AllOverOrEqThresholdExtractor {
    /// Accept scores of at least `threshold`
    pub fn new(threshold: f64) -> Result<Self, ResultsError> {
        Ok(Self {
            threshold: finite(threshold)?,
        })
    }

    /// The threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl EquivalenceExtractor for AllOverOrEqThresholdExtractor {
    fn name(&self) -> &str {
        "AllOverOrEqThreshold"
    }

    fn extract(&self, _subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        at_least(candidates, self.threshold)
    }
}

/// Tries thresholds in priority order and accepts at the first one that
/// yields anything
///
/// With `[10.0, 4.0]` an identifier-strength match wins over weaker
/// broadcast evidence; the weaker candidates are only taken when no
/// candidate reaches 10.
#[derive(Debug, Clone)]
pub struct HighestNonEmptyThresholdExtractor {
    thresholds: Vec<f64>,
}

impl HighestNonEmptyThresholdExtractor {
    /// Create from thresholds in priority order
    pub fn new(thresholds: Vec<f64>) -> Result<Self, ResultsError> {
        if thresholds.is_empty() {
            return Err(ResultsError::NoStages("HighestNonEmptyThreshold"));
        }
        for threshold in &thresholds {
            finite(*threshold)?;
        }
        Ok(Self { thresholds })
    }
}

impl EquivalenceExtractor for HighestNonEmptyThresholdExtractor {
    fn name(&self) -> &str {
        "HighestNonEmptyThreshold"
    }

    fn extract(&self, _subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        self.thresholds
            .iter()
            .map(|threshold| at_least(candidates, *threshold))
            .find(|accepted| !accepted.is_empty())
            .unwrap_or_default()
    }
}

/// Accepts every candidate within a percentage of the best positive score
#[derive(Debug, Clone, Copy)]
pub struct PercentOfBestExtractor {
    fraction: f64,
}

impl PercentOfBestExtractor {
    /// Accept scores of at least `percent`% of the best
    pub fn new(percent: f64) -> Result<Self, ResultsError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ResultsError::InvalidPercentage(percent));
        }
        Ok(Self {
            fraction: percent / 100.0,
        })
    }
}

impl EquivalenceExtractor for PercentOfBestExtractor {
    fn name(&self) -> &str {
        "PercentOfBest"
    }

    fn extract(&self, _subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        match best(candidates) {
            Some((_, top)) if top > 0.0 => at_least(candidates, top * self.fraction),
            _ => Vec::new(),
        }
    }
}

/// Accepts only the best candidate, and only when it beats the runner-up by
/// a multiplicative margin
///
/// A best score of 5.0 against a runner-up of 4.9 fails a 1.5 margin, since
/// 4.9 × 1.5 = 7.35. A lone positive candidate is accepted.
#[derive(Debug, Clone, Copy)]
pub struct PercentAboveNextBestExtractor {
    margin: f64,
}

impl PercentAboveNextBestExtractor {
    /// Require the best to be at least `margin` times the runner-up
    pub fn new(margin: f64) -> Result<Self, ResultsError> {
        if !margin.is_finite() || margin < 1.0 {
            return Err(ResultsError::InvalidMargin(margin));
        }
        Ok(Self { margin })
    }
}

impl EquivalenceExtractor for PercentAboveNextBestExtractor {
    fn name(&self) -> &str {
        "PercentAboveNextBest"
    }

    fn extract(&self, _subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        let mut real = candidates.iter().filter_map(|c| value(c).map(|v| (c, v)));
        let Some((first, top)) = real.next() else {
            return Vec::new();
        };
        if top <= 0.0 {
            return Vec::new();
        }
        match real.next() {
            Some((_, next)) if top < next * self.margin => Vec::new(),
            _ => vec![first.clone()],
        }
    }
}

/// Runs delegates in order and returns the first non-empty result
///
/// Typically a strict stage followed by a looser fallback.
pub struct MultiStageExtractor {
    stages: Vec<Box<dyn EquivalenceExtractor>>,
}

impl MultiStageExtractor {
    /// Create from stages in priority order
    pub fn new(stages: Vec<Box<dyn EquivalenceExtractor>>) -> Result<Self, ResultsError> {
        if stages.is_empty() {
            return Err(ResultsError::NoStages("MultiStage"));
        }
        Ok(Self { stages })
    }
}

impl EquivalenceExtractor for MultiStageExtractor {
    fn name(&self) -> &str {
        "MultiStage"
    }

    fn extract(&self, subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        self.stages
            .iter()
            .map(|stage| stage.extract(subject, candidates))
            .find(|accepted| !accepted.is_empty())
            .unwrap_or_default()
    }
}

const MULTIPLE_SCORE_SPREAD: f64 = 0.3;
const MULTIPLE_BROADCAST_FLEXIBILITY_MINUTES: i64 = 5;

/// Accepts several items from one publisher when they share the subject's
/// airtime
///
/// Covers a programme split into parts by one publisher. Never applies to
/// containers. Besides the top candidate, an item qualifies if its score is
/// within 0.3 of the best and one of its broadcasts contains, or is
/// contained by, one of the subject's broadcasts, give or take five
/// minutes. Yields nothing unless at least two candidates qualify.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipleCandidateExtractor;

impl MultipleCandidateExtractor {
    fn contained(inner: &Broadcast, outer: &Broadcast) -> bool {
        let flexibility = Duration::minutes(MULTIPLE_BROADCAST_FLEXIBILITY_MINUTES);
        inner.start > outer.start - flexibility && inner.end < outer.end + flexibility
    }

    fn shares_airtime(subject: &Content, candidate: &Content) -> bool {
        subject.broadcasts().any(|s| {
            candidate
                .broadcasts()
                .any(|c| Self::contained(c, s) || Self::contained(s, c))
        })
    }
}

impl EquivalenceExtractor for MultipleCandidateExtractor {
    fn name(&self) -> &str {
        "MultipleCandidate"
    }

    fn extract(&self, subject: &Content, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        if subject.is_container() {
            return Vec::new();
        }
        let Some(top) = candidates.first() else {
            return Vec::new();
        };
        let Score::Real(top_score) = top.score else {
            return Vec::new();
        };
        if top.candidate.is_container() {
            return Vec::new();
        }

        let mut accepted = vec![top.clone()];
        for candidate in &candidates[1..] {
            let close = value(candidate)
                .is_some_and(|v| (v - top_score).abs() < MULTIPLE_SCORE_SPREAD);
            if close
                && !candidate.candidate.is_container()
                && Self::shares_airtime(subject, &candidate.candidate)
            {
                accepted.push(candidate.clone());
            }
        }

        if accepted.len() > 1 {
            accepted
        } else {
            Vec::new()
        }
    }
}
