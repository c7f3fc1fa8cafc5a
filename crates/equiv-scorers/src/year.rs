//! Release-year scorer

use crate::EquivalenceScorer;
use equiv_domain::{Content, Score};

/// Compares release years within a tolerance
#[derive(Debug, Clone, Copy)]
pub struct ReleaseYearScorer {
    matched: Score,
    mismatched: Score,
    missing: Score,
    tolerance: u32,
}

impl Default for ReleaseYearScorer {
    fn default() -> Self {
        Self::new(Score::ONE, Score::NEGATIVE_ONE)
    }
}

impl ReleaseYearScorer {
    /// Name of the scores this scorer produces
    pub const NAME: &'static str = "Year";

    /// Create a scorer with a tolerance of one year
    pub fn new(matched: Score, mismatched: Score) -> Self {
        Self {
            matched,
            mismatched,
            missing: Score::Unscored,
            tolerance: 1,
        }
    }

    /// Years further apart than `tolerance` are a mismatch
    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Score used when either year is missing
    pub fn with_missing(mut self, missing: Score) -> Self {
        self.missing = missing;
        self
    }
}

impl EquivalenceScorer for ReleaseYearScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, subject: &Content, candidate: &Content) -> Score {
        match (subject.year, candidate.year) {
            (Some(a), Some(b)) if a.abs_diff(b) <= self.tolerance => self.matched,
            (Some(_), Some(_)) => self.mismatched,
            _ => self.missing,
        }
    }
}
