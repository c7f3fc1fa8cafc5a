//! Word-set title scorer for broadcast items

use crate::normalize::{significant_words, TitleExpander};
use crate::EquivalenceScorer;
use equiv_domain::{Content, Score};

/// Scores 1.0 when the significant words of both titles are similar enough
/// by edit distance, otherwise the mismatch score
///
/// Similarity is `1 - distance / (len(a) + len(b))` over the sorted word
/// lists, so a threshold of 80 tolerates roughly one edit in ten characters.
#[derive(Debug, Clone)]
pub struct TitleSubsetScorer {
    mismatch: Score,
    threshold: f64,
    expander: TitleExpander,
}

impl TitleSubsetScorer {
    /// Name of the scores this scorer produces
    pub const NAME: &'static str = "LD-Broadcast-Title-Subset";

    /// Create a scorer; `percent_threshold` is clamped to 0..=100
    pub fn new(mismatch: Score, percent_threshold: u8) -> Self {
        Self {
            mismatch,
            threshold: f64::from(percent_threshold.min(100)) / 100.0,
            expander: TitleExpander::default(),
        }
    }

    /// Edit-distance similarity of two titles' word sets, in 0..=1
    pub fn similarity(&self, subject: &str, candidate: &str) -> f64 {
        let subject = significant_words(subject, &self.expander).join(" ");
        let candidate = significant_words(candidate, &self.expander).join(" ");

        let total = subject.chars().count() + candidate.chars().count();
        if total == 0 {
            return 1.0;
        }
        let distance = strsim::levenshtein(&subject, &candidate);
        1.0 - distance as f64 / total as f64
    }
}

impl EquivalenceScorer for TitleSubsetScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, subject: &Content, candidate: &Content) -> Score {
        match (subject.title(), candidate.title()) {
            (Some(s), Some(c)) if self.similarity(s, c) >= self.threshold => Score::ONE,
            _ => self.mismatch,
        }
    }
}
