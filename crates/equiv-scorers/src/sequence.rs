//! Episode sequence scorer

use crate::EquivalenceScorer;
use equiv_domain::{Content, ContentKind, Score};

/// Scores episodes that sit at the same position in their series
///
/// Both must be episodes, both or neither must be children of a top-level
/// series, series numbers must be equal (both absent counts as equal) and
/// episode numbers must be present and equal. Anything else is unscored.
#[derive(Debug, Clone, Copy)]
pub struct SequenceScorer {
    matched: Score,
}

impl Default for SequenceScorer {
    fn default() -> Self {
        Self::new(Score::ONE)
    }
}

impl SequenceScorer {
    /// Name of the scores this scorer produces
    pub const NAME: &'static str = "Sequence";

    /// Create a scorer awarding `matched` on a sequence match
    pub fn new(matched: Score) -> Self {
        Self { matched }
    }
}

impl EquivalenceScorer for SequenceScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, subject: &Content, candidate: &Content) -> Score {
        if subject.kind != ContentKind::Episode || candidate.kind != ContentKind::Episode {
            return Score::Unscored;
        }
        if subject.is_child_of_top_level_series() != candidate.is_child_of_top_level_series() {
            return Score::Unscored;
        }

        let same_series = subject.series_number == candidate.series_number;
        let same_episode =
            subject.episode_number.is_some() && subject.episode_number == candidate.episode_number;

        if same_series && same_episode {
            self.matched
        } else {
            Score::Unscored
        }
    }
}
