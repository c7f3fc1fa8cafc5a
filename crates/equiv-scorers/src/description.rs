//! Description scorer

use crate::normalize::STOP_WORDS;
use crate::EquivalenceScorer;
use equiv_domain::{Content, Score};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static CAPITALISED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]\w*)\b").expect("capitalised word pattern is valid"));

/// Compares the capitalised words (names, places) of two descriptions
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionMatchingScorer;

impl DescriptionMatchingScorer {
    /// Name of the scores this scorer produces
    pub const NAME: &'static str = "Description Matching";

    /// Share of key words both descriptions must have in common
    pub const PROPORTION_THRESHOLD: f64 = 0.4;

    fn key_words(description: Option<&str>) -> BTreeSet<String> {
        description
            .map(|d| {
                CAPITALISED_WORD
                    .captures_iter(d)
                    .map(|c| c[1].to_lowercase())
                    .filter(|w| !STOP_WORDS.contains(&w.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Proportion of shared key words over all key words
    pub fn proportion(subject: Option<&str>, candidate: Option<&str>) -> f64 {
        let subject = Self::key_words(subject);
        let candidate = Self::key_words(candidate);
        let all = subject.union(&candidate).count();
        if all == 0 {
            return 0.0;
        }
        subject.intersection(&candidate).count() as f64 / all as f64
    }
}

impl EquivalenceScorer for DescriptionMatchingScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, subject: &Content, candidate: &Content) -> Score {
        let proportion = Self::proportion(
            subject.description.as_deref(),
            candidate.description.as_deref(),
        );
        if proportion > Self::PROPORTION_THRESHOLD {
            Score::ONE
        } else {
            Score::Unscored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equiv_domain::{ContentKind, Publisher};

    fn described(description: &str) -> Content {
        Content::new(1, "d", Publisher::new("test"), ContentKind::Item).with_description(description)
    }

    #[test]
    fn test_shared_names_match() {
        let subject = described("Sherlock and Watson travel to Dartmoor to meet Henry.");
        let candidate = described("In Dartmoor, Sherlock Holmes and Watson investigate.");
        assert_eq!(DescriptionMatchingScorer.score(&subject, &candidate), Score::ONE);
    }

    #[test]
    fn test_unrelated_descriptions_unscored() {
        let subject = described("Sherlock and Watson travel to Dartmoor.");
        let candidate = described("Fiona Bruce visits Exeter with Antiques Roadshow.");
        assert_eq!(DescriptionMatchingScorer.score(&subject, &candidate), Score::Unscored);
    }

    #[test]
    fn test_stop_words_not_counted() {
        let proportion = DescriptionMatchingScorer::proportion(Some("The Show"), Some("The Show"));
        assert_eq!(proportion, 0.0);
    }

    #[test]
    fn test_missing_description_unscored() {
        let bare = Content::new(2, "bare", Publisher::new("test"), ContentKind::Item);
        assert_eq!(
            DescriptionMatchingScorer.score(&bare, &described("Sherlock")),
            Score::Unscored
        );
    }
}
