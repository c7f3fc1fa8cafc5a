//! Title scorers

use crate::normalize::{
    apply_common_replacements, remove_common_prefixes, remove_sequence_prefix,
    replace_special_chars, strip_accents, TitleExpander, NON_ALPHANUMERIC,
};
use crate::EquivalenceScorer;
use equiv_domain::{Content, Score};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static DATE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}/\d{1,2}/(\d{2}|\d{4})$").expect("date title pattern is valid")
});

static SEQUENCE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([Ee]pisode).*(\d+)$").expect("sequence title pattern is valid")
});

/// A word ending in an apostrophe, e.g. "Bob' Burgers"
static TRAILING_APOSTROPHE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w' ").expect("apostrophe pattern is valid"));

const RATING_POSTFIXES: &[&str] = &["(Unrated)", "(Rated)"];

/// Broad shape of a title; titles of different shapes never match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleShape {
    /// A bare date such as `12/03/2011`
    Date,
    /// A generic "Episode 12" title
    Sequence,
    /// Anything else
    Default,
}

impl TitleShape {
    /// Classify a title
    pub fn of(title: &str) -> Self {
        if DATE_TITLE.is_match(title) {
            TitleShape::Date
        } else if SEQUENCE_TITLE.is_match(title) {
            TitleShape::Sequence
        } else {
            TitleShape::Default
        }
    }
}

/// Item title scorer
///
/// Scores 2.0 when the titles agree after normalisation, 1.0 when only the
/// parts before a colon agree and the mismatch score otherwise.
#[derive(Debug, Clone)]
pub struct TitleMatchingScorer {
    mismatch: Score,
    expander: TitleExpander,
}

impl Default for TitleMatchingScorer {
    fn default() -> Self {
        Self::new(Score::Unscored)
    }
}

impl TitleMatchingScorer {
    /// Name of the scores this scorer produces
    pub const NAME: &'static str = "Title";

    /// Score given to a full match
    pub const PERFECT_MATCH: Score = Score::Real(2.0);

    /// Create a scorer with the given score for mismatched titles
    pub fn new(mismatch: Score) -> Self {
        Self {
            mismatch,
            expander: TitleExpander::default(),
        }
    }

    fn compare(
        &self,
        subject: &Content,
        candidate: &Content,
        subject_title: &str,
        candidate_title: &str,
    ) -> Score {
        if subject_title == candidate_title {
            return Self::PERFECT_MATCH;
        }
        if TitleShape::of(subject_title) != TitleShape::of(candidate_title) {
            return Score::Unscored;
        }

        let subject_title = remove_postfixes(subject_title, subject.year);
        let candidate_title = remove_postfixes(candidate_title, candidate.year);

        if self.titles_match(&subject_title, &candidate_title) {
            Self::PERFECT_MATCH
        } else {
            self.partial_score(&subject_title, &candidate_title)
        }
    }

    fn titles_match(&self, subject: &str, candidate: &str) -> bool {
        let normalized_subject = self.normalize(subject);
        let normalized_candidate = self.normalize(candidate);

        if TRAILING_APOSTROPHE.is_match(subject) {
            apostrophe_pattern_matches(subject, &normalized_candidate)
        } else if TRAILING_APOSTROPHE.is_match(candidate) {
            apostrophe_pattern_matches(candidate, &normalized_subject)
        } else {
            normalized_subject == normalized_candidate
                || normalized_subject.replace('-', "") == normalized_candidate.replace('-', "")
        }
    }

    /// Compare only what precedes a colon
    fn partial_score(&self, subject: &str, candidate: &str) -> Score {
        let subject = self.normalize_words(subject.trim_start_matches(':'));
        let candidate = self.normalize_words(candidate.trim_start_matches(':'));

        let matched = match (subject.split_once(':'), candidate.split_once(':')) {
            (Some((s, _)), Some((c, _))) => s == c,
            (Some((s, _)), None) if subject.len() > candidate.len() => s == candidate,
            (_, Some((c, _))) => c == subject,
            _ => return self.mismatch,
        };

        if matched {
            Score::ONE
        } else {
            self.mismatch
        }
    }

    fn normalize_words(&self, title: &str) -> String {
        let title = remove_sequence_prefix(title);
        let title = self.expander.expand(&title);
        strip_accents(&remove_common_prefixes(&title))
    }

    fn normalize(&self, title: &str) -> String {
        replace_special_chars(&self.normalize_words(title))
    }
}

impl EquivalenceScorer for TitleMatchingScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, subject: &Content, candidate: &Content) -> Score {
        let (Some(subject_title), Some(candidate_title)) = (subject.title(), candidate.title())
        else {
            return Score::Unscored;
        };
        let score = self.compare(subject, candidate, subject_title, candidate_title);
        debug!("{} ({}) scored {}", candidate_title, candidate.canonical_uri, score);
        score
    }
}

fn remove_postfixes(title: &str, year: Option<i32>) -> String {
    let mut title = match year {
        Some(year) => title.replace(&format!("({})", year), ""),
        None => title.to_string(),
    };
    for postfix in RATING_POSTFIXES {
        title = title.replace(postfix, "");
    }
    title.trim().to_string()
}

/// Match `normalized` against a pattern built from `title`, where a word
/// ending in an apostrophe may be followed by any word suffix
fn apostrophe_pattern_matches(title: &str, normalized: &str) -> bool {
    let lowered = remove_common_prefixes(&remove_sequence_prefix(title).to_lowercase());
    let replaced = apply_common_replacements(&lowered);
    let dashed = NON_ALPHANUMERIC.replace_all(&replaced, "-");

    let mut pattern = String::from("^");
    for (i, word) in dashed.split(' ').enumerate() {
        if i > 0 {
            pattern.push_str(r"\-");
        }
        match word.strip_suffix('\'') {
            Some(stem) => {
                pattern.push_str(&regex::escape(stem));
                pattern.push_str(r"(\w+|\W*)");
            }
            None => pattern.push_str(&regex::escape(&word.replace('\'', ""))),
        }
    }
    pattern.push('$');

    Regex::new(&pattern)
        .map(|re| re.is_match(normalized))
        .unwrap_or(false)
}

/// Title scorer for search candidates
///
/// Equal normalised titles score the exact-match score. Otherwise the score
/// decays exponentially with how much of the longer title lies beyond the
/// common prefix.
#[derive(Debug, Clone)]
pub struct ContentTitleScorer {
    name: String,
    exact_match: f64,
    expander: TitleExpander,
}

impl ContentTitleScorer {
    /// Decay applied per unit of divergence
    pub const DECAY_RATE: f64 = 4.0;

    /// Create a scorer
    pub fn new(name: impl Into<String>, exact_match: f64) -> Self {
        Self {
            name: name.into(),
            exact_match,
            expander: TitleExpander::default(),
        }
    }

    /// Normalised form used for comparison
    pub fn normalize(&self, title: &str) -> String {
        let title = self.expander.expand(title);
        replace_special_chars(&strip_accents(&remove_common_prefixes(&title)))
            .replace('-', "")
    }

    /// Score two raw titles
    pub fn score_titles(&self, subject: &str, candidate: &str) -> Score {
        let subject = self.normalize(subject);
        let candidate = self.normalize(candidate);
        if subject.is_empty() || candidate.is_empty() {
            return Score::Unscored;
        }
        if subject == candidate {
            return Score::Real(self.exact_match);
        }

        let common = subject
            .chars()
            .zip(candidate.chars())
            .take_while(|(a, b)| a == b)
            .count();
        if common == 0 {
            return Score::ZERO;
        }

        let longer = subject.chars().count().max(candidate.chars().count()) as f64;
        let divergence = (longer - common as f64) / longer;
        Score::Real(self.exact_match * (-Self::DECAY_RATE * divergence).exp())
    }
}

impl EquivalenceScorer for ContentTitleScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, subject: &Content, candidate: &Content) -> Score {
        match (subject.title(), candidate.title()) {
            (Some(subject), Some(candidate)) => self.score_titles(subject, candidate),
            _ => Score::Unscored,
        }
    }
}
