//! Scored candidate sets

use crate::{Content, Publisher, Score};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A candidate and the score some component gave it
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// The candidate record
    pub candidate: Arc<Content>,
    /// Its score
    pub score: Score,
}

impl ScoredCandidate {
    /// Create a scored candidate
    pub fn new(candidate: Arc<Content>, score: Score) -> Self {
        Self { candidate, score }
    }

    /// Candidate key
    pub fn uri(&self) -> &str {
        &self.candidate.canonical_uri
    }

    /// Candidate publisher
    pub fn publisher(&self) -> &Publisher {
        &self.candidate.publisher
    }
}

/// One source's scores for a set of candidates
///
/// Candidates are keyed by canonical URI, so identity is stable however the
/// set was built. Adding the same candidate twice sums the scores, which is
/// how generators accumulate one match per broadcast or per alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidates {
    source: String,
    candidates: BTreeMap<String, ScoredCandidate>,
}

/// Per-candidate scores after combination
pub type CombinedScore = ScoredCandidates;

impl ScoredCandidates {
    /// Create an empty set labelled with its source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            candidates: BTreeMap::new(),
        }
    }

    /// Source label for diagnostics
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Add a candidate, summing with any score it already has
    pub fn add(&mut self, candidate: Arc<Content>, score: Score) {
        match self.candidates.get_mut(&candidate.canonical_uri) {
            Some(existing) => existing.score = existing.score.add(score),
            None => {
                self.candidates.insert(
                    candidate.canonical_uri.clone(),
                    ScoredCandidate::new(candidate, score),
                );
            }
        }
    }

    /// Set a candidate's score, replacing any existing one
    pub fn set(&mut self, candidate: Arc<Content>, score: Score) {
        self.candidates.insert(
            candidate.canonical_uri.clone(),
            ScoredCandidate::new(candidate, score),
        );
    }

    /// Look up a candidate by URI
    pub fn get(&self, uri: &str) -> Option<&ScoredCandidate> {
        self.candidates.get(uri)
    }

    /// Score for a candidate, if present
    pub fn score_for(&self, uri: &str) -> Option<Score> {
        self.candidates.get(uri).map(|c| c.score)
    }

    /// Whether the candidate is present
    pub fn contains(&self, uri: &str) -> bool {
        self.candidates.contains_key(uri)
    }

    /// Iterate in URI order
    pub fn iter(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.candidates.values()
    }

    /// Candidate records in URI order
    pub fn candidates(&self) -> impl Iterator<Item = &Arc<Content>> {
        self.candidates.values().map(|c| &c.candidate)
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether there are no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Remove a candidate by URI
    pub fn remove(&mut self, uri: &str) -> Option<ScoredCandidate> {
        self.candidates.remove(uri)
    }

    /// Keep only candidates matching `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&ScoredCandidate) -> bool) {
        self.candidates.retain(|_, c| keep(c));
    }

    /// Transform every score
    pub fn map_scores(mut self, mut f: impl FnMut(&ScoredCandidate) -> Score) -> Self {
        for candidate in self.candidates.values_mut() {
            candidate.score = f(candidate);
        }
        self
    }

    /// Candidates in descending score order, `Unscored` last, ties by URI
    pub fn ranked(&self) -> Vec<ScoredCandidate> {
        let mut ranked: Vec<ScoredCandidate> = self.candidates.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.score
                .rank_cmp(&a.score)
                .then_with(|| a.uri().cmp(b.uri()))
        });
        ranked
    }
}

impl IntoIterator for ScoredCandidates {
    type Item = ScoredCandidate;
    type IntoIter = std::collections::btree_map::IntoValues<String, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentKind;

    fn content(uri: &str) -> Arc<Content> {
        Arc::new(Content::new(
            1,
            uri,
            Publisher::new("p"),
            ContentKind::Item,
        ))
    }

    #[test]
    fn test_add_sums_repeated_candidates() {
        let mut scores = ScoredCandidates::new("broadcast");
        scores.add(content("a"), Score::ONE);
        scores.add(content("a"), Score::ONE);
        scores.add(content("b"), Score::Unscored);

        assert_eq!(scores.len(), 2);
        assert_eq!(scores.score_for("a"), Some(Score::Real(2.0)));
        assert_eq!(scores.score_for("b"), Some(Score::Unscored));
        assert_eq!(scores.score_for("c"), None);
    }

    #[test]
    fn test_set_replaces() {
        let mut scores = ScoredCandidates::new("s");
        scores.add(content("a"), Score::ONE);
        scores.set(content("a"), Score::Unscored);
        assert_eq!(scores.score_for("a"), Some(Score::Unscored));
    }

    #[test]
    fn test_ranked_is_descending_with_unscored_last() {
        let mut scores = ScoredCandidates::new("s");
        scores.add(content("low"), Score::Real(0.1));
        scores.add(content("none"), Score::Unscored);
        scores.add(content("high"), Score::Real(3.0));
        scores.add(content("also-high"), Score::Real(3.0));

        let ranked = scores.ranked();
        let uris: Vec<&str> = ranked.iter().map(|c| c.uri()).collect();
        assert_eq!(uris, vec!["also-high", "high", "low", "none"]);
    }

    #[test]
    fn test_map_scores() {
        let mut scores = ScoredCandidates::new("s");
        scores.add(content("a"), Score::Real(4.0));
        scores.add(content("b"), Score::Unscored);

        let halved = scores.map_scores(|c| c.score.map(|v| v / 2.0));
        assert_eq!(halved.score_for("a"), Some(Score::Real(2.0)));
        assert_eq!(halved.score_for("b"), Some(Score::Unscored));
    }
}
