//! Pipeline outputs and previously persisted equivalence summaries

use crate::{CombinedScore, Content, Publisher, RunId, ScoredCandidate, ScoredCandidates};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of one pipeline run over one subject
///
/// Handed to result handlers once the run completes; never mutated after.
#[derive(Debug, Clone)]
pub struct EquivalenceResult {
    /// Run that produced this result
    pub run_id: RunId,

    /// The subject
    pub subject: Arc<Content>,

    /// Every generator and scorer output, in configuration order
    pub raw_scores: Vec<ScoredCandidates>,

    /// Scores after combination and before filtering
    pub combined: CombinedScore,

    /// Accepted candidates, binned by publisher
    pub accepted: BTreeMap<Publisher, Vec<ScoredCandidate>>,
}

impl EquivalenceResult {
    /// All accepted candidates across publishers
    pub fn accepted_candidates(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.accepted.values().flatten()
    }

    /// URIs of all accepted candidates
    pub fn accepted_uris(&self) -> Vec<&str> {
        self.accepted_candidates().map(|c| c.uri()).collect()
    }

    /// Whether `uri` was accepted
    pub fn is_accepted(&self, uri: &str) -> bool {
        self.accepted_candidates().any(|c| c.uri() == uri)
    }

    /// Copy of this result with a different accepted set
    pub fn with_accepted(&self, accepted: BTreeMap<Publisher, Vec<ScoredCandidate>>) -> Self {
        Self {
            accepted,
            ..self.clone()
        }
    }
}

/// Reference to a record without its body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    /// Canonical URI
    pub canonical_uri: String,
    /// Publisher
    pub publisher: Publisher,
    /// Parent container URI, when the record has one
    #[serde(default)]
    pub parent_uri: Option<String>,
}

impl ContentRef {
    /// Reference a record
    pub fn of(content: &Content) -> Self {
        Self {
            canonical_uri: content.canonical_uri.clone(),
            publisher: content.publisher.clone(),
            parent_uri: content.container.clone(),
        }
    }
}

/// Previously persisted equivalence decision for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceSummary {
    /// URI of the record the summary describes
    pub subject: String,

    /// Its parent container URI
    #[serde(default)]
    pub parent: Option<String>,

    /// Every candidate that was considered
    #[serde(default)]
    pub candidates: Vec<String>,

    /// Accepted equivalents per publisher
    #[serde(default)]
    pub equivalents: BTreeMap<Publisher, Vec<ContentRef>>,
}

impl EquivalenceSummary {
    /// Build a summary from a completed result
    pub fn from_result(result: &EquivalenceResult) -> Self {
        Self {
            subject: result.subject.canonical_uri.clone(),
            parent: result.subject.container.clone(),
            candidates: result
                .combined
                .iter()
                .map(|c| c.uri().to_string())
                .collect(),
            equivalents: result
                .accepted
                .iter()
                .map(|(publisher, accepted)| {
                    (
                        publisher.clone(),
                        accepted.iter().map(|c| ContentRef::of(&c.candidate)).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Every accepted equivalent regardless of publisher
    pub fn all_equivalents(&self) -> impl Iterator<Item = &ContentRef> {
        self.equivalents.values().flatten()
    }
}
