//! Generators that propagate earlier decisions between containers and items

use crate::{EquivalenceGenerator, GeneratorError};
use async_trait::async_trait;
use equiv_domain::traits::{ContentResolver, EquivalenceSummaryStore};
use equiv_domain::{Content, Score, ScoredCandidates};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Proposes the containers a container's children were matched into
///
/// Every accepted equivalent of every child that has a summary votes for
/// its parent. A container scores the share of children that voted for it,
/// capped at 1.0.
pub struct ContainerChildGenerator {
    resolver: Arc<dyn ContentResolver>,
    summaries: Arc<dyn EquivalenceSummaryStore>,
}

impl ContainerChildGenerator {
    /// Source label
    pub const NAME: &'static str = "Item";

    /// Create a generator
    pub fn new(
        resolver: Arc<dyn ContentResolver>,
        summaries: Arc<dyn EquivalenceSummaryStore>,
    ) -> Self {
        Self { resolver, summaries }
    }
}

#[async_trait]
impl EquivalenceGenerator for ContainerChildGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate(&self, subject: &Content) -> Result<ScoredCandidates, GeneratorError> {
        let mut scores = ScoredCandidates::new(Self::NAME);
        if subject.children.is_empty() {
            return Ok(scores);
        }

        let summaries = self.summaries.summaries_for_uris(&subject.children).await?;
        if summaries.is_empty() {
            debug!("No child summaries for {}", subject.canonical_uri);
            return Ok(scores);
        }

        let mut votes: BTreeMap<String, usize> = BTreeMap::new();
        for parent in summaries
            .values()
            .flat_map(|summary| summary.all_equivalents())
            .filter_map(|equivalent| equivalent.parent_uri.clone())
        {
            *votes.entry(parent).or_default() += 1;
        }

        let parents: Vec<String> = votes.keys().cloned().collect();
        let children = summaries.len() as f64;
        for container in self.resolver.resolve_uris(&parents).await? {
            if !container.is_container() || !container.actively_published {
                continue;
            }
            if let Some(&count) = votes.get(&container.canonical_uri) {
                let score = Score::Real((count as f64 / children).min(1.0));
                scores.set(container, score);
            }
        }

        Ok(scores)
    }
}

/// Proposes items under the containers the subject's own container was
/// previously matched against
///
/// The containers come from the candidate list of the parent's summary, not
/// only its accepted equivalents. Items are emitted unscored; scorers decide.
pub struct ContainerCandidatesItemGenerator {
    resolver: Arc<dyn ContentResolver>,
    summaries: Arc<dyn EquivalenceSummaryStore>,
}

impl ContainerCandidatesItemGenerator {
    /// Source label
    pub const NAME: &'static str = "Container";

    /// Create a generator
    pub fn new(
        resolver: Arc<dyn ContentResolver>,
        summaries: Arc<dyn EquivalenceSummaryStore>,
    ) -> Self {
        Self { resolver, summaries }
    }
}

#[async_trait]
impl EquivalenceGenerator for ContainerCandidatesItemGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate(&self, subject: &Content) -> Result<ScoredCandidates, GeneratorError> {
        let mut scores = ScoredCandidates::new(Self::NAME);
        let Some(parent) = &subject.container else {
            return Ok(scores);
        };

        let mut summaries = self
            .summaries
            .summaries_for_uris(std::slice::from_ref(parent))
            .await?;
        let Some(summary) = summaries.remove(parent) else {
            debug!("No summary for container {}", parent);
            return Ok(scores);
        };

        let children: Vec<String> = self
            .resolver
            .resolve_uris(&summary.candidates)
            .await?
            .iter()
            .filter(|candidate| candidate.is_container())
            .flat_map(|container| container.children.iter().cloned())
            .collect();
        if children.is_empty() {
            return Ok(scores);
        }

        for item in self.resolver.resolve_uris(&children).await? {
            if item.is_container()
                || !item.actively_published
                || item.canonical_uri == subject.canonical_uri
            {
                continue;
            }
            scores.set(item, Score::Unscored);
        }

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equiv_domain::{ContentKind, ContentRef, EquivalenceSummary, Publisher};
    use equiv_store::InMemoryStore;

    fn brand(uri: &str, publisher: &str, children: &[&str]) -> Content {
        children.iter().fold(
            Content::new(0, uri, Publisher::new(publisher), ContentKind::Brand),
            |c, child| c.with_child(*child),
        )
    }

    fn episode(uri: &str, publisher: &str, container: &str) -> Content {
        Content::new(0, uri, Publisher::new(publisher), ContentKind::Episode)
            .with_container(container)
    }

    fn summary(subject: &str, candidates: &[&str], equivalents: &[(&str, &str, &str)]) -> EquivalenceSummary {
        let mut by_publisher: BTreeMap<Publisher, Vec<ContentRef>> = BTreeMap::new();
        for (uri, publisher, parent) in equivalents {
            by_publisher
                .entry(Publisher::new(*publisher))
                .or_default()
                .push(ContentRef {
                    canonical_uri: uri.to_string(),
                    publisher: Publisher::new(*publisher),
                    parent_uri: Some(parent.to_string()),
                });
        }
        EquivalenceSummary {
            subject: subject.to_string(),
            parent: None,
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            equivalents: by_publisher,
        }
    }

    fn with_ids(contents: Vec<Content>) -> InMemoryStore {
        contents
            .into_iter()
            .enumerate()
            .fold(InMemoryStore::new(), |store, (id, mut content)| {
                content.id = id as u64 + 1;
                store.with_content(content)
            })
    }

    #[tokio::test]
    async fn test_container_child_votes() {
        let store = with_ids(vec![
            brand("pa/brand", "pa", &["pa/e1", "pa/e2"]),
            brand("bbc/brand", "bbc", &[]),
            brand("bbc/other", "bbc", &[]),
        ])
        .with_summary(summary("pa/e1", &[], &[("bbc/e1", "bbc", "bbc/brand")]))
        .with_summary(summary(
            "pa/e2",
            &[],
            &[("bbc/e2", "bbc", "bbc/brand"), ("itv/e2", "itv", "bbc/other")],
        ));
        let store = Arc::new(store);
        let subject = store.content("pa/brand").unwrap();

        let scores = ContainerChildGenerator::new(store.clone(), store)
            .generate(&subject)
            .await
            .unwrap();

        assert_eq!(scores.score_for("bbc/brand"), Some(Score::ONE));
        assert_eq!(scores.score_for("bbc/other"), Some(Score::Real(0.5)));
    }

    #[tokio::test]
    async fn test_container_child_skips_items_and_unpublished() {
        let store = with_ids(vec![
            brand("pa/brand", "pa", &["pa/e1"]),
            brand("bbc/gone", "bbc", &[]).unpublished(),
            episode("bbc/not-a-container", "bbc", "x"),
        ])
        .with_summary(summary(
            "pa/e1",
            &[],
            &[
                ("bbc/e1", "bbc", "bbc/gone"),
                ("bbc/e2", "bbc", "bbc/not-a-container"),
            ],
        ));
        let store = Arc::new(store);
        let subject = store.content("pa/brand").unwrap();

        let scores = ContainerChildGenerator::new(store.clone(), store)
            .generate(&subject)
            .await
            .unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_container_candidates_items() {
        let store = with_ids(vec![
            brand("pa/brand", "pa", &["pa/e1"]),
            episode("pa/e1", "pa", "pa/brand"),
            brand("bbc/brand", "bbc", &["bbc/e1", "bbc/e2", "bbc/e3"]),
            episode("bbc/e1", "bbc", "bbc/brand"),
            episode("bbc/e2", "bbc", "bbc/brand").unpublished(),
            episode("bbc/e3", "bbc", "bbc/brand"),
        ])
        .with_summary(summary("pa/brand", &["bbc/brand", "bbc/e1"], &[]));
        let store = Arc::new(store);
        let subject = store.content("pa/e1").unwrap();

        let scores = ContainerCandidatesItemGenerator::new(store.clone(), store)
            .generate(&subject)
            .await
            .unwrap();

        assert_eq!(scores.source(), ContainerCandidatesItemGenerator::NAME);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.score_for("bbc/e1"), Some(Score::Unscored));
        assert_eq!(scores.score_for("bbc/e3"), Some(Score::Unscored));
    }

    #[tokio::test]
    async fn test_container_candidates_without_summary() {
        let store = Arc::new(with_ids(vec![episode("pa/e1", "pa", "pa/brand")]));
        let subject = store.content("pa/e1").unwrap();

        let scores = ContainerCandidatesItemGenerator::new(store.clone(), store)
            .generate(&subject)
            .await
            .unwrap();
        assert!(scores.is_empty());
    }
}
