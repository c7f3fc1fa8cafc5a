//! Title search generator

use crate::{EquivalenceGenerator, GeneratorError, TitleSearchConfig};
use async_trait::async_trait;
use equiv_domain::traits::{SearchQuery, SearchResolver};
use equiv_domain::{Content, Publisher, ScoredCandidates};
use equiv_scorers::normalize::TitleExpander;
use equiv_scorers::{ContentTitleScorer, EquivalenceScorer};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Rating markers that only add noise to a title search
const RATING_TOKENS: &[&str] = &["(unrated)", "(rated)", "unrated", "rated"];

/// Searches the title index for the subject's title
///
/// The title is searched as given and, when abbreviation expansion changes
/// it, once more in expanded form. Results must be actively published, of
/// the same structural kind as the subject and from a publisher other than
/// the subject's. Each result is scored by title similarity.
pub struct TitleSearchGenerator {
    search: Arc<dyn SearchResolver>,
    publishers: BTreeSet<Publisher>,
    config: TitleSearchConfig,
    scorer: ContentTitleScorer,
    expander: TitleExpander,
}

impl TitleSearchGenerator {
    /// Source label
    pub const NAME: &'static str = "Title";

    /// Create a generator searching `publishers`
    pub fn new(
        search: Arc<dyn SearchResolver>,
        publishers: BTreeSet<Publisher>,
        config: TitleSearchConfig,
    ) -> Self {
        let scorer = ContentTitleScorer::new(Self::NAME, config.exact_match_score);
        Self {
            search,
            publishers,
            config,
            scorer,
            expander: TitleExpander::default(),
        }
    }

    /// Lowercased title with rating markers removed
    pub fn query_title(title: &str) -> String {
        title
            .to_lowercase()
            .split_whitespace()
            .filter(|word| !RATING_TOKENS.contains(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn query(&self, title: String, subject: &Content, publishers: &BTreeSet<Publisher>) -> SearchQuery {
        SearchQuery {
            title,
            publishers: publishers.clone(),
            specialization: subject.specialization,
            limit: self.config.search_limit,
        }
    }
}

#[async_trait]
impl EquivalenceGenerator for TitleSearchGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate(&self, subject: &Content) -> Result<ScoredCandidates, GeneratorError> {
        let mut scores = ScoredCandidates::new(Self::NAME);

        let Some(title) = subject.title() else {
            debug!("{} has no title to search for", subject.canonical_uri);
            return Ok(scores);
        };

        let publishers: BTreeSet<Publisher> = self
            .publishers
            .iter()
            .filter(|p| **p != subject.publisher)
            .cloned()
            .collect();
        if publishers.is_empty() {
            return Ok(scores);
        }

        let title = Self::query_title(title);
        if title.is_empty() {
            return Ok(scores);
        }
        let expanded = self.expander.expand(&title);

        let mut results = self
            .search
            .search(&self.query(title.clone(), subject, &publishers))
            .await?;
        if expanded != title {
            debug!("Also searching expanded title '{}'", expanded);
            results.extend(
                self.search
                    .search(&self.query(expanded, subject, &publishers))
                    .await?,
            );
        }

        for candidate in results {
            if !candidate.actively_published
                || candidate.is_container() != subject.is_container()
                || candidate.canonical_uri == subject.canonical_uri
                || scores.contains(&candidate.canonical_uri)
            {
                continue;
            }
            let score = self.scorer.score(subject, &candidate);
            scores.set(candidate, score);
        }

        debug!(
            "Title search for '{}' found {} candidates",
            title,
            scores.len()
        );
        Ok(scores)
    }
}
