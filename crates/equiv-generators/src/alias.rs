//! Alias-resolving generator

use crate::{AliasGeneratorConfig, EquivalenceGenerator, GeneratorError};
use async_trait::async_trait;
use equiv_alias::AliasExpander;
use equiv_domain::traits::{AliasQuery, ContentResolver, LookupEntry, LookupStore};
use equiv_domain::{Alias, Content, Publisher, Score, ScoredCandidates};
use equiv_scorers::AliasNamespaceScorer;
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// How the alias generator scores what it finds
#[derive(Debug, Clone)]
pub enum AliasScoring {
    /// Every candidate gets the same score
    Fixed(Score),
    /// Each candidate is confirmed against its own aliases once resolved
    Confirmed(AliasNamespaceScorer),
}

/// Finds records sharing one of the subject's expanded aliases
///
/// Aliases are expanded, restricted to those the expander accepts for
/// lookup, and looked up concurrently. An alias matching more records than
/// `max_alias_matches` is discarded, since such values are usually
/// placeholders.
pub struct AliasResolvingGenerator {
    name: String,
    lookup: Arc<dyn LookupStore>,
    resolver: Arc<dyn ContentResolver>,
    expander: Arc<dyn AliasExpander>,
    publishers: BTreeSet<Publisher>,
    scoring: AliasScoring,
    config: AliasGeneratorConfig,
}

impl AliasResolvingGenerator {
    /// Default source label
    pub const NAME: &'static str = "Alias";

    /// Create a generator over `publishers` (empty means any publisher)
    /// scoring every match 1.0
    pub fn new(
        lookup: Arc<dyn LookupStore>,
        resolver: Arc<dyn ContentResolver>,
        expander: Arc<dyn AliasExpander>,
        publishers: BTreeSet<Publisher>,
    ) -> Self {
        Self {
            name: Self::NAME.to_string(),
            lookup,
            resolver,
            expander,
            publishers,
            scoring: AliasScoring::Fixed(Score::ONE),
            config: AliasGeneratorConfig::default(),
        }
    }

    /// Use a different source label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Use a different scoring mode
    pub fn with_scoring(mut self, scoring: AliasScoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Use a different configuration
    pub fn with_config(mut self, config: AliasGeneratorConfig) -> Self {
        self.config = config;
        self
    }

    fn query(&self) -> AliasQuery {
        AliasQuery {
            publishers: (!self.publishers.is_empty()).then(|| self.publishers.clone()),
            include_unpublished: self.config.include_unpublished,
        }
    }

    /// Entries for one alias that may become candidates, or `None` when the
    /// alias matches too many records to be trusted
    fn usable_entries(
        &self,
        subject: &Content,
        alias: &Alias,
        entries: Vec<LookupEntry>,
    ) -> Option<BTreeMap<String, LookupEntry>> {
        let matches: BTreeMap<String, LookupEntry> = entries
            .into_iter()
            .filter(|e| e.uri != subject.canonical_uri)
            .filter(|e| self.publishers.is_empty() || self.publishers.contains(&e.publisher))
            .map(|e| (e.uri.clone(), e))
            .collect();

        if matches.len() > self.config.max_alias_matches {
            warn!(
                namespace = %alias.namespace,
                value = %alias.value,
                matches = matches.len(),
                "Discarding alias matching more than {} records",
                self.config.max_alias_matches
            );
            return None;
        }
        Some(matches)
    }
}

#[async_trait]
impl EquivalenceGenerator for AliasResolvingGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, subject: &Content) -> Result<ScoredCandidates, GeneratorError> {
        let mut scores = ScoredCandidates::new(&self.name);
        if subject.aliases.is_empty() {
            return Ok(scores);
        }

        let expanded = self.expander.expand(&subject.aliases);
        let query = self.query();

        let lookups = expanded
            .iter()
            .filter(|alias| self.expander.accepts(alias))
            .map(|alias| {
                let lookup = Arc::clone(&self.lookup);
                let query = &query;
                async move {
                    let entries = lookup.entries_for_alias(alias, query).await;
                    (alias, entries)
                }
            });

        let mut uris = BTreeSet::new();
        for (alias, entries) in join_all(lookups).await {
            if let Some(matches) = self.usable_entries(subject, alias, entries?) {
                uris.extend(matches.into_keys());
            }
        }

        if uris.is_empty() {
            debug!("No alias candidates for {}", subject.canonical_uri);
            return Ok(scores);
        }

        let uris: Vec<String> = uris.into_iter().collect();
        let candidates = self.resolver.resolve_uris(&uris).await?;

        for candidate in candidates {
            if candidate.is_container() != subject.is_container() {
                continue;
            }
            let score = match &self.scoring {
                AliasScoring::Fixed(score) => *score,
                AliasScoring::Confirmed(scorer) => {
                    scorer.score_expanded(subject, &expanded, &candidate)
                }
            };
            scores.set(candidate, score);
        }

        debug!(
            "{} found {} candidates for {} from {} expanded aliases",
            self.name,
            scores.len(),
            subject.canonical_uri,
            expanded.len()
        );
        Ok(scores)
    }
}
