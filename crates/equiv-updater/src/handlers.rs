//! Result handlers run once per completed pipeline run

use async_trait::async_trait;
use equiv_domain::traits::{EquivalenceResultHandler, EquivalenceSummaryStore};
use equiv_domain::{ContentRef, EquivalenceResult, HandlerError, Publisher, ScoredCandidate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Runs handlers in order, stopping at the first failure
#[derive(Default, Clone)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn EquivalenceResultHandler>>,
}

impl HandlerChain {
    /// Empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler
    pub fn with(mut self, handler: Arc<dyn EquivalenceResultHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl EquivalenceResultHandler for HandlerChain {
    async fn handle(&self, result: &EquivalenceResult) -> Result<(), HandlerError> {
        for handler in &self.handlers {
            handler.handle(result).await?;
        }
        Ok(())
    }
}

/// How strictly episode parents must agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeFilterMode {
    /// The candidate's container must be an accepted equivalent of the
    /// subject's container
    Strict,
    /// As strict, but a candidate is also allowed when its publisher has no
    /// accepted container at all
    Relaxed,
}

/// Drops accepted episodes whose container disagrees with the subject's
/// container equivalence
///
/// The subject's container must already have a summary; without one the
/// result cannot be judged and handling fails. Subjects without a container
/// and candidates without a container pass through untouched.
pub struct EpisodeFilteringHandler {
    delegate: Arc<dyn EquivalenceResultHandler>,
    summaries: Arc<dyn EquivalenceSummaryStore>,
    mode: EpisodeFilterMode,
}

impl EpisodeFilteringHandler {
    /// Filter with `mode` before passing results to `delegate`
    pub fn new(
        delegate: Arc<dyn EquivalenceResultHandler>,
        summaries: Arc<dyn EquivalenceSummaryStore>,
        mode: EpisodeFilterMode,
    ) -> Self {
        Self {
            delegate,
            summaries,
            mode,
        }
    }

    /// Strict filtering
    pub fn strict(
        delegate: Arc<dyn EquivalenceResultHandler>,
        summaries: Arc<dyn EquivalenceSummaryStore>,
    ) -> Self {
        Self::new(delegate, summaries, EpisodeFilterMode::Strict)
    }

    /// Relaxed filtering
    pub fn relaxed(
        delegate: Arc<dyn EquivalenceResultHandler>,
        summaries: Arc<dyn EquivalenceSummaryStore>,
    ) -> Self {
        Self::new(delegate, summaries, EpisodeFilterMode::Relaxed)
    }

    fn allows(
        &self,
        candidate: &ScoredCandidate,
        containers: &BTreeMap<Publisher, Vec<ContentRef>>,
    ) -> bool {
        let Some(container) = &candidate.candidate.container else {
            return true;
        };
        match containers.get(candidate.publisher()) {
            Some(valid) if !valid.is_empty() => {
                valid.iter().any(|c| &c.canonical_uri == container)
            }
            _ => self.mode == EpisodeFilterMode::Relaxed,
        }
    }
}

#[async_trait]
impl EquivalenceResultHandler for EpisodeFilteringHandler {
    async fn handle(&self, result: &EquivalenceResult) -> Result<(), HandlerError> {
        let Some(container) = &result.subject.container else {
            return self.delegate.handle(result).await;
        };

        let mut summaries = self
            .summaries
            .summaries_for_uris(std::slice::from_ref(container))
            .await?;
        let summary = summaries
            .remove(container)
            .ok_or_else(|| HandlerError::ContainerSummaryRequired {
                subject: result.subject.canonical_uri.clone(),
                container: container.clone(),
            })?;

        let mut accepted = BTreeMap::new();
        for (publisher, candidates) in &result.accepted {
            let kept: Vec<ScoredCandidate> = candidates
                .iter()
                .filter(|candidate| {
                    let allowed = self.allows(candidate, &summary.equivalents);
                    if !allowed {
                        debug!(
                            subject = %result.subject.canonical_uri,
                            "{} removed, unacceptable container {:?}",
                            candidate.uri(),
                            candidate.candidate.container
                        );
                    }
                    allowed
                })
                .cloned()
                .collect();
            if !kept.is_empty() {
                accepted.insert(publisher.clone(), kept);
            }
        }

        self.delegate.handle(&result.with_accepted(accepted)).await
    }
}
