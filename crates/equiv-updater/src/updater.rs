//! Per-subject pipeline orchestration

use crate::UpdaterError;
use equiv_domain::traits::EquivalenceResultHandler;
use equiv_domain::{Content, EquivalenceResult, ReadError, RunId, ScoredCandidates};
use equiv_generators::{EquivalenceGenerator, GeneratorError};
use equiv_results::EquivalenceResultBuilder;
use equiv_scorers::EquivalenceScorer;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs generators, scorers, result building and handlers for one subject
///
/// Generators run concurrently as spawned tasks and are joined before
/// anything is combined. A generator that fails to read its collaborators
/// counts as having found nothing; any other generator failure, or a
/// panicking generator or scorer, fails the subject.
pub struct EquivalenceUpdater {
    name: String,
    generators: Vec<Arc<dyn EquivalenceGenerator>>,
    scorers: Vec<Arc<dyn EquivalenceScorer>>,
    builder: EquivalenceResultBuilder,
    handler: Option<Arc<dyn EquivalenceResultHandler>>,
    generator_timeout: Option<Duration>,
}

impl EquivalenceUpdater {
    /// Create an updater with no generators, scorers or handler
    pub fn new(name: impl Into<String>, builder: EquivalenceResultBuilder) -> Self {
        Self {
            name: name.into(),
            generators: Vec::new(),
            scorers: Vec::new(),
            builder,
            handler: None,
            generator_timeout: None,
        }
    }

    /// Add a generator
    pub fn with_generator(mut self, generator: impl EquivalenceGenerator + 'static) -> Self {
        self.generators.push(Arc::new(generator));
        self
    }

    /// Add a scorer
    pub fn with_scorer(mut self, scorer: impl EquivalenceScorer + 'static) -> Self {
        self.scorers.push(Arc::new(scorer));
        self
    }

    /// Hand every completed result to `handler`
    pub fn with_handler(mut self, handler: Arc<dyn EquivalenceResultHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bound each generator call
    pub fn with_generator_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generator_timeout = timeout;
        self
    }

    /// Updater name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generator names in configuration order
    pub fn generator_names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Scorer names in configuration order
    pub fn scorer_names(&self) -> Vec<&str> {
        self.scorers.iter().map(|s| s.name()).collect()
    }

    /// Run the whole pipeline for `subject`
    pub async fn update(&self, subject: Arc<Content>) -> Result<EquivalenceResult, UpdaterError> {
        let run_id = RunId::new();
        let span = info_span!(
            "equivalence",
            subject = %subject.canonical_uri,
            run_id = %run_id,
            updater = %self.name
        );
        self.run(run_id, subject).instrument(span).await
    }

    async fn run(
        &self,
        run_id: RunId,
        subject: Arc<Content>,
    ) -> Result<EquivalenceResult, UpdaterError> {
        let generated = self.generate(&subject).await?;

        let mut candidates: BTreeMap<&str, Arc<Content>> = BTreeMap::new();
        for scores in &generated {
            for candidate in scores.candidates() {
                candidates
                    .entry(candidate.canonical_uri.as_str())
                    .or_insert_with(|| Arc::clone(candidate));
            }
        }
        let candidates: Vec<Arc<Content>> = candidates.into_values().collect();
        debug!("{} distinct candidates generated", candidates.len());

        let scored = self.score(&subject, candidates).await?;

        let mut raw_scores = generated;
        raw_scores.extend(scored);

        let built = self.builder.build(run_id, Arc::clone(&subject), raw_scores);
        if !built.rejections.is_empty() {
            debug!("{} candidates rejected by filters", built.rejections.len());
        }
        let result = built.result;

        info!(
            accepted = result.accepted_candidates().count(),
            "Equivalence computed for {}", subject.canonical_uri
        );

        if let Some(handler) = &self.handler {
            handler.handle(&result).await?;
        }
        Ok(result)
    }

    async fn generate(&self, subject: &Arc<Content>) -> Result<Vec<ScoredCandidates>, UpdaterError> {
        let tasks = self.generators.iter().map(|generator| {
            let generator = Arc::clone(generator);
            let subject = Arc::clone(subject);
            let timeout = self.generator_timeout;
            tokio::spawn(
                async move {
                    match timeout {
                        Some(limit) => {
                            match tokio::time::timeout(limit, generator.generate(&subject)).await {
                                Ok(outcome) => outcome,
                                Err(_) => Err(GeneratorError::Read(ReadError::Timeout {
                                    operation: generator.name().to_string(),
                                    after_ms: limit.as_millis() as u64,
                                })),
                            }
                        }
                        None => generator.generate(&subject).await,
                    }
                }
                .in_current_span(),
            )
        });

        let mut generated = Vec::with_capacity(self.generators.len());
        let mut failed = 0;
        for (generator, joined) in self.generators.iter().zip(join_all(tasks).await) {
            let component = generator.name();
            match joined {
                Ok(Ok(scores)) => {
                    debug!(
                        generator = component,
                        candidates = scores.len(),
                        "Generator finished"
                    );
                    generated.push(scores);
                }
                Ok(Err(err)) if err.is_recoverable() => {
                    warn!(generator = component, "Generator found nothing: {}", err);
                    failed += 1;
                    generated.push(ScoredCandidates::new(component));
                }
                Ok(Err(err)) => {
                    return Err(UpdaterError::Generator {
                        component: component.to_string(),
                        subject: subject.canonical_uri.clone(),
                        message: err.to_string(),
                    });
                }
                Err(join_err) => {
                    return Err(UpdaterError::Generator {
                        component: component.to_string(),
                        subject: subject.canonical_uri.clone(),
                        message: join_err.to_string(),
                    });
                }
            }
        }

        if failed > 0 && failed == self.generators.len() {
            return Err(UpdaterError::NoViableGenerators {
                subject: subject.canonical_uri.clone(),
                failed,
            });
        }
        Ok(generated)
    }

    async fn score(
        &self,
        subject: &Arc<Content>,
        candidates: Vec<Arc<Content>>,
    ) -> Result<Vec<ScoredCandidates>, UpdaterError> {
        if candidates.is_empty() || self.scorers.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = Arc::new(candidates);
        let tasks = self.scorers.iter().map(|scorer| {
            let scorer = Arc::clone(scorer);
            let subject = Arc::clone(subject);
            let candidates = Arc::clone(&candidates);
            tokio::task::spawn_blocking(move || scorer.score_all(&subject, &candidates))
        });

        let mut scored = Vec::with_capacity(self.scorers.len());
        for (scorer, joined) in self.scorers.iter().zip(join_all(tasks).await) {
            match joined {
                Ok(scores) => scored.push(scores),
                Err(join_err) => {
                    return Err(UpdaterError::Scorer {
                        component: scorer.name().to_string(),
                        subject: subject.canonical_uri.clone(),
                        message: join_err.to_string(),
                    });
                }
            }
        }
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use equiv_domain::{ContentKind, Publisher, Score};
    use equiv_results::{AddingCombiner, AllOverOrEqThresholdExtractor};

    enum Behaviour {
        Finds(&'static str, f64),
        ReadFails,
        Fatal,
        Panics,
        Hangs,
    }

    struct Stub {
        name: &'static str,
        behaviour: Behaviour,
    }

    #[async_trait]
    impl EquivalenceGenerator for Stub {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _subject: &Content) -> Result<ScoredCandidates, GeneratorError> {
            match self.behaviour {
                Behaviour::Finds(uri, score) => {
                    let mut scores = ScoredCandidates::new(self.name);
                    scores.set(
                        Arc::new(Content::new(0, uri, Publisher::new("bbc"), ContentKind::Episode)),
                        Score::Real(score),
                    );
                    Ok(scores)
                }
                Behaviour::ReadFails => {
                    Err(GeneratorError::Read(ReadError::Unavailable("index down".to_string())))
                }
                Behaviour::Fatal => Err(GeneratorError::Internal("corrupt state".to_string())),
                Behaviour::Panics => panic!("generator bug"),
                Behaviour::Hangs => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(ScoredCandidates::new(self.name))
                }
            }
        }
    }

    struct PanickingScorer;

    impl EquivalenceScorer for PanickingScorer {
        fn name(&self) -> &str {
            "Broken"
        }

        fn score(&self, _subject: &Content, _candidate: &Content) -> Score {
            panic!("scorer bug")
        }
    }

    fn updater(generators: Vec<Stub>) -> EquivalenceUpdater {
        let builder = EquivalenceResultBuilder::new(Box::new(AddingCombiner))
            .with_extractor(AllOverOrEqThresholdExtractor::new(1.0).unwrap());
        generators
            .into_iter()
            .fold(EquivalenceUpdater::new("test", builder), |u, g| u.with_generator(g))
    }

    fn subject() -> Arc<Content> {
        Arc::new(Content::new(1, "pa/1", Publisher::new("pa"), ContentKind::Episode))
    }

    #[tokio::test]
    async fn test_generators_are_merged() {
        let updater = updater(vec![
            Stub { name: "one", behaviour: Behaviour::Finds("bbc/a", 1.0) },
            Stub { name: "two", behaviour: Behaviour::Finds("bbc/a", 0.5) },
        ]);
        let result = updater.update(subject()).await.unwrap();

        assert_eq!(result.raw_scores.len(), 2);
        assert_eq!(result.combined.score_for("bbc/a"), Some(Score::Real(1.5)));
        assert!(result.is_accepted("bbc/a"));
    }

    #[tokio::test]
    async fn test_read_failure_is_recovered() {
        let updater = updater(vec![
            Stub { name: "one", behaviour: Behaviour::Finds("bbc/a", 1.0) },
            Stub { name: "down", behaviour: Behaviour::ReadFails },
        ]);
        let result = updater.update(subject()).await.unwrap();

        assert!(result.is_accepted("bbc/a"));
        assert_eq!(result.raw_scores[1].source(), "down");
        assert!(result.raw_scores[1].is_empty());
    }

    #[tokio::test]
    async fn test_all_generators_failing_is_an_error() {
        let updater = updater(vec![Stub { name: "down", behaviour: Behaviour::ReadFails }]);
        let err = updater.update(subject()).await.unwrap_err();
        assert!(matches!(err, UpdaterError::NoViableGenerators { failed: 1, .. }));
    }

    #[tokio::test]
    async fn test_fatal_generator_error_names_component() {
        let updater = updater(vec![
            Stub { name: "one", behaviour: Behaviour::Finds("bbc/a", 1.0) },
            Stub { name: "broken", behaviour: Behaviour::Fatal },
        ]);
        let err = updater.update(subject()).await.unwrap_err();

        assert_eq!(err.component(), Some("broken"));
        assert!(err.to_string().contains("pa/1"));
    }

    #[tokio::test]
    async fn test_panicking_generator_fails_subject() {
        let updater = updater(vec![Stub { name: "buggy", behaviour: Behaviour::Panics }]);
        let err = updater.update(subject()).await.unwrap_err();
        assert!(matches!(err, UpdaterError::Generator { ref component, .. } if component == "buggy"));
    }

    #[tokio::test]
    async fn test_panicking_scorer_fails_subject() {
        let updater = updater(vec![Stub { name: "one", behaviour: Behaviour::Finds("bbc/a", 1.0) }])
            .with_scorer(PanickingScorer);
        let err = updater.update(subject()).await.unwrap_err();
        assert!(matches!(err, UpdaterError::Scorer { ref component, .. } if component == "Broken"));
    }

    #[tokio::test]
    async fn test_generator_timeout_is_a_read_failure() {
        let updater = updater(vec![
            Stub { name: "one", behaviour: Behaviour::Finds("bbc/a", 1.0) },
            Stub { name: "slow", behaviour: Behaviour::Hangs },
        ])
        .with_generator_timeout(Some(Duration::from_millis(100)));

        let result = updater.update(subject()).await.unwrap();
        assert!(result.is_accepted("bbc/a"));
        assert!(result.raw_scores[1].is_empty());
    }
}
