//! Named updater assemblies
//!
//! Each preset fixes the generator set, scorer set, combiner, filter chain
//! and extractors for one kind of source. Collaborators and target
//! publishers are supplied when the preset is built.

use crate::EquivalenceUpdater;
use equiv_alias::AliasExpansion;
use equiv_domain::traits::{
    ChannelResolver, ContentResolver, EquivalenceResultHandler, EquivalenceSummaryStore,
    LookupStore, ScheduleResolver, SearchResolver,
};
use equiv_domain::{Publisher, Score};
use equiv_generators::{
    AliasResolvingGenerator, AliasScoring, BroadcastMatchingConfig, BroadcastMatchingGenerator,
    ContainerCandidatesItemGenerator, ContainerChildGenerator, ScalingGenerator,
    TitleSearchConfig, TitleSearchGenerator,
};
use equiv_results::{
    AddingCombiner, AllOverOrEqThresholdExtractor, ConjunctiveFilter, DummyContainerFilter,
    EquivalenceResultBuilder, ExclusionListFilter, FilmEpisodeFilter, FilmYearFilter,
    HighestNonEmptyThresholdExtractor, MediaTypeFilter, MinimumScoreFilter,
    MultipleCandidateExtractor, NullScoreAwareAveragingCombiner, PercentAboveNextBestExtractor,
    PublisherFilter, RequiredScoreFilteringCombiner, ResultsError, SpecializationFilter,
    UnpublishedContentFilter,
};
use equiv_scorers::{
    AliasNamespaceScorer, ContentTitleScorer, DescriptionMatchingScorer, SequenceScorer,
    TitleMatchingScorer,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Weight of container-child votes against title evidence
const CONTAINER_CHILD_SCALE: f64 = 20.0;

/// Read-only collaborators and shared settings every preset draws on
#[derive(Clone)]
pub struct UpdaterDependencies {
    /// Alias lookups
    pub lookup: Arc<dyn LookupStore>,
    /// Record resolution
    pub content: Arc<dyn ContentResolver>,
    /// Title search
    pub search: Arc<dyn SearchResolver>,
    /// Schedules
    pub schedule: Arc<dyn ScheduleResolver>,
    /// Channels
    pub channels: Arc<dyn ChannelResolver>,
    /// Previous equivalence summaries
    pub summaries: Arc<dyn EquivalenceSummaryStore>,
    /// Alias expansion table
    pub expansion: Arc<AliasExpansion>,
    /// Handler for completed results
    pub handler: Option<Arc<dyn EquivalenceResultHandler>>,
    /// URIs never equivalated
    pub excluded_uris: BTreeSet<String>,
    /// Ids never equivalated
    pub excluded_ids: BTreeSet<u64>,
    /// Per-generator timeout
    pub generator_timeout: Option<Duration>,
}

impl UpdaterDependencies {
    /// Draw every collaborator from one store
    pub fn from_store<S>(store: Arc<S>, expansion: Arc<AliasExpansion>) -> Self
    where
        S: LookupStore
            + ContentResolver
            + SearchResolver
            + ScheduleResolver
            + ChannelResolver
            + EquivalenceSummaryStore
            + 'static,
    {
        Self {
            lookup: store.clone(),
            content: store.clone(),
            search: store.clone(),
            schedule: store.clone(),
            channels: store.clone(),
            summaries: store,
            expansion,
            handler: None,
            excluded_uris: BTreeSet::new(),
            excluded_ids: BTreeSet::new(),
            generator_timeout: None,
        }
    }

    /// Hand completed results to `handler`
    pub fn with_handler(mut self, handler: Arc<dyn EquivalenceResultHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bound each generator call
    pub fn with_generator_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generator_timeout = timeout;
        self
    }

    /// Never equivalate these URIs or ids
    pub fn with_exclusions(
        mut self,
        uris: impl IntoIterator<Item = String>,
        ids: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.excluded_uris.extend(uris);
        self.excluded_ids.extend(ids);
        self
    }

    fn exclusion_filter(&self) -> ExclusionListFilter {
        let filter = self
            .excluded_uris
            .iter()
            .fold(ExclusionListFilter::new(), |f, uri| f.with_uri(uri.clone()));
        self.excluded_ids.iter().fold(filter, |f, id| f.with_id(*id))
    }
}

/// Available updater assemblies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdaterPreset {
    /// Broadcast matching refined by title, sequence and description
    StandardItem,
    /// Broadcast matching with title gating, for broadcaster schedules
    BroadcastItem,
    /// Barb transmission logs: bcid aliases first, broadcast times second
    BarbTxlogItem,
    /// Shared aliases only
    AliasItem,
    /// Brands and series, by title search and child votes
    StandardContainer,
}

impl UpdaterPreset {
    /// Every preset
    pub const ALL: [UpdaterPreset; 5] = [
        UpdaterPreset::StandardItem,
        UpdaterPreset::BroadcastItem,
        UpdaterPreset::BarbTxlogItem,
        UpdaterPreset::AliasItem,
        UpdaterPreset::StandardContainer,
    ];

    /// Configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdaterPreset::StandardItem => "standard_item",
            UpdaterPreset::BroadcastItem => "broadcast_item",
            UpdaterPreset::BarbTxlogItem => "barb_txlog_item",
            UpdaterPreset::AliasItem => "alias_item",
            UpdaterPreset::StandardContainer => "standard_container",
        }
    }

    /// Whether the preset equivalates brands and series
    pub fn for_containers(&self) -> bool {
        matches!(self, UpdaterPreset::StandardContainer)
    }

    /// Assemble an updater drawing candidates from `targets`
    pub fn build(
        &self,
        deps: &UpdaterDependencies,
        targets: &BTreeSet<Publisher>,
    ) -> Result<EquivalenceUpdater, ResultsError> {
        let updater = match self {
            UpdaterPreset::StandardItem => standard_item(deps, targets)?,
            UpdaterPreset::BroadcastItem => broadcast_item(deps, targets)?,
            UpdaterPreset::BarbTxlogItem => barb_txlog_item(deps, targets)?,
            UpdaterPreset::AliasItem => alias_item(deps, targets)?,
            UpdaterPreset::StandardContainer => standard_container(deps, targets)?,
        };
        let updater = updater.with_generator_timeout(deps.generator_timeout);
        Ok(match &deps.handler {
            Some(handler) => updater.with_handler(Arc::clone(handler)),
            None => updater,
        })
    }
}

fn broadcast_filters(deps: &UpdaterDependencies) -> ConjunctiveFilter {
    ConjunctiveFilter::new()
        .with(MinimumScoreFilter::new(2.0))
        .with(MediaTypeFilter)
        .with(SpecializationFilter)
        .with(deps.exclusion_filter())
        .with(FilmYearFilter)
        .with(DummyContainerFilter)
        .with(UnpublishedContentFilter)
}

fn standard_item(
    deps: &UpdaterDependencies,
    targets: &BTreeSet<Publisher>,
) -> Result<EquivalenceUpdater, ResultsError> {
    let builder = EquivalenceResultBuilder::new(Box::new(NullScoreAwareAveragingCombiner::new()))
        .with_filter(
            ConjunctiveFilter::new()
                .with(MinimumScoreFilter::new(0.25))
                .with(MediaTypeFilter)
                .with(SpecializationFilter)
                .with(PublisherFilter::new())
                .with(deps.exclusion_filter())
                .with(FilmYearFilter)
                .with(DummyContainerFilter)
                .with(UnpublishedContentFilter),
        )
        .with_extractor(PercentAboveNextBestExtractor::new(1.5)?)
        .with_extractor(MultipleCandidateExtractor);

    Ok(EquivalenceUpdater::new(UpdaterPreset::StandardItem.as_str(), builder)
        .with_generator(BroadcastMatchingGenerator::new(
            Arc::clone(&deps.schedule),
            Arc::clone(&deps.channels),
            targets.clone(),
            BroadcastMatchingConfig::unbounded(),
        ))
        .with_generator(ContainerCandidatesItemGenerator::new(
            Arc::clone(&deps.content),
            Arc::clone(&deps.summaries),
        ))
        .with_scorer(TitleMatchingScorer::default())
        .with_scorer(SequenceScorer::new(Score::ONE))
        .with_scorer(DescriptionMatchingScorer))
}

fn broadcast_item(
    deps: &UpdaterDependencies,
    targets: &BTreeSet<Publisher>,
) -> Result<EquivalenceUpdater, ResultsError> {
    let builder = EquivalenceResultBuilder::new(Box::new(AddingCombiner))
        .with_filter(broadcast_filters(deps))
        .with_extractor(AllOverOrEqThresholdExtractor::new(4.0)?);

    Ok(EquivalenceUpdater::new(UpdaterPreset::BroadcastItem.as_str(), builder)
        .with_generator(BroadcastMatchingGenerator::new(
            Arc::clone(&deps.schedule),
            Arc::clone(&deps.channels),
            targets.clone(),
            BroadcastMatchingConfig {
                score_on_match: 3.0,
                ..BroadcastMatchingConfig::unbounded()
            },
        ))
        .with_scorer(TitleMatchingScorer::new(Score::ZERO))
        .with_scorer(DescriptionMatchingScorer))
}

fn barb_txlog_item(
    deps: &UpdaterDependencies,
    targets: &BTreeSet<Publisher>,
) -> Result<EquivalenceUpdater, ResultsError> {
    let builder = EquivalenceResultBuilder::new(Box::new(AddingCombiner))
        .with_filter(broadcast_filters(deps))
        .with_extractor(HighestNonEmptyThresholdExtractor::new(vec![10.0, 4.0])?);

    let alias = AliasResolvingGenerator::new(
        Arc::clone(&deps.lookup),
        Arc::clone(&deps.content),
        deps.expansion.clone(),
        targets.clone(),
    )
    .with_name("Barb Alias")
    .with_scoring(AliasScoring::Confirmed(AliasNamespaceScorer::new(Arc::clone(
        &deps.expansion,
    ))));

    Ok(EquivalenceUpdater::new(UpdaterPreset::BarbTxlogItem.as_str(), builder)
        .with_generator(alias)
        .with_generator(BroadcastMatchingGenerator::new(
            Arc::clone(&deps.schedule),
            Arc::clone(&deps.channels),
            targets.clone(),
            BroadcastMatchingConfig::txlog(),
        ))
        .with_scorer(TitleMatchingScorer::new(Score::ZERO))
        .with_scorer(DescriptionMatchingScorer))
}

fn alias_item(
    deps: &UpdaterDependencies,
    targets: &BTreeSet<Publisher>,
) -> Result<EquivalenceUpdater, ResultsError> {
    let builder = EquivalenceResultBuilder::new(Box::new(AddingCombiner))
        .with_filter(
            ConjunctiveFilter::new()
                .with(MinimumScoreFilter::new(2.9))
                .with(MediaTypeFilter)
                .with(FilmEpisodeFilter)
                .with(DummyContainerFilter)
                .with(UnpublishedContentFilter)
                .with(deps.exclusion_filter()),
        )
        .with_extractor(AllOverOrEqThresholdExtractor::new(3.0)?);

    Ok(EquivalenceUpdater::new(UpdaterPreset::AliasItem.as_str(), builder).with_generator(
        AliasResolvingGenerator::new(
            Arc::clone(&deps.lookup),
            Arc::clone(&deps.content),
            deps.expansion.clone(),
            targets.clone(),
        )
        .with_scoring(AliasScoring::Fixed(Score::Real(3.0))),
    ))
}

fn standard_container(
    deps: &UpdaterDependencies,
    targets: &BTreeSet<Publisher>,
) -> Result<EquivalenceUpdater, ResultsError> {
    let combiner = RequiredScoreFilteringCombiner::new(
        Box::new(NullScoreAwareAveragingCombiner::new()),
        TitleMatchingScorer::NAME,
    );
    let builder = EquivalenceResultBuilder::new(Box::new(combiner))
        .with_filter(
            ConjunctiveFilter::new()
                .with(MinimumScoreFilter::new(0.25))
                .with(MediaTypeFilter)
                .with(SpecializationFilter)
                .with(PublisherFilter::new())
                .with(deps.exclusion_filter())
                .with(FilmEpisodeFilter)
                .with(DummyContainerFilter)
                .with(UnpublishedContentFilter),
        )
        .with_extractor(PercentAboveNextBestExtractor::new(1.5)?);

    Ok(
        EquivalenceUpdater::new(UpdaterPreset::StandardContainer.as_str(), builder)
            .with_generator(TitleSearchGenerator::new(
                Arc::clone(&deps.search),
                targets.clone(),
                TitleSearchConfig::default(),
            ))
            .with_generator(ScalingGenerator::new(
                Box::new(ContainerChildGenerator::new(
                    Arc::clone(&deps.content),
                    Arc::clone(&deps.summaries),
                )),
                CONTAINER_CHILD_SCALE,
            ))
            .with_scorer(ContentTitleScorer::new(TitleMatchingScorer::NAME, 2.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use equiv_alias::AliasExpansionConfig;
    use equiv_store::InMemoryStore;

    fn deps() -> UpdaterDependencies {
        let expansion = Arc::new(AliasExpansion::new(AliasExpansionConfig::default()).unwrap());
        UpdaterDependencies::from_store(Arc::new(InMemoryStore::new()), expansion)
    }

    #[test]
    fn test_every_preset_builds() {
        let targets = BTreeSet::from([Publisher::new("bbc")]);
        for preset in UpdaterPreset::ALL {
            let updater = preset.build(&deps(), &targets).unwrap();
            assert_eq!(updater.name(), preset.as_str());
            assert!(!updater.generator_names().is_empty());
        }
    }

    #[test]
    fn test_barb_txlog_assembly() {
        let updater = UpdaterPreset::BarbTxlogItem
            .build(&deps(), &BTreeSet::new())
            .unwrap();
        assert_eq!(updater.generator_names(), vec!["Barb Alias", "broadcast"]);
        assert_eq!(
            updater.scorer_names(),
            vec![TitleMatchingScorer::NAME, DescriptionMatchingScorer::NAME]
        );
    }

    #[test]
    fn test_container_preset_is_for_containers_only() {
        let containers: Vec<UpdaterPreset> = UpdaterPreset::ALL
            .into_iter()
            .filter(UpdaterPreset::for_containers)
            .collect();
        assert_eq!(containers, vec![UpdaterPreset::StandardContainer]);
    }

    #[test]
    fn test_exclusions_reach_the_filter() {
        let deps = deps().with_exclusions(vec!["bbc/bad".to_string()], vec![7]);
        assert!(deps.excluded_uris.contains("bbc/bad"));
        assert!(deps.excluded_ids.contains(&7));
    }
}
