//! Updater registry keyed by subject publisher

use crate::config::EquivConfig;
use crate::error::ConfigError;
use crate::handlers::EpisodeFilteringHandler;
use crate::presets::UpdaterDependencies;
use crate::{EquivalenceUpdater, UpdaterError};
use equiv_domain::{Content, EquivalenceResult, Publisher};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

/// Item and container updaters for each configured source
///
/// Built once from configuration; lookups never mutate it.
#[derive(Default)]
pub struct UpdaterRegistry {
    items: BTreeMap<Publisher, Arc<EquivalenceUpdater>>,
    containers: BTreeMap<Publisher, Arc<EquivalenceUpdater>>,
}

impl UpdaterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config` and build every configured updater
    ///
    /// Pipeline exclusions and the generator timeout are applied to `deps`
    /// before any preset is assembled.
    pub fn from_config(
        config: &EquivConfig,
        deps: UpdaterDependencies,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let deps = deps
            .with_exclusions(
                config.pipeline.excluded_uris.iter().cloned(),
                config.pipeline.excluded_ids.iter().copied(),
            )
            .with_generator_timeout(config.pipeline.generator_timeout());

        let mut registry = Self::new();
        for source in &config.sources {
            let publisher = Publisher::new(source.publisher.as_str());
            let targets: BTreeSet<Publisher> =
                source.targets.iter().map(|t| Publisher::new(t.as_str())).collect();

            if let Some(preset) = source.item {
                let item_deps = match (source.episode_filter, &deps.handler) {
                    (Some(mode), Some(handler)) => {
                        let filtering = EpisodeFilteringHandler::new(
                            Arc::clone(handler),
                            Arc::clone(&deps.summaries),
                            mode,
                        );
                        deps.clone().with_handler(Arc::new(filtering))
                    }
                    _ => deps.clone(),
                };
                registry.register_item(publisher.clone(), preset.build(&item_deps, &targets)?);
            }
            if let Some(preset) = source.container {
                registry.register_container(publisher.clone(), preset.build(&deps, &targets)?);
            }
            info!(
                "Registered {} (item: {}, container: {})",
                publisher,
                source.item.map_or("none", |p| p.as_str()),
                source.container.map_or("none", |p| p.as_str())
            );
        }
        Ok(registry)
    }

    /// Register the item updater for `publisher`, replacing any previous one
    pub fn register_item(&mut self, publisher: Publisher, updater: EquivalenceUpdater) {
        self.items.insert(publisher, Arc::new(updater));
    }

    /// Register the container updater for `publisher`, replacing any previous one
    pub fn register_container(&mut self, publisher: Publisher, updater: EquivalenceUpdater) {
        self.containers.insert(publisher, Arc::new(updater));
    }

    /// Updater responsible for `subject`, if any
    pub fn updater_for(&self, subject: &Content) -> Option<&Arc<EquivalenceUpdater>> {
        if subject.is_container() {
            self.containers.get(&subject.publisher)
        } else {
            self.items.get(&subject.publisher)
        }
    }

    /// Publishers with at least one updater
    pub fn publishers(&self) -> BTreeSet<&Publisher> {
        self.items.keys().chain(self.containers.keys()).collect()
    }

    /// Run the responsible updater for `subject`
    pub async fn update(&self, subject: Arc<Content>) -> Result<EquivalenceResult, UpdaterError> {
        let updater = self
            .updater_for(&subject)
            .ok_or_else(|| UpdaterError::NoUpdater {
                publisher: subject.publisher.clone(),
                kind: if subject.is_container() {
                    "container"
                } else {
                    "item"
                },
            })?;
        updater.update(subject).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::UpdaterPreset;
    use equiv_alias::{AliasExpansion, AliasExpansionConfig};
    use equiv_domain::ContentKind;
    use equiv_store::InMemoryStore;

    fn deps() -> UpdaterDependencies {
        let expansion = Arc::new(AliasExpansion::new(AliasExpansionConfig::default()).unwrap());
        UpdaterDependencies::from_store(Arc::new(InMemoryStore::new()), expansion)
    }

    const CONFIG: &str = r#"
        [[sources]]
        publisher = "pa"
        item = "alias_item"
        container = "standard_container"
        targets = ["bbc"]
    "#;

    #[test]
    fn test_updater_for_dispatches_on_kind() {
        let config = EquivConfig::from_toml(CONFIG).unwrap();
        let registry = UpdaterRegistry::from_config(&config, deps()).unwrap();

        let episode = Content::new(1, "pa/e", Publisher::new("pa"), ContentKind::Episode);
        let brand = Content::new(2, "pa/b", Publisher::new("pa"), ContentKind::Brand);
        let other = Content::new(3, "itv/e", Publisher::new("itv"), ContentKind::Episode);

        assert_eq!(
            registry.updater_for(&episode).map(|u| u.name()),
            Some(UpdaterPreset::AliasItem.as_str())
        );
        assert_eq!(
            registry.updater_for(&brand).map(|u| u.name()),
            Some(UpdaterPreset::StandardContainer.as_str())
        );
        assert!(registry.updater_for(&other).is_none());
        assert_eq!(registry.publishers().len(), 1);
    }

    #[tokio::test]
    async fn test_unregistered_publisher_is_an_error() {
        let registry = UpdaterRegistry::new();
        let subject = Arc::new(Content::new(1, "itv/e", Publisher::new("itv"), ContentKind::Brand));

        let err = registry.update(subject).await.unwrap_err();
        assert!(matches!(err, UpdaterError::NoUpdater { kind: "container", .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EquivConfig::from_toml(CONFIG).unwrap();
        config.sources[0].targets.clear();
        assert!(UpdaterRegistry::from_config(&config, deps()).is_err());
    }
}
