//! Equiv Storage Layer
//!
//! An in-memory implementation of every collaborator trait the pipeline
//! reads from, plus a result handler that writes equivalence summaries back.
//! It backs the test suites of the other crates and can be loaded from a
//! JSON fixture for offline runs.
//!
//! # Examples
//!
//! ```
//! use equiv_domain::{Content, ContentKind, Publisher};
//! use equiv_store::InMemoryStore;
//!
//! let store = InMemoryStore::new().with_content(
//!     Content::new(1, "http://example.com/1", Publisher::new("example"), ContentKind::Item),
//! );
//! assert!(store.content("http://example.com/1").is_some());
//! ```

#![warn(missing_docs)]

use async_trait::async_trait;
use equiv_domain::traits::{
    AliasQuery, ChannelResolver, ContentResolver, EquivalenceResultHandler,
    EquivalenceSummaryStore, LookupEntry, LookupStore, ScheduleChannel, ScheduleQuery,
    ScheduleResolver, SearchQuery, SearchResolver,
};
use equiv_domain::{
    Alias, Channel, Content, EquivalenceResult, EquivalenceSummary, HandlerError, Publisher,
    ReadError,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading or saving a store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Fixture file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture is not valid JSON for [`StoreData`]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two records share a canonical URI
    #[error("Duplicate content: {0}")]
    Duplicate(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Serialisable contents of a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    /// Content records
    #[serde(default)]
    pub contents: Vec<Content>,
    /// Known channels
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Persisted equivalence summaries
    #[serde(default)]
    pub summaries: Vec<EquivalenceSummary>,
}

#[derive(Debug, Default)]
struct Inner {
    contents: BTreeMap<String, Arc<Content>>,
    ids: HashMap<u64, String>,
    channels: BTreeMap<String, Channel>,
    summaries: BTreeMap<String, EquivalenceSummary>,
}

impl Inner {
    fn insert(&mut self, content: Content) {
        if let Some(previous) = self.contents.get(&content.canonical_uri) {
            self.ids.remove(&previous.id);
        }
        self.ids.insert(content.id, content.canonical_uri.clone());
        self.contents
            .insert(content.canonical_uri.clone(), Arc::new(content));
    }
}

/// In-memory store implementing every read-only collaborator trait
///
/// Reads take a shared lock; writes (fixture building and result handling)
/// take an exclusive one. [`set_unavailable`](Self::set_unavailable) makes
/// every read fail with [`ReadError::Unavailable`], which is how tests
/// exercise the pipeline's read-failure handling.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from fixture data, rejecting duplicate URIs
    pub fn from_data(data: StoreData) -> Result<Self, StoreError> {
        let mut inner = Inner::default();
        for content in data.contents {
            if inner.contents.contains_key(&content.canonical_uri) {
                return Err(StoreError::Duplicate(content.canonical_uri));
            }
            if inner.ids.contains_key(&content.id) {
                return Err(StoreError::InvalidData(format!(
                    "id {} used by more than one record",
                    content.id
                )));
            }
            inner.insert(content);
        }
        for channel in data.channels {
            inner.channels.insert(channel.uri.clone(), channel);
        }
        for summary in data.summaries {
            inner.summaries.insert(summary.subject.clone(), summary);
        }

        debug!(
            "Loaded store with {} records, {} channels, {} summaries",
            inner.contents.len(),
            inner.channels.len(),
            inner.summaries.len()
        );

        Ok(Self {
            inner: RwLock::new(inner),
            unavailable: AtomicBool::new(false),
        })
    }

    /// Parse fixture data from JSON
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Self::from_data(serde_json::from_str(json)?)
    }

    /// Load fixture data from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Snapshot the store as fixture data
    pub fn to_data(&self) -> Result<StoreData, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::InvalidData("store lock poisoned".to_string()))?;
        Ok(StoreData {
            contents: inner.contents.values().map(|c| (**c).clone()).collect(),
            channels: inner.channels.values().cloned().collect(),
            summaries: inner.summaries.values().cloned().collect(),
        })
    }

    /// Serialise the store as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.to_data()?)?)
    }

    /// Add a record, replacing any with the same URI
    pub fn with_content(self, content: Content) -> Self {
        self.insert(content);
        self
    }

    /// Add a channel
    pub fn with_channel(self, channel: Channel) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.channels.insert(channel.uri.clone(), channel);
        }
        self
    }

    /// Add an equivalence summary
    pub fn with_summary(self, summary: EquivalenceSummary) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.summaries.insert(summary.subject.clone(), summary);
        }
        self
    }

    /// Insert or replace a record
    pub fn insert(&self, content: Content) {
        if let Ok(mut inner) = self.inner.write() {
            inner.insert(content);
        }
    }

    /// Make every subsequent read fail, or recover
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The record with this URI
    pub fn content(&self, uri: &str) -> Option<Arc<Content>> {
        self.inner.read().ok()?.contents.get(uri).cloned()
    }

    /// The stored summary for this URI
    pub fn summary(&self, uri: &str) -> Option<EquivalenceSummary> {
        self.inner.read().ok()?.summaries.get(uri).cloned()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.contents.len()).unwrap_or(0)
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, ReadError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ReadError::Unavailable("store marked unavailable".to_string()));
        }
        self.inner
            .read()
            .map_err(|_| ReadError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, HandlerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HandlerError::Write("store marked unavailable".to_string()));
        }
        self.inner
            .write()
            .map_err(|_| HandlerError::Write("store lock poisoned".to_string()))
    }
}

fn publisher_allowed(publishers: &BTreeSet<Publisher>, publisher: &Publisher) -> bool {
    publishers.is_empty() || publishers.contains(publisher)
}

fn tokens(title: &str) -> BTreeSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl LookupStore for InMemoryStore {
    async fn entries_for_alias(
        &self,
        alias: &Alias,
        query: &AliasQuery,
    ) -> Result<Vec<LookupEntry>, ReadError> {
        let inner = self.read()?;
        Ok(inner
            .contents
            .values()
            .filter(|c| c.aliases.contains(alias))
            .filter(|c| query.include_unpublished || c.actively_published)
            .filter(|c| {
                query
                    .publishers
                    .as_ref()
                    .is_none_or(|publishers| publishers.contains(&c.publisher))
            })
            .map(|c| LookupEntry {
                id: c.id,
                uri: c.canonical_uri.clone(),
                publisher: c.publisher.clone(),
                actively_published: c.actively_published,
            })
            .collect())
    }
}

#[async_trait]
impl ContentResolver for InMemoryStore {
    async fn resolve_uris(&self, uris: &[String]) -> Result<Vec<Arc<Content>>, ReadError> {
        let inner = self.read()?;
        Ok(uris
            .iter()
            .filter_map(|uri| inner.contents.get(uri).cloned())
            .collect())
    }

    async fn resolve_ids(&self, ids: &[u64]) -> Result<Vec<Arc<Content>>, ReadError> {
        let inner = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.ids.get(id))
            .filter_map(|uri| inner.contents.get(uri).cloned())
            .collect())
    }
}

/// Ranks records by the number of title words they share with the query
#[async_trait]
impl SearchResolver for InMemoryStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Arc<Content>>, ReadError> {
        let wanted = tokens(&query.title);
        if wanted.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let inner = self.read()?;
        let mut hits: Vec<(usize, &Arc<Content>)> = inner
            .contents
            .values()
            .filter(|c| publisher_allowed(&query.publishers, &c.publisher))
            .filter(|c| {
                query
                    .specialization
                    .is_none_or(|s| c.specialization == Some(s))
            })
            .filter_map(|c| {
                let shared = tokens(c.title()?).intersection(&wanted).count();
                (shared > 0).then_some((shared, c))
            })
            .collect();

        // Stable sort keeps URI order among equally good hits
        hits.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(hits
            .into_iter()
            .take(query.limit)
            .map(|(_, c)| c.clone())
            .collect())
    }
}

#[async_trait]
impl ScheduleResolver for InMemoryStore {
    async fn schedule(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleChannel>, ReadError> {
        let inner = self.read()?;
        Ok(query
            .channels
            .iter()
            .map(|channel| {
                let mut items: Vec<(_, Arc<Content>)> = inner
                    .contents
                    .values()
                    .filter(|c| publisher_allowed(&query.publishers, &c.publisher))
                    .filter_map(|c| {
                        c.broadcasts()
                            .filter(|b| {
                                b.channel_uri == channel.uri
                                    && b.start <= query.end
                                    && b.end >= query.start
                            })
                            .map(|b| b.start)
                            .min()
                            .map(|start| (start, c.clone()))
                    })
                    .collect();
                items.sort_by(|a, b| a.0.cmp(&b.0));
                ScheduleChannel {
                    channel: channel.clone(),
                    items: items.into_iter().map(|(_, c)| c).collect(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl ChannelResolver for InMemoryStore {
    async fn channel_for_uri(&self, uri: &str) -> Result<Option<Channel>, ReadError> {
        Ok(self.read()?.channels.get(uri).cloned())
    }
}

#[async_trait]
impl EquivalenceSummaryStore for InMemoryStore {
    async fn summaries_for_uris(
        &self,
        uris: &[String],
    ) -> Result<BTreeMap<String, EquivalenceSummary>, ReadError> {
        let inner = self.read()?;
        Ok(uris
            .iter()
            .filter_map(|uri| {
                inner
                    .summaries
                    .get(uri)
                    .map(|summary| (uri.clone(), summary.clone()))
            })
            .collect())
    }
}

/// Persists each result as an [`EquivalenceSummary`]
#[async_trait]
impl EquivalenceResultHandler for InMemoryStore {
    async fn handle(&self, result: &EquivalenceResult) -> Result<(), HandlerError> {
        let summary = EquivalenceSummary::from_result(result);
        debug!(
            "Storing summary for {} with {} equivalents",
            summary.subject,
            summary.all_equivalents().count()
        );
        self.write()?
            .summaries
            .insert(summary.subject.clone(), summary);
        Ok(())
    }
}
