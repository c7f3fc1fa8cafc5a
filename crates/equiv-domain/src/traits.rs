//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the equivalence pipeline and
//! the systems it reads from and hands results to. Everything here is
//! read-only from the pipeline's perspective, except the result handler.
//! Implementations live in other crates (`equiv-store` ships an in-memory one).

use crate::{
    Alias, Channel, Content, EquivalenceResult, EquivalenceSummary, HandlerError, Publisher,
    ReadError, Specialization,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// An index entry returned by alias lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupEntry {
    /// Record id
    pub id: u64,
    /// Canonical URI of the record
    pub uri: String,
    /// Publisher of the record
    pub publisher: Publisher,
    /// Whether the record is actively published
    pub actively_published: bool,
}

/// Restrictions applied to an alias lookup
#[derive(Debug, Clone, Default)]
pub struct AliasQuery {
    /// Only entries from these publishers; `None` means any publisher
    pub publishers: Option<BTreeSet<Publisher>>,
    /// Include entries that are no longer actively published
    pub include_unpublished: bool,
}

/// Lookup-by-alias index
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Entries for every record carrying `alias`
    async fn entries_for_alias(
        &self,
        alias: &Alias,
        query: &AliasQuery,
    ) -> Result<Vec<LookupEntry>, ReadError>;
}

/// Resolve records by id or URI, in batches
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Resolve records by canonical URI; unknown URIs are omitted
    async fn resolve_uris(&self, uris: &[String]) -> Result<Vec<Arc<Content>>, ReadError>;

    /// Resolve records by id; unknown ids are omitted
    async fn resolve_ids(&self, ids: &[u64]) -> Result<Vec<Arc<Content>>, ReadError>;
}

/// Title search request
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Normalised title
    pub title: String,
    /// Publishers to search
    pub publishers: BTreeSet<Publisher>,
    /// Restrict to this specialization
    pub specialization: Option<Specialization>,
    /// Maximum results
    pub limit: usize,
}

/// Full-text title search index
#[async_trait]
pub trait SearchResolver: Send + Sync {
    /// At most `query.limit` records matching the title
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Arc<Content>>, ReadError>;
}

/// Schedule lookup request
#[derive(Debug, Clone)]
pub struct ScheduleQuery {
    /// Window start (inclusive)
    pub start: DateTime<Utc>,
    /// Window end (inclusive)
    pub end: DateTime<Utc>,
    /// Channels to read
    pub channels: Vec<Channel>,
    /// Publishers whose schedules to read
    pub publishers: BTreeSet<Publisher>,
}

/// Records scheduled on one channel within a window
#[derive(Debug, Clone)]
pub struct ScheduleChannel {
    /// The channel
    pub channel: Channel,
    /// Records with a broadcast overlapping the window
    pub items: Vec<Arc<Content>>,
}

/// Schedule store
#[async_trait]
pub trait ScheduleResolver: Send + Sync {
    /// Unmerged schedule for the given channels and publishers
    async fn schedule(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleChannel>, ReadError>;
}

/// Channel directory
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    /// The channel with this URI, if known
    async fn channel_for_uri(&self, uri: &str) -> Result<Option<Channel>, ReadError>;
}

/// Store of previously persisted equivalence decisions
#[async_trait]
pub trait EquivalenceSummaryStore: Send + Sync {
    /// Summaries for the given URIs; URIs without a summary are omitted
    async fn summaries_for_uris(
        &self,
        uris: &[String],
    ) -> Result<BTreeMap<String, EquivalenceSummary>, ReadError>;
}

/// Receives the result of each completed pipeline run
///
/// Persisting links, publishing change events and updating the summary store
/// all happen behind this trait.
#[async_trait]
pub trait EquivalenceResultHandler: Send + Sync {
    /// Handle one result
    async fn handle(&self, result: &EquivalenceResult) -> Result<(), HandlerError>;
}
