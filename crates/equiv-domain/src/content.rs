//! Content module - the records being compared
//!
//! Content is read-only input to the pipeline. It is owned and mutated by the
//! persistence layer; here it is only inspected.

use crate::Alias;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The source system a record came from
///
/// Sources are configuration, not code, so this is an open newtype rather
/// than an enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Publisher(String);

impl Publisher {
    /// Create a publisher from its key, e.g. `bbc.co.uk`
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the publisher key
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural kind of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// A standalone programme
    Item,
    /// An item within a brand and/or series
    Episode,
    /// A film
    Film,
    /// A short clip
    Clip,
    /// Top-level container
    Brand,
    /// Container of episodes, optionally within a brand
    Series,
}

impl ContentKind {
    /// Brands and series
    pub fn is_container(&self) -> bool {
        matches!(self, ContentKind::Brand | ContentKind::Series)
    }

    /// Anything that is not a container
    pub fn is_item(&self) -> bool {
        !self.is_container()
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Item => "item",
            ContentKind::Episode => "episode",
            ContentKind::Film => "film",
            ContentKind::Clip => "clip",
            ContentKind::Brand => "brand",
            ContentKind::Series => "series",
        }
    }
}

/// Audio or video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Video content
    Video,
    /// Audio content
    Audio,
}

/// Editorial specialization of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    /// Television
    Tv,
    /// Radio
    Radio,
    /// Film
    Film,
    /// Music
    Music,
    /// Sport
    Sport,
}

/// A linear channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    /// Canonical channel URI
    pub uri: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
}

impl Channel {
    /// Create a channel with no title
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One transmission of a version on a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    /// URI of the channel the broadcast is on
    pub channel_uri: String,
    /// Transmission start
    pub start: DateTime<Utc>,
    /// Transmission end
    pub end: DateTime<Utc>,
    /// Whether the broadcast is still live in its source
    #[serde(default = "default_true")]
    pub actively_published: bool,
}

impl Broadcast {
    /// Create an actively published broadcast
    pub fn new(channel_uri: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            channel_uri: channel_uri.into(),
            start,
            end,
            actively_published: true,
        }
    }

    /// Scheduled duration
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A version of a record, holding its broadcasts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Transmissions of this version
    #[serde(default)]
    pub broadcasts: Vec<Broadcast>,
}

/// A content record from one publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Numeric identifier
    pub id: u64,

    /// Canonical URI, stable across reads; used as the candidate key
    pub canonical_uri: String,

    /// Source of the record
    pub publisher: Publisher,

    /// Structural kind
    pub kind: ContentKind,

    /// Title
    #[serde(default)]
    pub title: Option<String>,

    /// Long or medium description
    #[serde(default)]
    pub description: Option<String>,

    /// Audio or video
    #[serde(default)]
    pub media_type: Option<MediaType>,

    /// Editorial specialization
    #[serde(default)]
    pub specialization: Option<Specialization>,

    /// Release or production year
    #[serde(default)]
    pub year: Option<i32>,

    /// Episode number within its series
    #[serde(default)]
    pub episode_number: Option<u32>,

    /// Series number
    #[serde(default)]
    pub series_number: Option<u32>,

    /// URI of the direct parent container
    #[serde(default)]
    pub container: Option<String>,

    /// URI of the series, when the item belongs to one
    #[serde(default)]
    pub series_ref: Option<String>,

    /// URIs of child records (containers only)
    #[serde(default)]
    pub children: Vec<String>,

    /// Identifiers stamped on the record
    #[serde(default)]
    pub aliases: BTreeSet<Alias>,

    /// Versions and their broadcasts
    #[serde(default)]
    pub versions: Vec<Version>,

    /// Whether the record is still live in its source
    #[serde(default = "default_true")]
    pub actively_published: bool,
}

impl Content {
    /// Create a published record with nothing but identity
    ///
    /// # Examples
    ///
    /// ```
    /// use equiv_domain::{Content, ContentKind, Publisher};
    ///
    /// let item = Content::new(1, "http://example.com/1", Publisher::new("example"), ContentKind::Item)
    ///     .with_title("Doctor Who");
    /// assert_eq!(item.title(), Some("Doctor Who"));
    /// ```
    pub fn new(
        id: u64,
        canonical_uri: impl Into<String>,
        publisher: Publisher,
        kind: ContentKind,
    ) -> Self {
        Self {
            id,
            canonical_uri: canonical_uri.into(),
            publisher,
            kind,
            title: None,
            description: None,
            media_type: None,
            specialization: None,
            year: None,
            episode_number: None,
            series_number: None,
            container: None,
            series_ref: None,
            children: Vec::new(),
            aliases: BTreeSet::new(),
            versions: Vec::new(),
            actively_published: true,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the year
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set media type
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Set specialization
    pub fn with_specialization(mut self, specialization: Specialization) -> Self {
        self.specialization = Some(specialization);
        self
    }

    /// Set series and episode numbers
    pub fn with_sequence(mut self, series: Option<u32>, episode: Option<u32>) -> Self {
        self.series_number = series;
        self.episode_number = episode;
        self
    }

    /// Set the parent container
    pub fn with_container(mut self, uri: impl Into<String>) -> Self {
        self.container = Some(uri.into());
        self
    }

    /// Set the series reference
    pub fn with_series_ref(mut self, uri: impl Into<String>) -> Self {
        self.series_ref = Some(uri.into());
        self
    }

    /// Add a child URI
    pub fn with_child(mut self, uri: impl Into<String>) -> Self {
        self.children.push(uri.into());
        self
    }

    /// Add an alias
    pub fn with_alias(mut self, alias: Alias) -> Self {
        self.aliases.insert(alias);
        self
    }

    /// Add a version holding the given broadcasts
    pub fn with_broadcasts(mut self, broadcasts: Vec<Broadcast>) -> Self {
        self.versions.push(Version { broadcasts });
        self
    }

    /// Mark the record as unpublished
    pub fn unpublished(mut self) -> Self {
        self.actively_published = false;
        self
    }

    /// Title, if present and non-empty
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Every broadcast of every version
    pub fn broadcasts(&self) -> impl Iterator<Item = &Broadcast> {
        self.versions.iter().flat_map(|v| v.broadcasts.iter())
    }

    /// Whether this record is a brand or series
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Whether the item sits directly under its series, i.e. its container
    /// is also its series
    pub fn is_child_of_top_level_series(&self) -> bool {
        self.container.is_some() && self.container == self.series_ref
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.canonical_uri, self.publisher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item() -> Content {
        Content::new(1, "http://a/1", Publisher::new("a"), ContentKind::Episode)
    }

    #[test]
    fn test_blank_title_is_absent() {
        assert_eq!(item().with_title("   ").title(), None);
        assert_eq!(item().with_title("Title").title(), Some("Title"));
    }

    #[test]
    fn test_broadcasts_span_versions() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let end = start + Duration::minutes(30);
        let content = item()
            .with_broadcasts(vec![Broadcast::new("c1", start, end)])
            .with_broadcasts(vec![
                Broadcast::new("c2", start, end),
                Broadcast::new("c3", start, end),
            ]);

        assert_eq!(content.broadcasts().count(), 3);
        assert_eq!(content.broadcasts().next().unwrap().duration(), Duration::minutes(30));
    }

    #[test]
    fn test_top_level_series_child() {
        let episode = item().with_container("s").with_series_ref("s");
        assert!(episode.is_child_of_top_level_series());

        let branded = item().with_container("b").with_series_ref("s");
        assert!(!branded.is_child_of_top_level_series());

        assert!(!item().is_child_of_top_level_series());
    }

    #[test]
    fn test_kind_classification() {
        assert!(ContentKind::Brand.is_container());
        assert!(ContentKind::Series.is_container());
        assert!(ContentKind::Film.is_item());
        assert_eq!(ContentKind::Episode.as_str(), "episode");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "id": 7,
            "canonical_uri": "http://b/7",
            "publisher": "b",
            "kind": "film",
            "title": "Heat"
        }"#;
        let content: Content = serde_json::from_str(json).unwrap();
        assert!(content.actively_published);
        assert_eq!(content.publisher, Publisher::new("b"));
        assert_eq!(content.kind, ContentKind::Film);
        assert!(content.aliases.is_empty());
    }
}
