//! Configuration for the generators

use chrono::Duration;
use serde::{Deserialize, Serialize};

const BBC_SERVICES: &str = "http://www.bbc.co.uk/services/";

/// Regional BBC channels whose broadcasts duplicate the national feed
const BBC_REGIONAL_CHANNELS: &[&str] = &[
    "bbcone/ni",
    "bbcone/cambridge",
    "bbcone/channel_islands",
    "bbcone/east",
    "bbcone/east_midlands",
    "bbcone/hd",
    "bbcone/north_east",
    "bbcone/north_west",
    "bbcone/oxford",
    "bbcone/scotland",
    "bbcone/south",
    "bbcone/south_east",
    "bbcone/wales",
    "bbcone/south_west",
    "bbcone/west",
    "bbcone/west_midlands",
    "bbcone/east_yorkshire",
    "bbcone/yorkshire",
    "bbctwo/ni",
    "bbctwo/ni_analogue",
    "bbctwo/scotland",
    "bbctwo/wales",
    "bbctwo/wales_analogue",
    "radio4/lw",
];

/// Configuration for the alias-resolving generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasGeneratorConfig {
    /// An alias matching more distinct records than this is discarded
    pub max_alias_matches: usize,

    /// Also consider records that are no longer actively published
    pub include_unpublished: bool,
}

impl Default for AliasGeneratorConfig {
    fn default() -> Self {
        Self {
            max_alias_matches: 50,
            include_unpublished: false,
        }
    }
}

impl AliasGeneratorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_alias_matches == 0 {
            return Err("max_alias_matches must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Configuration for the title search generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSearchConfig {
    /// Maximum results per search
    pub search_limit: usize,

    /// Score given to an exact normalised title match
    pub exact_match_score: f64,
}

impl Default for TitleSearchConfig {
    fn default() -> Self {
        Self {
            search_limit: 20,
            exact_match_score: 2.0,
        }
    }
}

impl TitleSearchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.search_limit == 0 {
            return Err("search_limit must be greater than 0".to_string());
        }
        if !self.exact_match_score.is_finite() || self.exact_match_score <= 0.0 {
            return Err("exact_match_score must be a positive number".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Configuration for the broadcast-matching generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMatchingConfig {
    /// Start and end times must agree within this many minutes
    pub flexibility_minutes: i64,

    /// Broadcasts shorter than this many minutes use the reduced window
    pub short_broadcast_minutes: i64,

    /// Schedule window padding for short broadcasts, in minutes
    pub short_broadcast_flexibility_minutes: i64,

    /// End-time tolerance for the secondary match, in minutes
    pub extended_end_flexibility_minutes: i64,

    /// Score per matching broadcast; secondary matches get a tenth of it
    pub score_on_match: f64,

    /// Divide each candidate's score by the number of processed broadcasts
    pub scale_by_broadcasts: bool,

    /// Skip broadcasts starting more than this many days ahead; `None`
    /// processes every broadcast
    pub horizon_days: Option<i64>,

    /// Channels skipped unless the broadcast is its version's only one
    pub ignored_channels: Vec<String>,
}

impl Default for BroadcastMatchingConfig {
    /// Five minutes either side, broadcasts up to eight days ahead
    fn default() -> Self {
        Self {
            flexibility_minutes: 5,
            short_broadcast_minutes: 10,
            short_broadcast_flexibility_minutes: 2,
            extended_end_flexibility_minutes: 185,
            score_on_match: 1.0,
            scale_by_broadcasts: true,
            horizon_days: Some(8),
            ignored_channels: BBC_REGIONAL_CHANNELS
                .iter()
                .map(|c| format!("{}{}", BBC_SERVICES, c))
                .collect(),
        }
    }
}

impl BroadcastMatchingConfig {
    /// No horizon: every broadcast is processed
    pub fn unbounded() -> Self {
        Self {
            horizon_days: None,
            ..Self::default()
        }
    }

    /// Transmission-log matching: unbounded and worth 3.0 per broadcast
    pub fn txlog() -> Self {
        Self {
            score_on_match: 3.0,
            ..Self::unbounded()
        }
    }

    /// Start/end tolerance
    pub fn flexibility(&self) -> Duration {
        Duration::minutes(self.flexibility_minutes)
    }

    /// Length below which a broadcast counts as short
    pub fn short_broadcast(&self) -> Duration {
        Duration::minutes(self.short_broadcast_minutes)
    }

    /// Schedule padding for short broadcasts
    pub fn short_broadcast_flexibility(&self) -> Duration {
        Duration::minutes(self.short_broadcast_flexibility_minutes)
    }

    /// End-time tolerance for secondary matches
    pub fn extended_end_flexibility(&self) -> Duration {
        Duration::minutes(self.extended_end_flexibility_minutes)
    }

    /// Horizon, if any
    pub fn horizon(&self) -> Option<Duration> {
        self.horizon_days.map(Duration::days)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.flexibility_minutes < 0 {
            return Err("flexibility_minutes cannot be negative".to_string());
        }
        if self.short_broadcast_flexibility_minutes < 0 {
            return Err("short_broadcast_flexibility_minutes cannot be negative".to_string());
        }
        if self.extended_end_flexibility_minutes < self.flexibility_minutes {
            return Err(
                "extended_end_flexibility_minutes cannot be less than flexibility_minutes"
                    .to_string(),
            );
        }
        if !self.score_on_match.is_finite() || self.score_on_match <= 0.0 {
            return Err("score_on_match must be a positive number".to_string());
        }
        if self.horizon_days.is_some_and(|days| days <= 0) {
            return Err("horizon_days must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
