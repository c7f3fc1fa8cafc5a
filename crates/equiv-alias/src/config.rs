//! Rule table configuration
//!
//! The table is loaded once at start-up and never mutated. The default is
//! the UK broadcaster table.

use crate::AliasConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// A CMS namespace paired with the broadcast group whose bcids it mirrors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmsNamespace {
    /// Broadcast group id
    pub group: u32,
    /// Broadcaster's own programme-id namespace
    pub namespace: String,
}

/// Value prefixes carried by one group's bcids but not by its CMS ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePrefixes {
    /// Broadcast group id
    pub group: u32,
    /// Prefixes, e.g. `C4:`
    pub prefixes: Vec<String>,
}

/// Two broadcast groups whose identifiers are interchangeable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAlias {
    /// Primary group
    pub primary: u32,
    /// Regional or variant group
    pub variant: u32,
}

fn default_bcid_suffix() -> String {
    "bcid".to_string()
}

fn default_parent_version_suffix() -> String {
    "parentVersionBcid".to_string()
}

/// Broadcast-group namespace rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastGroupConfig {
    /// Prefix of broadcast-group namespaces
    pub broadcast_group_prefix: String,

    /// Prefix of originating-owner namespaces
    pub originating_owner_prefix: String,

    /// Suffix of bcid namespaces
    #[serde(default = "default_bcid_suffix")]
    pub bcid_suffix: String,

    /// Suffix of parent-version bcid namespaces
    #[serde(default = "default_parent_version_suffix")]
    pub parent_version_suffix: String,

    /// CMS namespaces mapped onto group bcids
    #[serde(default)]
    pub cms_namespaces: Vec<CmsNamespace>,

    /// Value prefixes per group
    #[serde(default)]
    pub value_prefixes: Vec<ValuePrefixes>,

    /// Group-level aliases
    #[serde(default)]
    pub group_aliases: Vec<GroupAlias>,

    /// Groups whose parent-version bcid is untrusted when the content's
    /// originating owner is a different group
    #[serde(default)]
    pub unreliable_parent_version_groups: Vec<u32>,

    /// Further namespaces accepted for lookup without being rewritten
    #[serde(default)]
    pub extra_lookup_namespaces: Vec<String>,
}

impl BroadcastGroupConfig {
    /// UK Barb table
    pub fn uk() -> Self {
        Self {
            broadcast_group_prefix: "gb:barb:broadcastGroup".to_string(),
            originating_owner_prefix: "gb:barb:originatingOwner:broadcastGroup".to_string(),
            bcid_suffix: default_bcid_suffix(),
            parent_version_suffix: default_parent_version_suffix(),
            cms_namespaces: vec![
                CmsNamespace { group: 1, namespace: "gb:bbc:nitro:prod:version:pid".to_string() },
                CmsNamespace { group: 2, namespace: "gb:itv:production:id".to_string() },
                CmsNamespace { group: 3, namespace: "gb:channel4:prod:pmlsd:programmeId".to_string() },
                CmsNamespace { group: 4, namespace: "gb:c5:bcid".to_string() },
                CmsNamespace { group: 63, namespace: "gb:uktv:bcid".to_string() },
            ],
            value_prefixes: vec![ValuePrefixes {
                group: 3,
                prefixes: vec!["C4:".to_string(), "E4:".to_string(), "M4:".to_string()],
            }],
            group_aliases: vec![GroupAlias { primary: 2, variant: 111 }],
            unreliable_parent_version_groups: vec![5],
            extra_lookup_namespaces: vec!["gb:barb:contentid".to_string()],
        }
    }

    /// Validate the rules
    pub fn validate(&self) -> Result<(), AliasConfigError> {
        for (name, value) in [
            ("broadcast_group_prefix", &self.broadcast_group_prefix),
            ("originating_owner_prefix", &self.originating_owner_prefix),
            ("bcid_suffix", &self.bcid_suffix),
            ("parent_version_suffix", &self.parent_version_suffix),
        ] {
            if value.is_empty() || value.ends_with(':') {
                return Err(AliasConfigError::InvalidTable(format!(
                    "{} must be non-empty and must not end with ':'",
                    name
                )));
            }
        }
        if self.broadcast_group_prefix == self.originating_owner_prefix {
            return Err(AliasConfigError::InvalidTable(
                "broadcast group and originating owner prefixes must differ".to_string(),
            ));
        }
        if self.bcid_suffix == self.parent_version_suffix {
            return Err(AliasConfigError::InvalidTable(
                "bcid and parent version suffixes must differ".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for cms in &self.cms_namespaces {
            if !seen.insert(cms.namespace.as_str()) {
                return Err(AliasConfigError::DuplicateCmsNamespace(cms.namespace.clone()));
            }
        }

        for alias in &self.group_aliases {
            if alias.primary == alias.variant {
                return Err(AliasConfigError::SelfAliasedGroup(alias.primary));
            }
        }

        for prefixes in &self.value_prefixes {
            if prefixes.prefixes.iter().any(|p| p.is_empty()) {
                return Err(AliasConfigError::InvalidTable(format!(
                    "group {} declares an empty value prefix",
                    prefixes.group
                )));
            }
        }

        Ok(())
    }
}

/// Full alias expansion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasExpansionConfig {
    /// Sets of interchangeable namespaces; must not overlap
    #[serde(default)]
    pub namespace_sets: Vec<Vec<String>>,

    /// Broadcast-group rules, if any
    #[serde(default)]
    pub broadcast_groups: Option<BroadcastGroupConfig>,
}

impl Default for AliasExpansionConfig {
    /// UK broadcast-group table, no namespace sets
    fn default() -> Self {
        Self {
            namespace_sets: Vec::new(),
            broadcast_groups: Some(BroadcastGroupConfig::uk()),
        }
    }
}

impl AliasExpansionConfig {
    /// Namespace sets only
    pub fn namespace_sets(sets: Vec<Vec<String>>) -> Self {
        Self {
            namespace_sets: sets,
            broadcast_groups: None,
        }
    }

    /// No rules; expansion is the identity
    pub fn empty() -> Self {
        Self {
            namespace_sets: Vec::new(),
            broadcast_groups: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AliasConfigError> {
        let mut seen = BTreeSet::new();
        for set in &self.namespace_sets {
            let distinct: BTreeSet<&String> = set.iter().collect();
            if distinct.len() < 2 {
                return Err(AliasConfigError::DegenerateNamespaceSet(set.clone()));
            }
            for namespace in distinct {
                if !seen.insert(namespace.clone()) {
                    return Err(AliasConfigError::OverlappingNamespaceSets(namespace.clone()));
                }
            }
        }
        if let Some(groups) = &self.broadcast_groups {
            groups.validate()?;
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, AliasConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AliasConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
