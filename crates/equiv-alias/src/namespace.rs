//! Structured broadcast-group namespaces
//!
//! Namespaces look like `<prefix>:<group>:<suffix>`. They are parsed into
//! their parts rather than matched by string prefix, so group `2` never
//! matches group `21`.

use crate::BroadcastGroupConfig;

/// Which side of the rights chain a namespace describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupOwner {
    /// The distributing broadcast group
    BroadcastGroup,
    /// The content's originating owner
    OriginatingOwner,
}

/// Kind of identifier within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupSuffix {
    /// The version's own bcid
    Bcid,
    /// The bcid of the version this one was derived from
    ParentVersionBcid,
}

/// A parsed broadcast-group namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupNamespace {
    /// Owner side
    pub owner: GroupOwner,
    /// Group id
    pub group: u32,
    /// Identifier kind
    pub suffix: GroupSuffix,
}

impl GroupNamespace {
    /// Create a namespace
    pub fn new(owner: GroupOwner, group: u32, suffix: GroupSuffix) -> Self {
        Self { owner, group, suffix }
    }

    /// Broadcast-group bcid namespace of `group`
    pub fn bcid(group: u32) -> Self {
        Self::new(GroupOwner::BroadcastGroup, group, GroupSuffix::Bcid)
    }

    /// Broadcast-group parent-version namespace of `group`
    pub fn parent_version(group: u32) -> Self {
        Self::new(GroupOwner::BroadcastGroup, group, GroupSuffix::ParentVersionBcid)
    }

    /// Originating-owner bcid namespace of `group`
    pub fn owner_bcid(group: u32) -> Self {
        Self::new(GroupOwner::OriginatingOwner, group, GroupSuffix::Bcid)
    }

    /// Same owner and suffix in another group
    pub fn in_group(&self, group: u32) -> Self {
        Self { group, ..*self }
    }

    /// Same group and owner with another suffix
    pub fn with_suffix(&self, suffix: GroupSuffix) -> Self {
        Self { suffix, ..*self }
    }

    /// Parse a namespace string against the configured prefixes
    pub fn parse(namespace: &str, config: &BroadcastGroupConfig) -> Option<Self> {
        let (owner, rest) = if let Some(rest) = strip_segment(namespace, &config.originating_owner_prefix) {
            (GroupOwner::OriginatingOwner, rest)
        } else if let Some(rest) = strip_segment(namespace, &config.broadcast_group_prefix) {
            (GroupOwner::BroadcastGroup, rest)
        } else {
            return None;
        };

        let (group, suffix) = rest.split_once(':')?;
        if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let group = group.parse().ok()?;
        let suffix = if suffix == config.bcid_suffix {
            GroupSuffix::Bcid
        } else if suffix == config.parent_version_suffix {
            GroupSuffix::ParentVersionBcid
        } else {
            return None;
        };

        Some(Self { owner, group, suffix })
    }

    /// Render the namespace string
    pub fn render(&self, config: &BroadcastGroupConfig) -> String {
        let prefix = match self.owner {
            GroupOwner::BroadcastGroup => &config.broadcast_group_prefix,
            GroupOwner::OriginatingOwner => &config.originating_owner_prefix,
        };
        let suffix = match self.suffix {
            GroupSuffix::Bcid => &config.bcid_suffix,
            GroupSuffix::ParentVersionBcid => &config.parent_version_suffix,
        };
        format!("{}:{}:{}", prefix, self.group, suffix)
    }
}

/// Strip `prefix` followed by a `:` separator
fn strip_segment<'a>(namespace: &'a str, prefix: &str) -> Option<&'a str> {
    namespace.strip_prefix(prefix)?.strip_prefix(':')
}
