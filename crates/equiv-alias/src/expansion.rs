//! Alias expansion
//!
//! Each rule is a rewrite from one alias to the aliases it implies. Every
//! rewrite has an inverse reachable through the same table, and expansion
//! runs them to a fixpoint, which is what makes the result idempotent and
//! symmetric. The table is finite and value rewrites only strip or re-add a
//! single configured prefix, so the fixpoint is always reached.

use crate::{AliasConfigError, AliasExpansionConfig, BroadcastGroupConfig, GroupNamespace, GroupOwner, GroupSuffix};
use equiv_domain::Alias;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Expands a subject's aliases into the set it should match on
pub trait AliasExpander: Send + Sync {
    /// The input plus every alias it implies; never removes an alias
    fn expand(&self, aliases: &BTreeSet<Alias>) -> BTreeSet<Alias>;

    /// Whether lookups should be made on this alias
    fn accepts(&self, alias: &Alias) -> bool;
}

/// Interchangeable namespace sets
#[derive(Debug, Clone, Default)]
pub struct NamespaceSets {
    sets: Vec<BTreeSet<String>>,
    index: HashMap<String, usize>,
}

impl NamespaceSets {
    /// Build from configured sets; overlapping sets are rejected
    pub fn new(sets: &[Vec<String>]) -> Result<Self, AliasConfigError> {
        let mut built = Vec::with_capacity(sets.len());
        let mut index = HashMap::new();

        for set in sets {
            let namespaces: BTreeSet<String> = set.iter().cloned().collect();
            if namespaces.len() < 2 {
                return Err(AliasConfigError::DegenerateNamespaceSet(set.clone()));
            }
            for namespace in &namespaces {
                if index.insert(namespace.clone(), built.len()).is_some() {
                    return Err(AliasConfigError::OverlappingNamespaceSets(namespace.clone()));
                }
            }
            built.push(namespaces);
        }

        Ok(Self { sets: built, index })
    }

    /// Whether `namespace` belongs to any set
    pub fn contains(&self, namespace: &str) -> bool {
        self.index.contains_key(namespace)
    }

    fn rewrite(&self, alias: &Alias, out: &mut Vec<Alias>) {
        if let Some(&i) = self.index.get(&alias.namespace) {
            out.extend(
                self.sets[i]
                    .iter()
                    .filter(|ns| **ns != alias.namespace)
                    .map(|ns| alias.in_namespace(ns.clone())),
            );
        }
    }
}

/// Broadcast-group rewrite rules, indexed for lookup
#[derive(Debug, Clone)]
pub struct BroadcastGroupRules {
    config: BroadcastGroupConfig,
    cms_group: HashMap<String, u32>,
    cms_namespaces: HashMap<u32, Vec<String>>,
    value_prefixes: HashMap<u32, Vec<String>>,
    partners: HashMap<u32, BTreeSet<u32>>,
    unreliable: BTreeSet<u32>,
    extra: BTreeSet<String>,
}

impl BroadcastGroupRules {
    /// Index a validated configuration
    pub fn new(config: BroadcastGroupConfig) -> Result<Self, AliasConfigError> {
        config.validate()?;

        let mut cms_group = HashMap::new();
        let mut cms_namespaces: HashMap<u32, Vec<String>> = HashMap::new();
        for cms in &config.cms_namespaces {
            cms_group.insert(cms.namespace.clone(), cms.group);
            cms_namespaces
                .entry(cms.group)
                .or_default()
                .push(cms.namespace.clone());
        }

        let mut value_prefixes: HashMap<u32, Vec<String>> = HashMap::new();
        for prefixes in &config.value_prefixes {
            value_prefixes
                .entry(prefixes.group)
                .or_default()
                .extend(prefixes.prefixes.iter().cloned());
        }

        let mut partners: HashMap<u32, BTreeSet<u32>> = HashMap::new();
        for alias in &config.group_aliases {
            partners.entry(alias.primary).or_default().insert(alias.variant);
            partners.entry(alias.variant).or_default().insert(alias.primary);
        }

        Ok(Self {
            cms_group,
            cms_namespaces,
            value_prefixes,
            partners,
            unreliable: config.unreliable_parent_version_groups.iter().copied().collect(),
            extra: config.extra_lookup_namespaces.iter().cloned().collect(),
            config,
        })
    }

    /// Underlying configuration
    pub fn config(&self) -> &BroadcastGroupConfig {
        &self.config
    }

    /// Parse a namespace string
    pub fn parse(&self, namespace: &str) -> Option<GroupNamespace> {
        GroupNamespace::parse(namespace, &self.config)
    }

    /// Render a namespace string
    pub fn render(&self, namespace: GroupNamespace) -> String {
        namespace.render(&self.config)
    }

    /// Whether lookups should be made on `namespace`
    pub fn accepts(&self, namespace: &str) -> bool {
        self.parse(namespace).is_some()
            || self.cms_group.contains_key(namespace)
            || self.extra.contains(namespace)
    }

    /// Whether `group`'s parent-version bcids are untrusted for content
    /// originating from another group
    pub fn is_unreliable_parent_version(&self, group: u32) -> bool {
        self.unreliable.contains(&group)
    }

    /// Whether `aliases` carry a broadcast-group alias of `group` together
    /// with an originating-owner alias of a different group
    pub fn has_foreign_originating_owner(&self, aliases: &BTreeSet<Alias>, group: u32) -> bool {
        let mut in_group = false;
        let mut foreign_owner = false;
        for alias in aliases {
            match self.parse(&alias.namespace) {
                Some(ns) if ns.owner == GroupOwner::BroadcastGroup && ns.group == group => {
                    in_group = true
                }
                Some(ns) if ns.owner == GroupOwner::OriginatingOwner && ns.group != group => {
                    foreign_owner = true
                }
                _ => {}
            }
            if in_group && foreign_owner {
                return true;
            }
        }
        false
    }

    /// `value` with any group prefix stripped, plus every prefixed form
    fn value_variants(&self, group: u32, value: &str) -> Vec<String> {
        let Some(prefixes) = self.value_prefixes.get(&group) else {
            return vec![value.to_string()];
        };
        let base = prefixes
            .iter()
            .find_map(|p| value.strip_prefix(p.as_str()))
            .unwrap_or(value);

        let mut variants = Vec::with_capacity(prefixes.len() + 1);
        variants.push(base.to_string());
        variants.extend(prefixes.iter().map(|p| format!("{}{}", p, base)));
        variants
    }

    /// Every namespace of `group`: both owners, both suffixes, and its CMS
    /// namespaces
    fn group_family(&self, group: u32) -> Vec<String> {
        let mut family = Vec::with_capacity(6);
        for owner in [GroupOwner::BroadcastGroup, GroupOwner::OriginatingOwner] {
            for suffix in [GroupSuffix::Bcid, GroupSuffix::ParentVersionBcid] {
                family.push(self.render(GroupNamespace::new(owner, group, suffix)));
            }
        }
        if let Some(cms) = self.cms_namespaces.get(&group) {
            family.extend(cms.iter().cloned());
        }
        family
    }

    fn rewrite(&self, alias: &Alias, out: &mut Vec<Alias>) {
        let (group, parsed) = match self.parse(&alias.namespace) {
            Some(ns) => (ns.group, Some(ns)),
            None => match self.cms_group.get(&alias.namespace) {
                Some(&group) => (group, None),
                None => return,
            },
        };

        let family = self.group_family(group);
        for value in self.value_variants(group, &alias.value) {
            out.extend(family.iter().map(|ns| Alias::new(ns.clone(), value.clone())));
        }

        if let (Some(ns), Some(partners)) = (parsed, self.partners.get(&group)) {
            out.extend(
                partners
                    .iter()
                    .map(|&partner| alias.in_namespace(self.render(ns.in_group(partner)))),
            );
        }
    }
}

/// Alias expansion over a configured rule table
#[derive(Debug, Clone)]
pub struct AliasExpansion {
    namespace_sets: NamespaceSets,
    broadcast_groups: Option<BroadcastGroupRules>,
}

impl AliasExpansion {
    /// Build from configuration, failing on an invalid table
    pub fn new(config: AliasExpansionConfig) -> Result<Self, AliasConfigError> {
        config.validate()?;
        Ok(Self {
            namespace_sets: NamespaceSets::new(&config.namespace_sets)?,
            broadcast_groups: config.broadcast_groups.map(BroadcastGroupRules::new).transpose()?,
        })
    }

    /// Broadcast-group rules, when configured
    pub fn broadcast_groups(&self) -> Option<&BroadcastGroupRules> {
        self.broadcast_groups.as_ref()
    }

    fn rewrite(&self, alias: &Alias, out: &mut Vec<Alias>) {
        self.namespace_sets.rewrite(alias, out);
        if let Some(groups) = &self.broadcast_groups {
            groups.rewrite(alias, out);
        }
    }
}

impl AliasExpander for AliasExpansion {
    fn expand(&self, aliases: &BTreeSet<Alias>) -> BTreeSet<Alias> {
        let mut expanded = aliases.clone();
        let mut pending: Vec<Alias> = aliases.iter().cloned().collect();
        let mut implied = Vec::new();

        while let Some(alias) = pending.pop() {
            implied.clear();
            self.rewrite(&alias, &mut implied);
            for next in implied.drain(..) {
                if !expanded.contains(&next) {
                    expanded.insert(next.clone());
                    pending.push(next);
                }
            }
        }

        debug!(
            "Expanded {} aliases to {}",
            aliases.len(),
            expanded.len()
        );
        expanded
    }

    /// With broadcast-group rules configured only group, CMS, extra and
    /// namespace-set namespaces are looked up; otherwise every alias is
    fn accepts(&self, alias: &Alias) -> bool {
        match &self.broadcast_groups {
            Some(groups) => {
                groups.accepts(&alias.namespace) || self.namespace_sets.contains(&alias.namespace)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uk() -> AliasExpansion {
        AliasExpansion::new(AliasExpansionConfig::default()).unwrap()
    }

    fn set(aliases: &[(&str, &str)]) -> BTreeSet<Alias> {
        aliases.iter().map(|(ns, v)| Alias::new(*ns, *v)).collect()
    }

    #[test]
    fn test_itv_bcid_expands_to_owner_and_stv() {
        let expanded = uk().expand(&set(&[("gb:barb:broadcastGroup:2:bcid", "ABC123")]));

        for (ns, v) in [
            ("gb:barb:broadcastGroup:2:bcid", "ABC123"),
            ("gb:barb:originatingOwner:broadcastGroup:2:bcid", "ABC123"),
            ("gb:barb:broadcastGroup:2:parentVersionBcid", "ABC123"),
            ("gb:barb:broadcastGroup:111:bcid", "ABC123"),
            ("gb:barb:originatingOwner:broadcastGroup:111:bcid", "ABC123"),
            ("gb:itv:production:id", "ABC123"),
        ] {
            assert!(
                expanded.contains(&Alias::new(ns, v)),
                "missing {}={}",
                ns,
                v
            );
        }
    }

    #[test]
    fn test_group_prefix_does_not_leak_into_similar_groups() {
        let expanded = uk().expand(&set(&[("gb:barb:broadcastGroup:21:bcid", "X")]));
        assert!(!expanded.iter().any(|a| a.namespace.contains(":111:")));
        assert!(!expanded.iter().any(|a| a.namespace == "gb:itv:production:id"));
    }

    #[test]
    fn test_c4_cms_id_gains_prefixed_bcids() {
        let expanded = uk().expand(&set(&[("gb:channel4:prod:pmlsd:programmeId", "12345")]));

        for prefix in ["C4:", "E4:", "M4:"] {
            let value = format!("{}12345", prefix);
            assert!(expanded.contains(&Alias::new("gb:barb:broadcastGroup:3:bcid", value.clone())));
            assert!(expanded.contains(&Alias::new(
                "gb:barb:originatingOwner:broadcastGroup:3:bcid",
                value.clone()
            )));
            assert!(expanded.contains(&Alias::new(
                "gb:barb:broadcastGroup:3:parentVersionBcid",
                value
            )));
        }
        assert!(expanded.contains(&Alias::new("gb:barb:broadcastGroup:3:bcid", "12345")));
    }

    #[test]
    fn test_c4_bcid_strips_prefix_for_cms() {
        let expanded = uk().expand(&set(&[("gb:barb:broadcastGroup:3:bcid", "E4:999")]));
        assert!(expanded.contains(&Alias::new("gb:channel4:prod:pmlsd:programmeId", "999")));
        assert!(expanded.contains(&Alias::new("gb:barb:broadcastGroup:3:bcid", "C4:999")));
    }

    #[test]
    fn test_prefixes_only_apply_to_their_group() {
        let expanded = uk().expand(&set(&[("gb:barb:broadcastGroup:4:bcid", "C4:1")]));
        assert!(expanded.contains(&Alias::new("gb:c5:bcid", "C4:1")));
        assert!(!expanded.iter().any(|a| a.value == "1"));
    }

    #[test]
    fn test_unrelated_aliases_pass_through() {
        let input = set(&[("gb:amazon:asin", "B00X"), ("gb:barb:contentid", "1")]);
        assert_eq!(uk().expand(&input), input);
    }

    #[test]
    fn test_namespace_sets_expand_within_set() {
        let expansion = AliasExpansion::new(AliasExpansionConfig::namespace_sets(vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["x".to_string(), "y".to_string()],
        ]))
        .unwrap();

        let expanded = expansion.expand(&set(&[("b", "1")]));
        assert_eq!(expanded, set(&[("a", "1"), ("b", "1"), ("c", "1")]));
    }

    #[test]
    fn test_overlapping_namespace_sets_fail_construction() {
        let result = AliasExpansion::new(AliasExpansionConfig::namespace_sets(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["a".to_string(), "c".to_string()],
        ]));
        assert!(matches!(
            result,
            Err(AliasConfigError::OverlappingNamespaceSets(_))
        ));
    }

    #[test]
    fn test_accepts_lookup_namespaces() {
        let expansion = uk();
        for ns in [
            "gb:barb:broadcastGroup:5:parentVersionBcid",
            "gb:barb:originatingOwner:broadcastGroup:2:bcid",
            "gb:uktv:bcid",
            "gb:barb:contentid",
        ] {
            assert!(expansion.accepts(&Alias::new(ns, "v")), "{}", ns);
        }
        assert!(!expansion.accepts(&Alias::new("gb:barb:broadcastGroup:2:txnumber", "v")));
        assert!(!expansion.accepts(&Alias::new("gb:amazon:asin", "v")));

        let plain = AliasExpansion::new(AliasExpansionConfig::empty()).unwrap();
        assert!(plain.accepts(&Alias::new("gb:amazon:asin", "v")));
    }

    #[test]
    fn test_foreign_originating_owner() {
        let expansion = uk();
        let groups = expansion.broadcast_groups().unwrap();

        let sky_with_itv_owner = set(&[
            ("gb:barb:broadcastGroup:5:bcid", "S1"),
            ("gb:barb:originatingOwner:broadcastGroup:2:bcid", "I1"),
        ]);
        assert!(groups.has_foreign_originating_owner(&sky_with_itv_owner, 5));

        let sky_owned = set(&[
            ("gb:barb:broadcastGroup:5:bcid", "S1"),
            ("gb:barb:originatingOwner:broadcastGroup:5:bcid", "S1"),
        ]);
        assert!(!groups.has_foreign_originating_owner(&sky_owned, 5));

        let sky_fifty = set(&[
            ("gb:barb:broadcastGroup:50:bcid", "S1"),
            ("gb:barb:originatingOwner:broadcastGroup:2:bcid", "I1"),
        ]);
        assert!(!groups.has_foreign_originating_owner(&sky_fifty, 5));
        assert!(groups.is_unreliable_parent_version(5));
        assert!(!groups.is_unreliable_parent_version(2));
    }
}
