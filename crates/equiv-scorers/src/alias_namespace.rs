//! Alias confirmation scorer
//!
//! Confirms an alias-generated candidate by checking which of its own
//! aliases the subject shares. This is also where untrusted parent-version
//! bcids are dealt with: whether a broadcast group's parent-version bcid can
//! be trusted depends on the candidate's originating owner, which is only
//! known once the candidate has been resolved.

use crate::EquivalenceScorer;
use equiv_alias::{
    AliasExpander, AliasExpansion, BroadcastGroupRules, GroupNamespace, GroupOwner, GroupSuffix,
};
use equiv_domain::{Alias, Content, Score, ScoredCandidates};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Scores a candidate by whether it carries one of the subject's expanded
/// aliases
#[derive(Debug, Clone)]
pub struct AliasNamespaceScorer {
    expansion: Arc<AliasExpansion>,
    matched: Score,
    mismatched: Score,
}

impl AliasNamespaceScorer {
    /// Name of the scores this scorer produces
    pub const NAME: &'static str = "Alias Namespace";

    /// Scorer with the usual 10.0 on match and 0.0 on mismatch
    pub fn new(expansion: Arc<AliasExpansion>) -> Self {
        Self::with_scores(expansion, Score::Real(10.0), Score::ZERO)
    }

    /// Scorer with explicit match and mismatch scores
    pub fn with_scores(expansion: Arc<AliasExpansion>, matched: Score, mismatched: Score) -> Self {
        Self {
            expansion,
            matched,
            mismatched,
        }
    }

    /// Score `candidate` against a subject whose aliases were already expanded
    pub fn score_expanded(
        &self,
        subject: &Content,
        expanded: &BTreeSet<Alias>,
        candidate: &Content,
    ) -> Score {
        let Some(groups) = self.expansion.broadcast_groups() else {
            return self.plain_match(expanded, candidate);
        };

        for alias in &candidate.aliases {
            let unreliable_group = groups
                .parse(&alias.namespace)
                .filter(|ns| {
                    ns.owner == GroupOwner::BroadcastGroup
                        && groups.is_unreliable_parent_version(ns.group)
                });

            let confirmed = match unreliable_group {
                Some(ns) => {
                    let subject_flagged =
                        groups.has_foreign_originating_owner(&subject.aliases, ns.group);
                    let candidate_flagged =
                        groups.has_foreign_originating_owner(&candidate.aliases, ns.group);
                    if subject_flagged || candidate_flagged {
                        confirm_untrusted(
                            groups,
                            subject,
                            alias,
                            ns,
                            subject_flagged,
                            candidate_flagged,
                        )
                    } else {
                        expanded.contains(alias)
                    }
                }
                None => expanded.contains(alias),
            };

            if confirmed {
                return self.matched;
            }
        }
        self.mismatched
    }

    fn plain_match(&self, expanded: &BTreeSet<Alias>, candidate: &Content) -> Score {
        if candidate.aliases.iter().any(|alias| expanded.contains(alias)) {
            self.matched
        } else {
            self.mismatched
        }
    }
}

/// Match rules for an alias in a group whose parent-version bcids are
/// untrusted, when either side originates from another group
///
/// Only the subject's own aliases count here, never their expansion. A
/// parent-version bcid on the candidate is only trusted when the candidate
/// itself is not flagged, and a parent-version bcid on the subject only when
/// the subject is not flagged.
fn confirm_untrusted(
    groups: &BroadcastGroupRules,
    subject: &Content,
    alias: &Alias,
    ns: GroupNamespace,
    subject_flagged: bool,
    candidate_flagged: bool,
) -> bool {
    match ns.suffix {
        GroupSuffix::ParentVersionBcid => {
            let bcid = alias.in_namespace(groups.render(ns.with_suffix(GroupSuffix::Bcid)));
            !candidate_flagged && subject.aliases.contains(&bcid)
        }
        GroupSuffix::Bcid => {
            if subject.aliases.contains(alias) {
                return true;
            }
            let parent =
                alias.in_namespace(groups.render(ns.with_suffix(GroupSuffix::ParentVersionBcid)));
            !subject_flagged && subject.aliases.contains(&parent)
        }
    }
}

impl EquivalenceScorer for AliasNamespaceScorer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn score(&self, subject: &Content, candidate: &Content) -> Score {
        let expanded = self.expansion.expand(&subject.aliases);
        self.score_expanded(subject, &expanded, candidate)
    }

    fn score_all(&self, subject: &Content, candidates: &[Arc<Content>]) -> ScoredCandidates {
        let expanded = self.expansion.expand(&subject.aliases);
        let mut scores = ScoredCandidates::new(self.name());
        for candidate in candidates {
            scores.set(
                candidate.clone(),
                self.score_expanded(subject, &expanded, candidate),
            );
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equiv_alias::AliasExpansionConfig;
    use equiv_domain::{ContentKind, Publisher};

    const SKY_BCID: &str = "gb:barb:broadcastGroup:5:bcid";
    const SKY_PARENT: &str = "gb:barb:broadcastGroup:5:parentVersionBcid";
    const ITV_OWNER: &str = "gb:barb:originatingOwner:broadcastGroup:2:bcid";

    fn scorer() -> AliasNamespaceScorer {
        AliasNamespaceScorer::new(Arc::new(
            AliasExpansion::new(AliasExpansionConfig::default()).unwrap(),
        ))
    }

    fn content(id: u64, aliases: &[(&str, &str)]) -> Content {
        aliases.iter().fold(
            Content::new(id, format!("uri:{}", id), Publisher::new("barb"), ContentKind::Item),
            |c, (ns, v)| c.with_alias(Alias::new(*ns, *v)),
        )
    }

    #[test]
    fn test_expanded_alias_match() {
        let subject = content(1, &[("gb:barb:broadcastGroup:2:bcid", "ABC")]);
        let candidate = content(2, &[("gb:itv:production:id", "ABC")]);
        assert_eq!(scorer().score(&subject, &candidate), Score::Real(10.0));
    }

    #[test]
    fn test_no_shared_alias_scores_mismatch() {
        let subject = content(1, &[("gb:barb:broadcastGroup:2:bcid", "ABC")]);
        let candidate = content(2, &[("gb:barb:broadcastGroup:2:bcid", "XYZ")]);
        assert_eq!(scorer().score(&subject, &candidate), Score::ZERO);
    }

    #[test]
    fn test_sky_parent_version_trusted_without_foreign_owner() {
        let subject = content(1, &[(SKY_BCID, "P1")]);
        let candidate = content(2, &[(SKY_PARENT, "P1")]);
        assert_eq!(scorer().score(&subject, &candidate), Score::Real(10.0));
    }

    #[test]
    fn test_subject_parent_version_ignored_when_subject_has_foreign_owner() {
        let subject = content(1, &[(SKY_PARENT, "P1"), (SKY_BCID, "S1"), (ITV_OWNER, "I1")]);
        let candidate = content(2, &[(SKY_BCID, "P1")]);
        assert_eq!(scorer().score(&subject, &candidate), Score::ZERO);
    }

    #[test]
    fn test_candidate_parent_version_ignored_when_candidate_has_foreign_owner() {
        let subject = content(1, &[(SKY_BCID, "P1")]);
        let candidate = content(2, &[(SKY_PARENT, "P1"), (SKY_BCID, "S2"), (ITV_OWNER, "I1")]);
        assert_eq!(scorer().score(&subject, &candidate), Score::ZERO);
    }

    #[test]
    fn test_flagged_subject_still_matches_on_bcid() {
        let subject = content(1, &[(SKY_BCID, "S1"), (ITV_OWNER, "I1")]);
        let candidate = content(2, &[(SKY_BCID, "S1")]);
        assert_eq!(scorer().score(&subject, &candidate), Score::Real(10.0));
    }

    #[test]
    fn test_flagged_candidate_matches_unflagged_subject_parent() {
        let subject = content(1, &[(SKY_PARENT, "S2")]);
        let candidate = content(2, &[(SKY_BCID, "S2"), (ITV_OWNER, "I1")]);
        assert_eq!(scorer().score(&subject, &candidate), Score::Real(10.0));
    }

    #[test]
    fn test_score_all_matches_score() {
        let scorer = scorer();
        let subject = content(1, &[("gb:barb:broadcastGroup:3:bcid", "C4:9")]);
        let candidates = vec![
            Arc::new(content(2, &[("gb:channel4:prod:pmlsd:programmeId", "9")])),
            Arc::new(content(3, &[("gb:channel4:prod:pmlsd:programmeId", "10")])),
        ];
        let scores = scorer.score_all(&subject, &candidates);
        assert_eq!(scores.source(), AliasNamespaceScorer::NAME);
        assert_eq!(scores.score_for("uri:2"), Some(Score::Real(10.0)));
        assert_eq!(scores.score_for("uri:3"), Some(Score::ZERO));
    }

    #[test]
    fn test_namespace_sets_without_groups() {
        let expansion = AliasExpansion::new(AliasExpansionConfig::namespace_sets(vec![vec![
            "gb:amazon:asin".to_string(),
            "uk:amazon:asin".to_string(),
        ]]))
        .unwrap();
        let scorer =
            AliasNamespaceScorer::with_scores(Arc::new(expansion), Score::ONE, Score::Unscored);
        let subject = content(1, &[("gb:amazon:asin", "B1")]);
        let candidate = content(2, &[("uk:amazon:asin", "B1")]);
        assert_eq!(scorer.score(&subject, &candidate), Score::ONE);
        let other = content(3, &[("uk:amazon:asin", "B2")]);
        assert_eq!(scorer.score(&subject, &other), Score::Unscored);
    }
}
