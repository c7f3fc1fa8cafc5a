//! Equiv Alias Expansion
//!
//! Builds cross-publisher identifier equivalence classes. Given a subject's
//! aliases, produces the superset of aliases it *should* match on, by
//! traversing a static namespace-mapping table.
//!
//! Two kinds of rule are supported:
//! - **Namespace sets**: every namespace in a set is interchangeable for the
//!   same value
//! - **Broadcast-group rules**: broadcast-group / originating-owner bcid
//!   namespaces, their parent-version siblings, per-broadcaster CMS
//!   namespaces, value prefixes and group-level aliases
//!
//! Expansion is a fixpoint over these rewrites, so it is idempotent,
//! add-only and independent of traversal order.
//!
//! # Examples
//!
//! ```
//! use equiv_alias::{AliasExpander, AliasExpansion, AliasExpansionConfig};
//! use equiv_domain::Alias;
//! use std::collections::BTreeSet;
//!
//! let expansion = AliasExpansion::new(AliasExpansionConfig::default()).unwrap();
//! let aliases: BTreeSet<Alias> =
//!     [Alias::new("gb:barb:broadcastGroup:2:bcid", "ABC123")].into_iter().collect();
//!
//! let expanded = expansion.expand(&aliases);
//! assert!(expanded.contains(&Alias::new("gb:barb:broadcastGroup:111:bcid", "ABC123")));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod expansion;
mod namespace;

pub use config::{AliasExpansionConfig, BroadcastGroupConfig, CmsNamespace, GroupAlias, ValuePrefixes};
pub use error::AliasConfigError;
pub use expansion::{AliasExpander, AliasExpansion, BroadcastGroupRules, NamespaceSets};
pub use namespace::{GroupNamespace, GroupOwner, GroupSuffix};
