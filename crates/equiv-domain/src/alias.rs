//! Alias module - identifiers stamped on content by source systems

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(namespace, value)` identifier pair
///
/// Equality is structural. Ordering is by namespace then value so alias sets
/// iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Alias {
    /// Identifier namespace, e.g. `gb:barb:broadcastGroup:2:bcid`
    pub namespace: String,
    /// Identifier value within the namespace
    pub value: String,
}

impl Alias {
    /// Create a new alias
    ///
    /// # Examples
    ///
    /// ```
    /// use equiv_domain::Alias;
    ///
    /// let alias = Alias::new("gb:barb:broadcastGroup:2:bcid", "ABC123");
    /// assert_eq!(alias.value, "ABC123");
    /// ```
    pub fn new(namespace: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            value: value.into(),
        }
    }

    /// Same value, different namespace
    pub fn in_namespace(&self, namespace: impl Into<String>) -> Self {
        Self::new(namespace, self.value.clone())
    }

    /// Same namespace, different value
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), value)
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.namespace, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Alias::new("ns", "v"), Alias::new("ns", "v"));
        assert_ne!(Alias::new("ns", "v"), Alias::new("ns", "w"));
        assert_ne!(Alias::new("ns", "v"), Alias::new("other", "v"));
    }

    #[test]
    fn test_rewrites_keep_the_other_half() {
        let alias = Alias::new("a", "1");
        assert_eq!(alias.in_namespace("b"), Alias::new("b", "1"));
        assert_eq!(alias.with_value("2"), Alias::new("a", "2"));
    }

    #[test]
    fn test_set_ordering_is_by_namespace_then_value() {
        let set: BTreeSet<Alias> = [
            Alias::new("b", "1"),
            Alias::new("a", "2"),
            Alias::new("a", "1"),
        ]
        .into_iter()
        .collect();

        let ordered: Vec<String> = set.iter().map(|a| a.to_string()).collect();
        assert_eq!(ordered, vec!["a=1", "a=2", "b=1"]);
    }
}
