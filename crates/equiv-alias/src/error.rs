//! Alias expansion configuration errors

use thiserror::Error;

/// Errors raised while building an expansion table
///
/// All of these surface at construction time, before any subject is
/// processed.
#[derive(Error, Debug)]
pub enum AliasConfigError {
    /// A namespace appears in more than one namespace set
    #[error("Namespace {0} is contained in multiple namespace sets")]
    OverlappingNamespaceSets(String),

    /// A namespace set with fewer than two namespaces
    #[error("Namespace set {0:?} must contain at least two namespaces")]
    DegenerateNamespaceSet(Vec<String>),

    /// The same CMS namespace is mapped to more than one group
    #[error("CMS namespace {0} is mapped more than once")]
    DuplicateCmsNamespace(String),

    /// A group declared an alias of itself
    #[error("Broadcast group {0} cannot alias itself")]
    SelfAliasedGroup(u32),

    /// A required prefix or suffix is empty or malformed
    #[error("Invalid rule table: {0}")]
    InvalidTable(String),

    /// Failed to read a rule file
    #[error("Failed to read rule file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a rule file
    #[error("Failed to parse rule file: {0}")]
    Parse(#[from] toml::de::Error),
}
