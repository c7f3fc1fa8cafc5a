//! Error types for the updater

use equiv_alias::AliasConfigError;
use equiv_domain::{HandlerError, Publisher, ReadError};
use equiv_results::ResultsError;
use thiserror::Error;

/// Failure of one subject's pipeline run
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// Every configured generator failed to read its collaborators
    #[error("No viable generators for {subject}: all {failed} failed")]
    NoViableGenerators {
        /// Subject URI
        subject: String,
        /// Number of failed generators
        failed: usize,
    },

    /// A generator failed with a non-recoverable error or panicked
    #[error("Generator {component} failed for {subject}: {message}")]
    Generator {
        /// Generator name
        component: String,
        /// Subject URI
        subject: String,
        /// What went wrong
        message: String,
    },

    /// A scorer panicked
    #[error("Scorer {component} failed for {subject}: {message}")]
    Scorer {
        /// Scorer name
        component: String,
        /// Subject URI
        subject: String,
        /// What went wrong
        message: String,
    },

    /// A result handler failed
    #[error("Handler failed: {0}")]
    Handler(#[from] HandlerError),

    /// No updater is registered for the subject's publisher and kind
    #[error("No {kind} updater registered for {publisher}")]
    NoUpdater {
        /// Subject publisher
        publisher: Publisher,
        /// "item" or "container"
        kind: &'static str,
    },

    /// The subject could not be read
    #[error("Failed to read subject: {0}")]
    Read(#[from] ReadError),

    /// The subject does not exist
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),
}

impl UpdaterError {
    /// Name of the failing component, when one is to blame
    pub fn component(&self) -> Option<&str> {
        match self {
            UpdaterError::Generator { component, .. } | UpdaterError::Scorer { component, .. } => {
                Some(component)
            }
            _ => None,
        }
    }
}

/// Invalid configuration, reported before any subject is processed
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The alias expansion table is invalid
    #[error("Invalid alias table: {0}")]
    Alias(#[from] AliasConfigError),

    /// A preset could not be assembled
    #[error("Invalid preset: {0}")]
    Preset(#[from] ResultsError),
}
