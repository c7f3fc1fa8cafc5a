//! Equiv Updater
//!
//! Orchestrates one equivalence run per subject: generators run
//! concurrently, scorers score the union of what they found, and the result
//! builder combines, filters and extracts before handlers persist the
//! outcome.
//!
//! ## Components
//!
//! - [`EquivalenceUpdater`]: the per-subject pipeline
//! - [`UpdaterPreset`]: named assemblies of generators, scorers and result stages
//! - [`UpdaterRegistry`]: item and container updaters per subject publisher
//! - [`BulkRunner`]: many subjects with bounded concurrency
//! - [`EquivConfig`]: TOML configuration for all of the above
//!
//! # Examples
//!
//! ```
//! use equiv_updater::EquivConfig;
//!
//! let config = EquivConfig::from_toml(r#"
//!     [[sources]]
//!     publisher = "pa"
//!     item = "alias_item"
//!     targets = ["bbc"]
//! "#).unwrap();
//! assert_eq!(config.sources[0].publisher, "pa");
//! ```

#![warn(missing_docs)]

mod bulk;
mod config;
mod error;
mod handlers;
mod presets;
mod registry;
mod updater;

pub use bulk::{BulkReport, BulkRunner, SubjectOutcome};
pub use config::{EquivConfig, PipelineConfig, SourceConfig};
pub use error::{ConfigError, UpdaterError};
pub use handlers::{EpisodeFilterMode, EpisodeFilteringHandler, HandlerChain};
pub use presets::{UpdaterDependencies, UpdaterPreset};
pub use registry::UpdaterRegistry;
pub use updater::EquivalenceUpdater;
