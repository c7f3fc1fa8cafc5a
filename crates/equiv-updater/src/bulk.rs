//! Bulk equivalence runs over many subjects

use crate::registry::UpdaterRegistry;
use crate::UpdaterError;
use equiv_domain::traits::ContentResolver;
use equiv_domain::Content;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of one subject in a bulk run
#[derive(Debug)]
pub enum SubjectOutcome {
    /// The pipeline completed
    Updated {
        /// Subject URI
        subject: String,
        /// Number of accepted equivalents
        accepted: usize,
    },
    /// The pipeline failed for this subject only
    Failed {
        /// Subject URI
        subject: String,
        /// Why
        error: UpdaterError,
    },
}

impl SubjectOutcome {
    /// Subject URI
    pub fn subject(&self) -> &str {
        match self {
            SubjectOutcome::Updated { subject, .. } | SubjectOutcome::Failed { subject, .. } => {
                subject
            }
        }
    }

    /// Whether the subject was updated
    pub fn is_updated(&self) -> bool {
        matches!(self, SubjectOutcome::Updated { .. })
    }
}

/// Results of a bulk run, ordered by subject URI
#[derive(Debug, Default)]
pub struct BulkReport {
    /// Per-subject outcomes
    pub outcomes: Vec<SubjectOutcome>,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl BulkReport {
    /// Number of subjects updated
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_updated()).count()
    }

    /// Number of subjects that failed
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Total equivalents accepted across all subjects
    pub fn total_accepted(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                SubjectOutcome::Updated { accepted, .. } => *accepted,
                SubjectOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Failed subjects with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&str, &UpdaterError)> {
        self.outcomes.iter().filter_map(|o| match o {
            SubjectOutcome::Failed { subject, error } => Some((subject.as_str(), error)),
            SubjectOutcome::Updated { .. } => None,
        })
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Equivalence Run Summary".to_string(),
            "=======================".to_string(),
            format!("Subjects: {}", self.outcomes.len()),
            format!("Updated: {}", self.succeeded()),
            format!("Failed: {}", self.failed()),
            format!("Equivalents accepted: {}", self.total_accepted()),
            format!("Elapsed: {}ms", self.elapsed.as_millis()),
        ];

        if self.failed() > 0 {
            lines.push(String::new());
            lines.push("Failures:".to_string());
            for (subject, error) in self.failures() {
                lines.push(format!("  {}: {}", subject, error));
            }
        }

        lines.join("\n")
    }
}

/// Runs the registry over many subjects with bounded concurrency
///
/// Subjects are independent: one subject's failure is recorded in the
/// report and never stops the others.
pub struct BulkRunner {
    registry: Arc<UpdaterRegistry>,
    resolver: Arc<dyn ContentResolver>,
    concurrency: usize,
}

impl BulkRunner {
    /// Create a runner updating at most `concurrency` subjects at once
    pub fn new(
        registry: Arc<UpdaterRegistry>,
        resolver: Arc<dyn ContentResolver>,
        concurrency: usize,
    ) -> Self {
        Self {
            registry,
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    /// Update already-resolved subjects
    pub async fn run(&self, subjects: Vec<Arc<Content>>) -> BulkReport {
        let started = Instant::now();
        info!(
            "Starting bulk run over {} subjects ({} at a time)",
            subjects.len(),
            self.concurrency
        );

        let outcomes = stream::iter(subjects)
            .map(|subject| {
                let registry = Arc::clone(&self.registry);
                async move {
                    let uri = subject.canonical_uri.clone();
                    match registry.update(subject).await {
                        Ok(result) => SubjectOutcome::Updated {
                            subject: uri,
                            accepted: result.accepted_candidates().count(),
                        },
                        Err(error) => {
                            warn!("Equivalence failed for {}: {}", uri, error);
                            SubjectOutcome::Failed {
                                subject: uri,
                                error,
                            }
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        Self::report(outcomes, started)
    }

    /// Resolve `uris` and update each subject found
    ///
    /// Unknown URIs are reported as [`UpdaterError::SubjectNotFound`]. If
    /// resolution itself fails every URI is reported with the read error.
    pub async fn run_uris(&self, uris: &[String]) -> BulkReport {
        let started = Instant::now();
        let subjects = match self.resolver.resolve_uris(uris).await {
            Ok(subjects) => subjects,
            Err(err) => {
                warn!("Failed to resolve {} subjects: {}", uris.len(), err);
                let outcomes = uris
                    .iter()
                    .map(|uri| SubjectOutcome::Failed {
                        subject: uri.clone(),
                        error: UpdaterError::Read(err.clone()),
                    })
                    .collect();
                return Self::report(outcomes, started);
            }
        };

        let found: BTreeSet<&str> = subjects.iter().map(|s| s.canonical_uri.as_str()).collect();
        let missing: Vec<SubjectOutcome> = uris
            .iter()
            .filter(|uri| !found.contains(uri.as_str()))
            .map(|uri| SubjectOutcome::Failed {
                subject: uri.clone(),
                error: UpdaterError::SubjectNotFound(uri.clone()),
            })
            .collect();

        let mut report = self.run(subjects).await;
        report.outcomes.extend(missing);
        report
            .outcomes
            .sort_by(|a, b| a.subject().cmp(b.subject()));
        report.elapsed = started.elapsed();
        report
    }

    fn report(mut outcomes: Vec<SubjectOutcome>, started: Instant) -> BulkReport {
        outcomes.sort_by(|a, b| a.subject().cmp(b.subject()));
        let report = BulkReport {
            outcomes,
            elapsed: started.elapsed(),
        };
        info!(
            "Bulk run finished: {} updated, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equiv_domain::ReadError;

    #[test]
    fn test_summary() {
        let report = BulkReport {
            outcomes: vec![
                SubjectOutcome::Updated {
                    subject: "pa/1".to_string(),
                    accepted: 2,
                },
                SubjectOutcome::Updated {
                    subject: "pa/2".to_string(),
                    accepted: 1,
                },
                SubjectOutcome::Failed {
                    subject: "pa/3".to_string(),
                    error: UpdaterError::Read(ReadError::Unavailable("schedule".to_string())),
                },
            ],
            elapsed: Duration::from_millis(42),
        };

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.total_accepted(), 3);

        let summary = report.summary();
        assert!(summary.contains("Updated: 2"));
        assert!(summary.contains("Equivalents accepted: 3"));
        assert!(summary.contains("pa/3: Failed to read subject"));
    }

    #[test]
    fn test_empty_report() {
        let report = BulkReport::default();
        assert_eq!(report.failed(), 0);
        assert!(!report.summary().contains("Failures:"));
    }
}
