//! Broadcast-matching generator
//!
//! Two records broadcast on the same channel at the same time are very
//! likely the same programme. For each of the subject's broadcasts the
//! schedule around it is read and every record with a broadcast on that
//! channel whose start and end agree within `flexibility` scores a full
//! match. A record whose start agrees but whose end only agrees within the
//! extended end window scores a tenth, which catches listings that drifted.

use crate::{BroadcastMatchingConfig, EquivalenceGenerator, GeneratorError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use equiv_domain::traits::{ChannelResolver, ScheduleChannel, ScheduleQuery, ScheduleResolver};
use equiv_domain::{Broadcast, Content, Publisher, ReadError, Score, ScoredCandidates};
use futures::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Finds records scheduled against the subject's broadcasts
pub struct BroadcastMatchingGenerator {
    schedule: Arc<dyn ScheduleResolver>,
    channels: Arc<dyn ChannelResolver>,
    publishers: BTreeSet<Publisher>,
    config: BroadcastMatchingConfig,
    ignored: HashSet<String>,
    now: Option<DateTime<Utc>>,
}

impl BroadcastMatchingGenerator {
    /// Source label
    pub const NAME: &'static str = "broadcast";

    /// Create a generator reading the schedules of `publishers`
    pub fn new(
        schedule: Arc<dyn ScheduleResolver>,
        channels: Arc<dyn ChannelResolver>,
        publishers: BTreeSet<Publisher>,
        config: BroadcastMatchingConfig,
    ) -> Self {
        let ignored = config.ignored_channels.iter().cloned().collect();
        Self {
            schedule,
            channels,
            publishers,
            config,
            ignored,
            now: None,
        }
    }

    /// Measure the horizon from a fixed time instead of the clock
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn should_process(
        &self,
        broadcast: &Broadcast,
        broadcasts_in_version: usize,
        horizon: Option<DateTime<Utc>>,
    ) -> bool {
        broadcast.actively_published
            && (!self.ignored.contains(&broadcast.channel_uri) || broadcasts_in_version == 1)
            && horizon.is_none_or(|limit| broadcast.start < limit)
    }

    /// Schedule window around a broadcast, narrower for short broadcasts
    fn window(&self, broadcast: &Broadcast) -> (DateTime<Utc>, DateTime<Utc>) {
        let padding = if broadcast.duration() < self.config.short_broadcast() {
            self.config.short_broadcast_flexibility()
        } else {
            self.config.flexibility()
        };
        (broadcast.start - padding, broadcast.end + padding)
    }

    /// Schedule around `broadcast`, or `None` when its channel is unknown
    async fn schedule_around(
        &self,
        broadcast: &Broadcast,
        publishers: &BTreeSet<Publisher>,
    ) -> Result<Option<Vec<ScheduleChannel>>, ReadError> {
        let Some(channel) = self.channels.channel_for_uri(&broadcast.channel_uri).await? else {
            debug!("Unknown channel {}, skipping broadcast", broadcast.channel_uri);
            return Ok(None);
        };

        let (start, end) = self.window(broadcast);
        let query = ScheduleQuery {
            start,
            end,
            channels: vec![channel],
            publishers: publishers.clone(),
        };
        Ok(Some(self.schedule.schedule(&query).await?))
    }

    fn score_schedule(
        &self,
        reference: &Broadcast,
        schedule: Vec<ScheduleChannel>,
        scores: &mut ScoredCandidates,
    ) {
        let flexibility = self.config.flexibility();
        let extended = self.config.extended_end_flexibility();
        let full = Score::Real(self.config.score_on_match);
        let partial = Score::Real(self.config.score_on_match / 10.0);

        for item in schedule.into_iter().flat_map(|channel| channel.items) {
            if !item.actively_published || item.is_container() {
                continue;
            }
            if has_broadcast(&item, reference, flexibility, flexibility) {
                scores.add(item, full);
            } else if has_broadcast(&item, reference, flexibility, extended) {
                scores.add(item, partial);
            }
        }
    }
}

fn around(time: DateTime<Utc>, reference: DateTime<Utc>, flexibility: Duration) -> bool {
    time >= reference - flexibility && time <= reference + flexibility
}

/// Whether `item` has a published broadcast on the reference channel whose
/// start and end agree with the reference within the given tolerances
fn has_broadcast(
    item: &Content,
    reference: &Broadcast,
    start_flexibility: Duration,
    end_flexibility: Duration,
) -> bool {
    item.broadcasts().any(|b| {
        b.actively_published
            && b.channel_uri == reference.channel_uri
            && around(b.start, reference.start, start_flexibility)
            && around(b.end, reference.end, end_flexibility)
    })
}

#[async_trait]
impl EquivalenceGenerator for BroadcastMatchingGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate(&self, subject: &Content) -> Result<ScoredCandidates, GeneratorError> {
        let mut scores = ScoredCandidates::new(Self::NAME);

        let publishers: BTreeSet<Publisher> = self
            .publishers
            .iter()
            .filter(|p| **p != subject.publisher)
            .cloned()
            .collect();
        if publishers.is_empty() {
            return Ok(scores);
        }

        let now = self.now.unwrap_or_else(Utc::now);
        let horizon = self.config.horizon().map(|h| now + h);

        let total = subject.broadcasts().count();
        let processed: Vec<&Broadcast> = subject
            .versions
            .iter()
            .flat_map(|version| {
                let count = version.broadcasts.len();
                version
                    .broadcasts
                    .iter()
                    .filter(move |b| self.should_process(b, count, horizon))
            })
            .collect();

        let schedules = join_all(
            processed
                .iter()
                .map(|broadcast| self.schedule_around(broadcast, &publishers)),
        )
        .await;

        for (broadcast, schedule) in processed.iter().zip(schedules) {
            if let Some(schedule) = schedule? {
                self.score_schedule(broadcast, schedule, &mut scores);
            }
        }

        debug!(
            "Processed {} of {} broadcasts for {}, {} candidates",
            processed.len(),
            total,
            subject.canonical_uri,
            scores.len()
        );

        if self.config.scale_by_broadcasts && !processed.is_empty() {
            let count = processed.len() as f64;
            scores = scores.map_scores(|c| c.score.map(|v| v / count));
        }
        Ok(scores)
    }
}
