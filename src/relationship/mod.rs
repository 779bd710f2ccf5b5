//! Per-contact relationship tracking
//!
//! Every classified message becomes an [`Interaction`] in a bounded history.
//! After each append the tracker recomputes response time, interaction
//! frequency, sentiment and engagement metrics from the retained window,
//! then derives a 0-10 relationship score, a status and a set of flags.
//!
//! # Score
//!
//! Weighted sum (defaults 0.2 / 0.2 / 0.3 / 0.3) of:
//! - response time: `max(0, 10 - average_hours)`
//! - frequency: `min(10, weekly / 7 * 10)`
//! - sentiment balance: `(balance + n) / 2n * 10`
//! - engagement: mean engagement of the last five interactions
//!
//! Each interaction also records the dominant [`Intent`] of the last five
//! messages, which describes what kind of exchange the contact is in.

pub mod profile;
pub mod trend;

pub use profile::{
    EngagementMetric, FrequencyMetric, Interaction, LastInteraction, Metrics,
    RelationshipFlag, RelationshipProfile, RelationshipStatus, RelationshipSummary,
    ResponseTimeMetric, SentimentMetric,
};

use crate::classifier::intent::{top_intent, Intent};
use crate::config::RelationshipConfig;
use crate::contacts::ContactMap;
use crate::error::Result;
use crate::store::{ProfileStore, RelationshipRecord};
use crate::types::{ClassificationResult, Message, Polarity};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the tracker needs to know about one interaction beyond its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionSample {
    pub timestamp: DateTime<Utc>,
    /// Body length in characters
    pub message_length: usize,
    pub requires_response: bool,
    pub is_from_self: bool,
    /// Primary intent of the message
    pub intent: Option<Intent>,
}

impl InteractionSample {
    pub fn from_message(message: &Message, classification: &ClassificationResult) -> Self {
        Self {
            timestamp: message.timestamp,
            message_length: message.body.chars().count(),
            requires_response: classification.requires_response(),
            is_from_self: message.from_self,
            intent: classification.primary_intent(),
        }
    }
}

/// Messages considered when judging the current exchange, the new one included
const RECENT_CONTEXT: usize = 5;

/// Whether the author changes at least once across the recent exchange
fn has_back_and_forth(interactions: &VecDeque<Interaction>, sample: &InteractionSample) -> bool {
    let authors: Vec<bool> = last_n(interactions, RECENT_CONTEXT - 1)
        .map(|i| i.is_response)
        .chain(std::iter::once(sample.is_from_self))
        .collect();
    authors.windows(2).any(|pair| pair[0] != pair[1])
}

/// Interactions in the 24h and 7d before `at`
fn count_recent<'a>(
    interactions: impl IntoIterator<Item = &'a Interaction>,
    at: DateTime<Utc>,
) -> (u32, u32) {
    let day = Duration::hours(24);
    let week = Duration::days(7);
    let mut daily = 0;
    let mut weekly = 0;

    for interaction in interactions {
        let age = at - interaction.timestamp;
        if age < Duration::zero() {
            continue;
        }
        if age < week {
            weekly += 1;
        }
        if age < day {
            daily += 1;
        }
    }
    (daily, weekly)
}

/// Length of the conversation ending at `at`, counting the new message
fn conversation_length(interactions: &VecDeque<Interaction>, at: DateTime<Utc>, window: Duration) -> usize {
    let mut length = 1;
    let mut cursor = at;
    for interaction in interactions.iter().rev() {
        let gap = cursor - interaction.timestamp;
        if gap < Duration::zero() || gap > window {
            break;
        }
        length += 1;
        cursor = interaction.timestamp;
    }
    length
}

/// Engagement of a new interaction, 0-10
///
/// Built from message length, a pending question or action, an ongoing
/// conversation, a fast reply to the other party, and conversation length.
/// A conversation is ongoing when the previous message is within the window
/// and both parties spoke among the last five messages.
pub fn engagement_score(
    interactions: &VecDeque<Interaction>,
    sample: &InteractionSample,
    window: Duration,
) -> f64 {
    let mut score = (sample.message_length as f64 / 100.0).min(2.0);

    if sample.requires_response {
        score += 2.0;
    }

    if let Some(previous) = interactions.back() {
        let gap = sample.timestamp - previous.timestamp;
        let recent = gap >= Duration::zero() && gap <= window;
        if recent && has_back_and_forth(interactions, sample) {
            score += 2.0;
        }
        if sample.is_from_self && !previous.is_response {
            let hours = gap.num_seconds().max(0) as f64 / 3600.0;
            score += (2.0 - hours).max(0.0);
        }
    }

    let flow = conversation_length(interactions, sample.timestamp, window);
    if flow > 1 {
        score += (flow as f64 / 2.0).min(2.0);
    }

    score.min(10.0)
}

/// Tracks relationship state for every contact
pub struct RelationshipTracker {
    config: RelationshipConfig,
    profiles: Arc<ContactMap<RelationshipProfile>>,
}

impl RelationshipTracker {
    pub fn new(config: RelationshipConfig) -> Self {
        Self::with_profiles(config, Arc::new(ContactMap::new()))
    }

    /// Use an externally owned profile repository
    pub fn with_profiles(
        config: RelationshipConfig,
        profiles: Arc<ContactMap<RelationshipProfile>>,
    ) -> Self {
        Self { config, profiles }
    }

    pub fn config(&self) -> &RelationshipConfig {
        &self.config
    }

    fn conversation_window(&self) -> Duration {
        Duration::from_std(self.config.conversation_window).unwrap_or_else(|_| Duration::hours(1))
    }

    /// Record an interaction and recompute the contact's metrics
    pub fn update(
        &self,
        contact_id: &str,
        classification: &ClassificationResult,
        sample: &InteractionSample,
    ) -> RelationshipProfile {
        self.profiles.with(contact_id, |profile| {
            self.apply(profile, classification, sample);
            debug!(
                "Relationship {} updated: score={:.2}, status={}, flags={}",
                contact_id,
                profile.relationship_score,
                profile.status,
                profile.flags.len()
            );
            profile.clone()
        })
    }

    fn apply(
        &self,
        profile: &mut RelationshipProfile,
        classification: &ClassificationResult,
        sample: &InteractionSample,
    ) {
        let config = &self.config;
        let engagement = engagement_score(&profile.interactions, sample, self.conversation_window());

        // Response time only counts when answering the other party
        if sample.is_from_self {
            if let Some(previous) = profile.interactions.back().filter(|p| !p.is_response) {
                let secs = (sample.timestamp - previous.timestamp).num_seconds().max(0) as f64;
                let weight = config.response_time_ema_weight.max(1.0);
                let metric = &mut profile.metrics.response_time;
                metric.average_secs = (metric.average_secs * (weight - 1.0) + secs) / weight;
                trend::push_sample(&mut metric.samples, secs, config.trend_samples);
                metric.trend = trend::inverse_percent_trend(&metric.samples);
            }
        }

        let (daily, weekly) = count_recent(&profile.interactions, sample.timestamp);
        let frequency = &mut profile.metrics.interaction_frequency;
        frequency.daily = daily;
        frequency.weekly = weekly;
        trend::push_sample(&mut frequency.samples, daily as f64, config.trend_samples);
        frequency.trend = trend::percent_trend(&frequency.samples);

        let top_intent = top_intent(
            last_n(&profile.interactions, RECENT_CONTEXT - 1)
                .filter_map(|i| i.intent)
                .chain(sample.intent),
        );

        profile.interactions.push_back(Interaction {
            timestamp: sample.timestamp,
            sentiment: classification.sentiment.polarity,
            sentiment_score: classification.sentiment.score,
            category: classification.category,
            is_response: sample.is_from_self,
            engagement_score: engagement,
            intent: sample.intent,
            top_intent,
        });
        while profile.interactions.len() > config.max_interactions {
            profile.interactions.pop_front();
        }

        let history: Vec<Polarity> = last_n(&profile.interactions, config.sentiment_history)
            .map(|i| i.sentiment)
            .collect();
        profile.metrics.sentiment = SentimentMetric {
            current: history.last().copied().unwrap_or_default(),
            trend: trend::sentiment_trend(&history),
            history,
        };

        let recent: Vec<f64> = last_n(&profile.interactions, config.engagement_window)
            .map(|i| i.engagement_score)
            .collect();
        let series: Vec<f64> = last_n(&profile.interactions, config.trend_samples)
            .map(|i| i.engagement_score)
            .collect();
        profile.metrics.engagement = EngagementMetric {
            score: recent.iter().sum::<f64>() / recent.len().max(1) as f64,
            trend: trend::percent_trend(&series),
        };

        profile.rescore(&config.weights, config.slow_response_threshold);
        profile.last_interaction = Some(LastInteraction {
            timestamp: sample.timestamp,
            category: classification.category,
            from_self: sample.is_from_self,
            top_intent,
        });
    }

    /// Re-derive frequency, score, status and flags at `now` without a new interaction
    pub fn refresh(&self, contact_id: &str, now: DateTime<Utc>) -> Option<RelationshipProfile> {
        self.profiles.with_existing(contact_id, |profile| {
            let (daily, weekly) = count_recent(&profile.interactions, now);
            profile.metrics.interaction_frequency.daily = daily;
            profile.metrics.interaction_frequency.weekly = weekly;
            profile.rescore(&self.config.weights, self.config.slow_response_threshold);
            debug!(
                "Relationship {} refreshed: daily={}, weekly={}, status={}",
                contact_id, daily, weekly, profile.status
            );
            profile.clone()
        })
    }

    /// Refresh every known contact
    pub fn refresh_all(&self, now: DateTime<Utc>) -> usize {
        self.contacts()
            .iter()
            .filter_map(|contact_id| self.refresh(contact_id, now))
            .count()
    }

    pub fn summary(&self, contact_id: &str) -> Option<RelationshipSummary> {
        self.profiles.with_existing(contact_id, |profile| profile.summary())
    }

    pub fn profile(&self, contact_id: &str) -> Option<RelationshipProfile> {
        self.profiles.get(contact_id)
    }

    pub fn contacts(&self) -> Vec<String> {
        self.profiles.ids()
    }

    /// Replace a contact's profile, e.g. after loading from a store
    pub fn restore(&self, contact_id: &str, profile: RelationshipProfile) {
        self.profiles.insert(contact_id, profile);
    }

    /// Load every stored relationship; corrupt records are replaced by fresh profiles
    pub fn load(&self, store: &dyn ProfileStore) -> Result<usize> {
        let mut loaded = 0;
        for contact_id in store.relationship_ids()? {
            let record = match store.load_relationship(&contact_id) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Discarding unreadable relationship for {}: {}", contact_id, e);
                    self.restore(&contact_id, RelationshipProfile::default());
                    continue;
                }
            };

            match RelationshipProfile::try_from(record) {
                Ok(profile) => {
                    self.restore(&contact_id, profile);
                    loaded += 1;
                }
                Err(e) => {
                    warn!("Discarding corrupt relationship for {}: {}", contact_id, e);
                    self.restore(&contact_id, RelationshipProfile::default());
                }
            }
        }

        info!("Loaded {} relationship profiles", loaded);
        Ok(loaded)
    }

    /// Save every profile to the store
    pub fn persist(&self, store: &dyn ProfileStore) -> Result<usize> {
        let snapshot = self.profiles.snapshot();
        for (contact_id, profile) in &snapshot {
            store.save_relationship(contact_id, &RelationshipRecord::from(profile))?;
        }
        info!("Persisted {} relationship profiles", snapshot.len());
        Ok(snapshot.len())
    }
}

impl Default for RelationshipTracker {
    fn default() -> Self {
        Self::new(RelationshipConfig::default())
    }
}

fn last_n<T>(items: &VecDeque<T>, n: usize) -> impl Iterator<Item = &T> {
    items.iter().skip(items.len().saturating_sub(n))
}
