//! Communication-style modelling
//!
//! Each author (a contact, or the local user) has a [`StyleProfile`] holding
//! language-pattern features, medium preferences and response-time samples.
//! Profiles decay toward zero over elapsed time so that recent behaviour
//! dominates; fresh observations are blended in with an exponential moving
//! average.

pub mod features;
pub mod topics;

pub use features::{FeatureSet, StyleFeature};
pub use topics::{extract_terms, TopicTracker};

use crate::config::StyleConfig;
use crate::contacts::ContactMap;
use crate::error::Result;
use crate::store::{ProfileStore, StyleRecord};
use crate::types::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Gap between two consecutive messages of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTimeSample {
    pub value_ms: i64,
    pub timestamp: DateTime<Utc>,
}

/// Style state for one author
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleProfile {
    /// Bounded FIFO history
    pub response_times: VecDeque<ResponseTimeSample>,
    pub medium_counts: BTreeMap<String, u32>,
    pub language_patterns: FeatureSet,
    pub last_update: Option<DateTime<Utc>>,
}

impl StyleProfile {
    pub fn has_patterns(&self) -> bool {
        !self.language_patterns.is_empty()
    }

    pub fn feature(&self, feature: StyleFeature) -> Option<f64> {
        self.language_patterns.get(&feature).copied()
    }

    /// Mean of the retained response-time samples
    pub fn average_response_time_ms(&self) -> Option<f64> {
        if self.response_times.is_empty() {
            return None;
        }
        let total: i64 = self.response_times.iter().map(|s| s.value_ms).sum();
        Some(total as f64 / self.response_times.len() as f64)
    }

    /// Most used medium; ties resolve to the alphabetically first
    pub fn preferred_medium(&self) -> Option<&str> {
        let mut best: Option<(&str, u32)> = None;
        for (medium, count) in &self.medium_counts {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((medium.as_str(), *count));
            }
        }
        best.map(|(medium, _)| medium)
    }

    /// Scale every language-pattern value by `factor ^ (elapsed / interval)`
    ///
    /// Time that does not advance leaves the profile untouched.
    pub fn decay(&mut self, now: DateTime<Utc>, factor: f64, interval: Duration) {
        let Some(last_update) = self.last_update else {
            self.last_update = Some(now);
            return;
        };

        let elapsed_ms = (now - last_update).num_milliseconds();
        if elapsed_ms <= 0 {
            return;
        }

        let interval_ms = interval.as_millis().max(1) as f64;
        let multiplier = factor.powf(elapsed_ms as f64 / interval_ms).clamp(0.0, 1.0);
        for value in self.language_patterns.values_mut() {
            *value *= multiplier;
        }
        self.last_update = Some(now);
    }

    /// Fold fresh features in: absent ones are set, present ones move by `rate`
    pub fn blend(&mut self, fresh: &FeatureSet, rate: f64) {
        for (feature, value) in fresh {
            if !value.is_finite() {
                continue;
            }
            self.language_patterns
                .entry(*feature)
                .and_modify(|current| *current = *current * (1.0 - rate) + value * rate)
                .or_insert(*value);
        }
    }

    pub fn record_medium(&mut self, medium: &str) {
        *self.medium_counts.entry(medium.to_string()).or_insert(0) += 1;
    }

    pub fn record_response_time(&mut self, sample: ResponseTimeSample, capacity: usize) {
        self.response_times.push_back(sample);
        while self.response_times.len() > capacity {
            self.response_times.pop_front();
        }
    }
}

/// Maintains style profiles keyed by author
pub struct StyleAnalyzer {
    config: StyleConfig,
    profiles: Arc<ContactMap<StyleProfile>>,
}

impl StyleAnalyzer {
    pub fn new(config: StyleConfig) -> Self {
        Self::with_profiles(config, Arc::new(ContactMap::new()))
    }

    /// Use an externally owned profile repository
    pub fn with_profiles(config: StyleConfig, profiles: Arc<ContactMap<StyleProfile>>) -> Self {
        Self { config, profiles }
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Features of a single text
    pub fn analyze_text(&self, text: &str) -> FeatureSet {
        features::extract(text)
    }

    /// Per-feature mean over a sequence of messages
    pub fn analyze_messages(&self, messages: &[Message]) -> FeatureSet {
        features::average(messages.iter().map(|m| m.body.as_str()))
    }

    /// Update an author's profile from one message
    ///
    /// `previous` is the timestamp of the message this one answers, when the
    /// caller knows it; the gap is recorded as a response-time sample.
    pub fn observe(
        &self,
        author: &str,
        message: &Message,
        previous: Option<DateTime<Utc>>,
    ) -> StyleProfile {
        let fresh = self.analyze_text(&message.body);
        let now = message.timestamp;

        self.profiles.with(author, |profile| {
            profile.decay(now, self.config.decay_factor, self.config.update_interval);
            profile.blend(&fresh, self.config.learning_rate);
            profile.record_medium(message.medium());

            if let Some(previous) = previous {
                let gap = (now - previous).num_milliseconds();
                if gap >= 0 {
                    profile.record_response_time(
                        ResponseTimeSample {
                            value_ms: gap,
                            timestamp: now,
                        },
                        self.config.max_response_samples,
                    );
                }
            }

            debug!(
                "Style update for {}: {} features, {} response samples",
                author,
                profile.language_patterns.len(),
                profile.response_times.len()
            );
            profile.clone()
        })
    }

    /// Blend a bare text into an author's language patterns
    pub fn observe_text(&self, author: &str, text: &str, now: DateTime<Utc>) -> StyleProfile {
        let fresh = self.analyze_text(text);
        self.profiles.with(author, |profile| {
            profile.decay(now, self.config.decay_factor, self.config.update_interval);
            profile.blend(&fresh, self.config.learning_rate);
            profile.clone()
        })
    }

    /// Apply time decay to a stored profile without new input
    pub fn decay(&self, author: &str, now: DateTime<Utc>) -> Option<StyleProfile> {
        self.profiles.with_existing(author, |profile| {
            profile.decay(now, self.config.decay_factor, self.config.update_interval);
            profile.clone()
        })
    }

    pub fn profile(&self, author: &str) -> Option<StyleProfile> {
        self.profiles.get(author)
    }

    pub fn authors(&self) -> Vec<String> {
        self.profiles.ids()
    }

    /// Replace an author's profile, e.g. after loading from a store
    pub fn restore(&self, author: &str, profile: StyleProfile) {
        self.profiles.insert(author, profile);
    }

    pub fn snapshot(&self) -> Vec<(String, StyleProfile)> {
        self.profiles.snapshot()
    }

    /// Load every stored style; corrupt records are replaced by empty profiles
    pub fn load(&self, store: &dyn ProfileStore) -> Result<usize> {
        let mut loaded = 0;
        for author in store.style_ids()? {
            let profile = match store.load_style(&author) {
                Ok(Some(record)) => StyleProfile::try_from(record),
                Ok(None) => continue,
                Err(e) => Err(e),
            };

            match profile {
                Ok(profile) => {
                    self.restore(&author, profile);
                    loaded += 1;
                }
                Err(e) => {
                    warn!("Discarding corrupt style for {}: {}", author, e);
                    self.restore(&author, StyleProfile::default());
                }
            }
        }

        info!("Loaded {} style profiles", loaded);
        Ok(loaded)
    }

    /// Save every profile to the store
    pub fn persist(&self, store: &dyn ProfileStore) -> Result<usize> {
        let snapshot = self.profiles.snapshot();
        for (author, profile) in &snapshot {
            store.save_style(author, &StyleRecord::from(profile))?;
        }
        info!("Persisted {} style profiles", snapshot.len());
        Ok(snapshot.len())
    }
}

impl Default for StyleAnalyzer {
    fn default() -> Self {
        Self::new(StyleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn day() -> Duration {
        Duration::from_secs(86_400)
    }

    fn profile_with(feature: StyleFeature, value: f64) -> StyleProfile {
        let mut profile = StyleProfile {
            last_update: Some(t0()),
            ..Default::default()
        };
        profile.language_patterns.insert(feature, value);
        profile
    }

    #[test]
    fn test_decay_one_interval() {
        let mut profile = profile_with(StyleFeature::Formality, 0.8);
        profile.decay(t0() + ChronoDuration::days(1), 0.95, day());
        let value = profile.feature(StyleFeature::Formality).unwrap();
        assert!((value - 0.76).abs() < 1e-9);
        assert_eq!(profile.last_update, Some(t0() + ChronoDuration::days(1)));
    }

    #[test]
    fn test_decay_noop_without_elapsed_time() {
        let mut profile = profile_with(StyleFeature::SentenceLength, 12.0);
        profile.decay(t0(), 0.95, day());
        assert_eq!(profile.feature(StyleFeature::SentenceLength), Some(12.0));

        profile.decay(t0() - ChronoDuration::hours(3), 0.95, day());
        assert_eq!(profile.feature(StyleFeature::SentenceLength), Some(12.0));
        assert_eq!(profile.last_update, Some(t0()));
    }

    #[test]
    fn test_decay_never_increases_magnitude() {
        let mut profile = profile_with(StyleFeature::EmojiUsage, 3.0);
        let mut previous = 3.0;
        for hours in [1, 5, 30, 400] {
            profile.decay(t0() + ChronoDuration::hours(hours), 0.95, day());
            let value = profile.feature(StyleFeature::EmojiUsage).unwrap();
            assert!(value <= previous);
            previous = value;
        }
    }

    #[test]
    fn test_blend_sets_then_averages() {
        let mut profile = StyleProfile::default();
        let mut fresh = FeatureSet::new();
        fresh.insert(StyleFeature::Formality, 1.0);
        profile.blend(&fresh, 0.2);
        assert_eq!(profile.feature(StyleFeature::Formality), Some(1.0));

        fresh.insert(StyleFeature::Formality, 0.0);
        profile.blend(&fresh, 0.2);
        let value = profile.feature(StyleFeature::Formality).unwrap();
        assert!((value - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_observe_tracks_medium_and_response_time() {
        let analyzer = StyleAnalyzer::default();
        let first = Message::new("chat", "alice", "Hello, could you review this?", t0());
        analyzer.observe("alice", &first, None);

        let photo = Message::new("chat", "alice", "", t0() + ChronoDuration::minutes(5))
            .with_media("image");
        let profile = analyzer.observe("alice", &photo, Some(t0()));

        assert_eq!(profile.medium_counts.get("text"), Some(&1));
        assert_eq!(profile.medium_counts.get("image"), Some(&1));
        assert_eq!(profile.response_times.len(), 1);
        assert_eq!(profile.response_times[0].value_ms, 5 * 60 * 1000);
        assert!(profile.feature(StyleFeature::Formality).unwrap() > 0.5);
    }

    #[test]
    fn test_response_history_bounded() {
        let analyzer = StyleAnalyzer::new(StyleConfig {
            max_response_samples: 3,
            ..Default::default()
        });
        for i in 0..6 {
            let at = t0() + ChronoDuration::minutes(i * 10);
            let message = Message::new("chat", "bob", "ok", at);
            analyzer.observe("bob", &message, Some(at - ChronoDuration::minutes(i + 1)));
        }
        let profile = analyzer.profile("bob").unwrap();
        assert_eq!(profile.response_times.len(), 3);
        assert_eq!(profile.response_times[0].value_ms, 4 * 60 * 1000);
    }

    #[test]
    fn test_analyze_messages_averages() {
        let analyzer = StyleAnalyzer::default();
        let messages = vec![
            Message::new("chat", "a", "one two", t0()),
            Message::new("chat", "a", "one two three four", t0()),
        ];
        let averaged = analyzer.analyze_messages(&messages);
        assert_eq!(averaged[&StyleFeature::SentenceLength], 3.0);
        assert!(analyzer.analyze_messages(&[]).is_empty());
    }

    #[test]
    fn test_decay_unknown_author() {
        let analyzer = StyleAnalyzer::default();
        assert!(analyzer.decay("nobody", t0()).is_none());
        assert!(analyzer.authors().is_empty());
    }

    #[test]
    fn test_preferred_medium() {
        let mut profile = StyleProfile::default();
        assert_eq!(profile.preferred_medium(), None);
        profile.record_medium("text");
        profile.record_medium("image");
        profile.record_medium("text");
        assert_eq!(profile.preferred_medium(), Some("text"));
    }
}
