//! Per-contact message log and timeframe summaries
//!
//! Keeps a bounded history of classified messages for each contact so callers
//! can filter by category or priority and build hourly/daily/weekly digests.

use crate::config::MessageLogConfig;
use crate::types::{Category, ClassificationResult, Message};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// A classified message retained in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedMessage {
    pub message_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sender_id: String,
    pub classification: ClassificationResult,
}

/// Summary window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Hourly,
    Daily,
    Weekly,
}

impl Timeframe {
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Hourly => Duration::hours(1),
            Timeframe::Daily => Duration::hours(24),
            Timeframe::Weekly => Duration::days(7),
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hourly" => Ok(Timeframe::Hourly),
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            other => Err(format!("unknown timeframe: {}", other)),
        }
    }
}

/// Per-category section of a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub count: usize,
    pub high_priority: usize,
    pub top_messages: Vec<TrackedMessage>,
}

/// Digest of a contact's messages over a timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub timeframe: Timeframe,
    pub total_messages: usize,
    pub categories: Vec<CategorySummary>,
    pub urgent_messages: Vec<TrackedMessage>,
    pub average_sentiment: f64,
    pub generated_at: DateTime<Utc>,
}

/// Bounded per-contact message log
pub struct MessageLog {
    config: MessageLogConfig,
    messages: RwLock<HashMap<String, VecDeque<TrackedMessage>>>,
    summaries: RwLock<HashMap<(String, Timeframe), MessageSummary>>,
}

impl MessageLog {
    pub fn new(config: MessageLogConfig) -> Self {
        Self {
            config,
            messages: RwLock::new(HashMap::new()),
            summaries: RwLock::new(HashMap::new()),
        }
    }

    /// Append a classified message, evicting the oldest beyond capacity
    pub fn record(&self, contact_id: &str, message: &Message, classification: &ClassificationResult) {
        let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
        let log = messages.entry(contact_id.to_string()).or_default();

        log.push_back(TrackedMessage {
            message_id: message.id.clone(),
            content: message.body.clone(),
            timestamp: message.timestamp,
            sender_id: message.sender_id.clone(),
            classification: classification.clone(),
        });

        while log.len() > self.config.max_messages_per_contact {
            log.pop_front();
        }
    }

    /// Number of retained messages for a contact
    pub fn len(&self, contact_id: &str) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contact_id)
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, contact_id: &str) -> bool {
        self.len(contact_id) == 0
    }

    /// Messages of one category, oldest first
    pub fn by_category(&self, contact_id: &str, category: Category) -> Vec<TrackedMessage> {
        self.filter(contact_id, |m| m.classification.category == category)
    }

    /// Messages at or above a priority, oldest first
    pub fn by_min_priority(&self, contact_id: &str, min_priority: u8) -> Vec<TrackedMessage> {
        self.filter(contact_id, |m| m.classification.priority >= min_priority)
    }

    /// Build and cache a summary of the messages inside `timeframe` before `now`
    pub fn summarize(
        &self,
        contact_id: &str,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> MessageSummary {
        let cutoff = now - timeframe.duration();
        let relevant = self.filter(contact_id, |m| m.timestamp >= cutoff && m.timestamp <= now);

        let categories = Category::ALL
            .iter()
            .filter_map(|category| {
                let in_category: Vec<&TrackedMessage> = relevant
                    .iter()
                    .filter(|m| m.classification.category == *category)
                    .collect();
                if in_category.is_empty() {
                    return None;
                }
                Some(CategorySummary {
                    category: *category,
                    count: in_category.len(),
                    high_priority: in_category
                        .iter()
                        .filter(|m| m.classification.priority >= self.config.high_priority_threshold)
                        .count(),
                    top_messages: in_category
                        .iter()
                        .take(self.config.top_messages)
                        .map(|m| (*m).clone())
                        .collect(),
                })
            })
            .collect();

        let urgent_messages = relevant
            .iter()
            .filter(|m| m.classification.priority >= self.config.urgent_priority_threshold)
            .cloned()
            .collect();

        let average_sentiment = if relevant.is_empty() {
            0.0
        } else {
            relevant
                .iter()
                .map(|m| m.classification.sentiment.score)
                .sum::<f64>()
                / relevant.len() as f64
        };

        let summary = MessageSummary {
            timeframe,
            total_messages: relevant.len(),
            categories,
            urgent_messages,
            average_sentiment,
            generated_at: now,
        };

        debug!(
            "Summarized {} messages for {} ({:?})",
            summary.total_messages, contact_id, timeframe
        );

        self.summaries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((contact_id.to_string(), timeframe), summary.clone());

        summary
    }

    /// Most recently built summary for a contact and timeframe
    pub fn latest_summary(&self, contact_id: &str, timeframe: Timeframe) -> Option<MessageSummary> {
        self.summaries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(contact_id.to_string(), timeframe))
            .cloned()
    }

    fn filter(
        &self,
        contact_id: &str,
        predicate: impl Fn(&TrackedMessage) -> bool,
    ) -> Vec<TrackedMessage> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contact_id)
            .map(|log| log.iter().filter(|m| predicate(m)).cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(MessageLogConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MessageClassifier;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
    }

    fn track(log: &MessageLog, classifier: &MessageClassifier, body: &str, minutes_ago: i64) {
        let message = Message::new("chat", "alice", body, base_time() - Duration::minutes(minutes_ago));
        let classification = classifier.classify(&message);
        log.record("alice", &message, &classification);
    }

    #[test]
    fn test_retrieve_by_category_and_priority() {
        let log = MessageLog::default();
        let classifier = MessageClassifier::default();
        track(&log, &classifier, "URGENT: Critical issue!", 5);
        track(&log, &classifier, "Regular update", 4);

        let urgent = log.by_category("alice", Category::Urgent);
        assert_eq!(urgent.len(), 1);
        assert_eq!(urgent[0].classification.category, Category::Urgent);

        let high = log.by_min_priority("alice", 7);
        assert!(!high.is_empty());
        assert!(high.iter().all(|m| m.classification.priority >= 7));

        assert!(log.by_category("bob", Category::Urgent).is_empty());
    }

    #[test]
    fn test_daily_summary() {
        let log = MessageLog::default();
        let classifier = MessageClassifier::default();
        track(&log, &classifier, "URGENT: Critical issue!", 30);
        track(&log, &classifier, "Meeting tomorrow", 20);
        track(&log, &classifier, "How are you?", 10);
        track(&log, &classifier, "Old news about the project", 60 * 30);

        let summary = log.summarize("alice", Timeframe::Daily, base_time());
        assert_eq!(summary.total_messages, 3);
        assert!(summary.categories.iter().any(|c| c.category == Category::Urgent));
        assert!(summary.categories.iter().any(|c| c.category == Category::Work));
        assert!(summary.categories.iter().any(|c| c.category == Category::Personal));
        assert!(!summary.urgent_messages.is_empty());
        assert!(summary.urgent_messages[0].classification.priority >= 8);

        let weekly = log.summarize("alice", Timeframe::Weekly, base_time());
        assert_eq!(weekly.total_messages, 4);

        let cached = log.latest_summary("alice", Timeframe::Daily).unwrap();
        assert_eq!(cached, summary);
        assert!(log.latest_summary("alice", Timeframe::Hourly).is_none());
    }

    #[test]
    fn test_empty_summary() {
        let log = MessageLog::default();
        let summary = log.summarize("nobody", Timeframe::Hourly, base_time());
        assert_eq!(summary.total_messages, 0);
        assert!(summary.categories.is_empty());
        assert_eq!(summary.average_sentiment, 0.0);
    }

    #[test]
    fn test_log_is_bounded() {
        let log = MessageLog::new(MessageLogConfig {
            max_messages_per_contact: 3,
            ..Default::default()
        });
        let classifier = MessageClassifier::default();
        for i in 0..5 {
            track(&log, &classifier, &format!("message {}", i), 10 - i);
        }
        assert_eq!(log.len("alice"), 3);
        let remaining = log.by_min_priority("alice", 0);
        assert_eq!(remaining[0].content, "message 2");
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!("Daily".parse::<Timeframe>().unwrap(), Timeframe::Daily);
        assert!("monthly".parse::<Timeframe>().is_err());
    }
}
