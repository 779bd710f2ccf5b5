//! Per-message orchestration
//!
//! [`ContextAssembler`] runs one inbound message through classification,
//! relationship tracking, style and topic updates, and hands back a
//! [`ResponseContext`] snapshot for a response generator. Generated text
//! comes back through [`ContextAssembler::score_response`], and user edits
//! through [`ContextAssembler::record_feedback`].
//!
//! Messages for the same contact are processed one at a time; different
//! contacts do not block each other.

use crate::classifier::{MessageClassifier, MessageLog};
use crate::confidence::{
    BoundedLog, ConfidenceFactors, ConfidenceScore, ConfidenceScorer, FeedbackLog, ResponseDiff,
};
use crate::config::RapportConfig;
use crate::contacts::ContactMap;
use crate::error::Result;
use crate::relationship::{InteractionSample, RelationshipSummary, RelationshipTracker};
use crate::store::ProfileStore;
use crate::style::{StyleAnalyzer, StyleProfile, TopicTracker};
use crate::types::{ClassificationResult, Message};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Style profile key for the local user's own messages
pub const USER_STYLE_KEY: &str = "self";

/// Everything a response generator needs to know about one inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseContext {
    pub message_id: String,
    pub contact_id: String,
    pub classification: ClassificationResult,
    pub relationship: RelationshipSummary,
    pub contact_style: StyleProfile,
    pub user_style: Option<StyleProfile>,
    pub topics: Vec<String>,
    /// Set once a candidate response has been scored
    pub confidence: Option<ConfidenceScore>,
}

/// A scored response kept by message id
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedConfidence {
    pub overall: f64,
    pub factors: ConfidenceFactors,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct LastSeen {
    timestamp: DateTime<Utc>,
    from_self: bool,
}

pub struct ContextAssembler {
    classifier: MessageClassifier,
    message_log: MessageLog,
    relationships: RelationshipTracker,
    styles: StyleAnalyzer,
    topics: TopicTracker,
    scorer: ConfidenceScorer,
    feedback: FeedbackLog,
    confidence_log: RwLock<BoundedLog<LoggedConfidence>>,
    last_seen: ContactMap<Option<LastSeen>>,
    pipeline: ContactMap<()>,
    user_key: String,
}

impl ContextAssembler {
    pub fn new(config: RapportConfig) -> Self {
        let logged_responses = config.confidence.max_logged_responses;
        Self {
            classifier: MessageClassifier::new(config.classifier),
            message_log: MessageLog::new(config.message_log),
            relationships: RelationshipTracker::new(config.relationship),
            topics: TopicTracker::new(config.style.topic_window, config.style.max_topics),
            styles: StyleAnalyzer::new(config.style),
            scorer: ConfidenceScorer::new(config.confidence),
            feedback: FeedbackLog::with_capacity(logged_responses),
            confidence_log: RwLock::new(BoundedLog::new(logged_responses)),
            last_seen: ContactMap::new(),
            pipeline: ContactMap::new(),
            user_key: USER_STYLE_KEY.to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: MessageClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Key under which the user's own style is kept
    pub fn with_user_key(mut self, user_key: impl Into<String>) -> Self {
        self.user_key = user_key.into();
        self
    }

    pub fn relationships(&self) -> &RelationshipTracker {
        &self.relationships
    }

    pub fn styles(&self) -> &StyleAnalyzer {
        &self.styles
    }

    pub fn message_log(&self) -> &MessageLog {
        &self.message_log
    }

    pub fn topics(&self) -> &TopicTracker {
        &self.topics
    }

    pub fn feedback(&self) -> &FeedbackLog {
        &self.feedback
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    /// Classify and log a message without touching relationship or style state
    pub fn handle_message(&self, message: &Message) -> ClassificationResult {
        let classification = self.classifier.classify(message);
        self.message_log
            .record(message.contact_id(), message, &classification);
        classification
    }

    /// Run the full pipeline for one message
    pub fn process_message(&self, message: &Message) -> ResponseContext {
        let contact_id = message.contact_id().to_string();
        let lock = self.pipeline.entry(&contact_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let classification = self.handle_message(message);

        let sample = InteractionSample::from_message(message, &classification);
        let relationship = self
            .relationships
            .update(&contact_id, &classification, &sample)
            .summary();

        // A change of author means this message answers the previous one
        let previous = self.last_seen.with(&contact_id, |last| {
            let answered = last
                .filter(|seen| seen.from_self != message.from_self)
                .map(|seen| seen.timestamp);
            *last = Some(LastSeen {
                timestamp: message.timestamp,
                from_self: message.from_self,
            });
            answered
        });

        let author = if message.from_self {
            self.user_key.as_str()
        } else {
            contact_id.as_str()
        };
        self.styles.observe(author, message, previous);

        let topics = self.topics.observe(&contact_id, &message.body);

        debug!(
            "Assembled context for {} ({}): category={}, relationship={}",
            message.id, contact_id, classification.category, relationship.status
        );

        ResponseContext {
            message_id: message.id.clone(),
            contact_style: self.styles.profile(&contact_id).unwrap_or_default(),
            user_style: self.styles.profile(&self.user_key),
            contact_id,
            classification,
            relationship,
            topics,
            confidence: None,
        }
    }

    /// Score a candidate response and remember the score by message id
    pub fn score_response(&self, context: &mut ResponseContext, text: &str) -> ConfidenceScore {
        let score = self.scorer.score(text, context);
        context.confidence = Some(score);

        self.confidence_log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                &context.message_id,
                LoggedConfidence {
                    overall: score.overall,
                    factors: score.factors,
                    timestamp: Utc::now(),
                },
            );

        score
    }

    pub fn logged_confidence(&self, message_id: &str) -> Option<LoggedConfidence> {
        self.confidence_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(message_id)
            .copied()
    }

    /// Number of scored responses currently remembered
    pub fn logged_confidence_len(&self) -> usize {
        self.confidence_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Learn from the user's edit of a proposed response
    pub fn record_feedback(
        &self,
        message_id: &str,
        original: &str,
        edited: &str,
        at: DateTime<Utc>,
    ) -> ResponseDiff {
        let diff = self.feedback.record(message_id, original, edited, at);
        self.styles.observe_text(&self.user_key, edited, at);
        diff
    }

    /// Re-derive time-dependent relationship state for every contact
    pub fn refresh(&self, now: DateTime<Utc>) -> usize {
        self.relationships.refresh_all(now)
    }

    /// Save all relationship and style profiles
    pub fn persist(&self, store: &dyn ProfileStore) -> Result<()> {
        let relationships = self.relationships.persist(store)?;
        let styles = self.styles.persist(store)?;
        info!(
            "Persisted {} relationships and {} styles",
            relationships, styles
        );
        Ok(())
    }

    /// Load all relationship and style profiles
    pub fn restore(&self, store: &dyn ProfileStore) -> Result<()> {
        let relationships = self.relationships.load(store)?;
        let styles = self.styles.load(store)?;
        info!(
            "Restored {} relationships and {} styles",
            relationships, styles
        );
        Ok(())
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(RapportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationshipStatus;
    use crate::types::Category;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 8, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_process_message_builds_context() {
        let assembler = ContextAssembler::default();
        let message = Message::new("alice", "alice", "Can we review the project budget?", t0());
        let context = assembler.process_message(&message);

        assert_eq!(context.message_id, message.id);
        assert_eq!(context.contact_id, "alice");
        assert_eq!(context.classification.category, Category::Work);
        assert_ne!(context.relationship.status, RelationshipStatus::New);
        assert!(context.contact_style.has_patterns());
        assert!(context.user_style.is_none());
        assert!(context.topics.contains(&"budget".to_string()));
        assert!(context.confidence.is_none());
        assert_eq!(assembler.message_log().len("alice"), 1);
    }

    #[test]
    fn test_reply_updates_user_style_with_response_time() {
        let assembler = ContextAssembler::default();
        let inbound = Message::new("alice", "alice", "Are you free tonight?", t0());
        assembler.process_message(&inbound);

        let reply = Message::new("alice", "me", "Yes, see you at eight", t0() + Duration::minutes(4))
            .from_self();
        let context = assembler.process_message(&reply);

        let user_style = context.user_style.unwrap();
        assert_eq!(user_style.response_times.len(), 1);
        assert_eq!(user_style.response_times[0].value_ms, 4 * 60 * 1000);
        assert!(context.contact_style.response_times.is_empty());
        assert!(context.relationship.metrics.response_time.average_secs > 0.0);
    }

    #[test]
    fn test_handle_message_only_classifies() {
        let assembler = ContextAssembler::default();
        let message = Message::new("bob", "bob", "URGENT: respond immediately!!", t0());
        let classification = assembler.handle_message(&message);

        assert_eq!(classification.category, Category::Urgent);
        assert!(assembler.relationships().summary("bob").is_none());
        assert_eq!(assembler.message_log().len("bob"), 1);
    }

    #[test]
    fn test_score_response_is_logged() {
        let assembler = ContextAssembler::default();
        let message = Message::new("alice", "alice", "How was the hiking trip?", t0());
        let mut context = assembler.process_message(&message);

        let score = assembler.score_response(&mut context, "The hiking trip was great!");
        assert_eq!(context.confidence, Some(score));
        assert!((0.0..=1.0).contains(&score.overall));

        let logged = assembler.logged_confidence(&message.id).unwrap();
        assert_eq!(logged.overall, score.overall);
        assert!(assembler.logged_confidence("other").is_none());
    }

    #[test]
    fn test_logs_are_bounded() {
        let mut config = RapportConfig::default();
        config.confidence.max_logged_responses = 3;
        let assembler = ContextAssembler::new(config);

        let mut first_id = None;
        for i in 0..5 {
            let message = Message::new("alice", "alice", "Lunch later?", t0() + Duration::minutes(i));
            let mut context = assembler.process_message(&message);
            assembler.score_response(&mut context, "Sure, noon works");
            assembler.record_feedback(&message.id, "Sure", "Sure, noon works", t0());
            first_id.get_or_insert(message.id);
        }

        assert_eq!(assembler.logged_confidence_len(), 3);
        assert_eq!(assembler.feedback().len(), 3);
        let first_id = first_id.unwrap();
        assert!(assembler.logged_confidence(&first_id).is_none());
        assert!(assembler.feedback().get(&first_id).is_none());
    }

    #[test]
    fn test_feedback_feeds_user_style() {
        let assembler = ContextAssembler::default();
        let diff = assembler.record_feedback(
            "m1",
            "hey, sure",
            "Hello, certainly. Best wishes",
            t0(),
        );
        assert!(diff.formality_delta > 0.0);
        assert!(assembler.feedback().get("m1").is_some());
        assert!(assembler.styles().profile(USER_STYLE_KEY).unwrap().has_patterns());
    }
}
