//! Per-message classification
//!
//! Turns one message into a category, a 1-10 priority, lexicon sentiment,
//! an urgency score, a set of keyword triggers and a conversational
//! [`Intent`]. Classification never fails: a message without usable text
//! gets [`ClassificationResult::neutral`].
//!
//! # Category resolution
//!
//! First match wins:
//! 1. Urgent indicators
//! 2. Personal indicators
//! 3. Work indicators
//! 4. Naive Bayes fallback trained on a fixed seed corpus
//!
//! # Priority
//!
//! Additive build-up clamped to 1..=10: urgency (capped), urgent keywords,
//! time sensitivity, business hours, and a pluggable sender priority.

pub mod bayes;
pub mod intent;
pub mod lexicon;
pub mod log;
pub mod patterns;

pub use bayes::NaiveBayes;
pub use intent::{Intent, IntentClassification, IntentClassifier, IntentFeatures};
pub use lexicon::SentimentLexicon;
pub use log::{CategorySummary, MessageLog, MessageSummary, Timeframe, TrackedMessage};
pub use patterns::{tokenize, Indicators};

use crate::config::ClassifierConfig;
use crate::types::{Category, ClassificationResult, Message, Sentiment};
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use std::collections::BTreeSet;
use tracing::debug;

/// Source of the sender term in the priority build-up
pub trait SenderPriority: Send + Sync {
    /// Priority points for messages from this sender
    fn priority(&self, sender_id: &str) -> f64;
}

/// Same priority for every sender
#[derive(Debug, Clone, Copy)]
pub struct FixedSenderPriority(pub f64);

impl SenderPriority for FixedSenderPriority {
    fn priority(&self, _sender_id: &str) -> f64 {
        self.0
    }
}

impl<F> SenderPriority for F
where
    F: Fn(&str) -> f64 + Send + Sync,
{
    fn priority(&self, sender_id: &str) -> f64 {
        self(sender_id)
    }
}

/// Urgency assessment of a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Urgency {
    pub score: u32,
    pub is_urgent: bool,
}

/// Score at which a message counts as urgent
const URGENT_THRESHOLD: u32 = 3;

/// Message classifier
pub struct MessageClassifier {
    config: ClassifierConfig,
    fallback: NaiveBayes,
    intents: IntentClassifier,
    sender_priority: Box<dyn SenderPriority>,
}

impl MessageClassifier {
    /// Create a classifier with the seed-trained fallback model
    pub fn new(config: ClassifierConfig) -> Self {
        let sender_priority = Box::new(FixedSenderPriority(config.default_sender_priority));
        Self {
            config,
            fallback: NaiveBayes::seeded(),
            intents: IntentClassifier::new(),
            sender_priority,
        }
    }

    /// Replace the sender priority policy
    pub fn with_sender_priority(mut self, policy: impl SenderPriority + 'static) -> Self {
        self.sender_priority = Box::new(policy);
        self
    }

    /// Classify a message
    pub fn classify(&self, message: &Message) -> ClassificationResult {
        let text = message.body.trim();
        if text.is_empty() {
            debug!(
                "Message {} has no text, using neutral classification",
                message.id
            );
            return ClassificationResult::neutral();
        }

        let category = self.categorize(text);
        let urgency = self.detect_urgency(text);
        let sentiment = self.analyze_sentiment(text);
        let priority = self.calculate_priority(text, urgency, message.timestamp, &message.sender_id);
        let triggers = self.check_triggers(text);
        let intent = self.intents.classify(text);

        debug!(
            "Classified message {}: category={}, priority={}, urgency={}, intent={:?}",
            message.id,
            category,
            priority,
            urgency.score,
            intent.as_ref().map(|i| i.primary)
        );

        ClassificationResult {
            category,
            priority,
            sentiment,
            urgency_score: urgency.score,
            is_urgent: urgency.is_urgent,
            triggers,
            intent,
        }
    }

    /// Resolve the category of a text
    pub fn categorize(&self, text: &str) -> Category {
        if Indicators::urgent().is_match(text) {
            return Category::Urgent;
        }
        if Indicators::personal().is_match(text) {
            return Category::Personal;
        }
        if Indicators::work().is_match(text) {
            return Category::Work;
        }
        self.fallback.classify(text).unwrap_or(Category::Other)
    }

    /// Weighted urgency over the three indicator tiers
    pub fn detect_urgency(&self, text: &str) -> Urgency {
        let tiers: [(&regex::Regex, u32); 3] = [
            (Indicators::urgency_critical(), 3),
            (Indicators::urgency_important(), 2),
            (Indicators::urgency_soft(), 1),
        ];

        let score = tiers
            .iter()
            .filter(|(pattern, _)| pattern.is_match(text))
            .map(|(_, weight)| weight)
            .sum();

        Urgency {
            score,
            is_urgent: score >= URGENT_THRESHOLD,
        }
    }

    /// Lexicon sentiment of a text
    pub fn analyze_sentiment(&self, text: &str) -> Sentiment {
        let tokens = tokenize(text);
        Sentiment::from_score(SentimentLexicon::score_tokens(&tokens))
    }

    /// Priority in 1..=10
    pub fn calculate_priority(
        &self,
        text: &str,
        urgency: Urgency,
        sent_at: DateTime<Utc>,
        sender_id: &str,
    ) -> u8 {
        let mut score = (urgency.score as f64 * 2.0).min(self.config.urgency_contribution_cap);

        if Indicators::urgent().is_match(text) {
            score += 3.0;
        }

        score += time_sensitivity(text);

        if self.is_business_hours(sent_at) {
            score += 1.0;
        }

        if !sender_id.is_empty() {
            score += self.sender_priority.priority(sender_id).max(0.0);
        }

        score.ceil().clamp(1.0, 10.0) as u8
    }

    /// Keyword triggers present in a text
    pub fn check_triggers(&self, text: &str) -> BTreeSet<String> {
        let mut triggers = BTreeSet::new();

        if Indicators::urgent().is_match(text) {
            triggers.insert("urgent".to_string());
        }
        if Indicators::work().is_match(text) {
            triggers.insert("work".to_string());
        }
        if Indicators::personal().is_match(text) {
            triggers.insert("personal".to_string());
        }

        if Indicators::time_immediate().is_match(text) {
            triggers.insert("immediate".to_string());
        } else if Indicators::time_upcoming().is_match(text) {
            triggers.insert("upcoming".to_string());
        }

        if Indicators::action_request().is_match(text) {
            triggers.insert("action_required".to_string());
        }
        if text.contains('?') {
            triggers.insert("question".to_string());
        }

        triggers
    }

    fn is_business_hours(&self, sent_at: DateTime<Utc>) -> bool {
        let hour = match FixedOffset::east_opt(self.config.utc_offset_minutes * 60) {
            Some(offset) => sent_at.with_timezone(&offset).hour(),
            None => sent_at.hour(),
        };
        hour >= self.config.business_hours_start && hour <= self.config.business_hours_end
    }
}

impl Default for MessageClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// Time sensitivity bonus (0-3 points)
fn time_sensitivity(text: &str) -> f64 {
    if Indicators::time_immediate().is_match(text) {
        3.0
    } else if Indicators::time_upcoming().is_match(text) {
        2.0
    } else if Indicators::time_soon().is_match(text) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Polarity, PriorityLevel};
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, 30, 0).unwrap()
    }

    fn message(body: &str, hour: u32) -> Message {
        Message::new("chat-1", "alice", body, at_hour(hour))
    }

    #[test]
    fn test_urgent_message_category_and_priority() {
        let classifier = MessageClassifier::default();
        let result = classifier.classify(&message("URGENT: respond immediately!!", 22));

        assert_eq!(result.category, Category::Urgent);
        assert!(result.is_urgent);
        assert!(result.priority >= 8);
        assert_eq!(result.priority_level(), PriorityLevel::High);
    }

    #[test]
    fn test_work_message() {
        let classifier = MessageClassifier::default();
        let result = classifier.classify(&message(
            "Meeting scheduled for tomorrow at 2 PM to discuss project updates",
            10,
        ));
        assert_eq!(result.category, Category::Work);
        assert!(result.priority >= 3);
        assert!(result.triggers.contains("upcoming"));
    }

    #[test]
    fn test_personal_message() {
        let classifier = MessageClassifier::default();
        let result = classifier.classify(&message("Hey! How are you doing? Let's catch up soon!", 20));
        assert_eq!(result.category, Category::Personal);
        assert!(result.triggers.contains("question"));
    }

    #[test]
    fn test_fallback_classifier_used_without_indicators() {
        let classifier = MessageClassifier::default();
        assert_eq!(
            classifier.categorize("the client presentation document"),
            Category::Work
        );
        assert_eq!(classifier.categorize("great to hear"), Category::Personal);
        // No known vocabulary: the fallback abstains and the message is Other
        // instead of being forced into one of the trained categories
        assert_eq!(classifier.categorize("qwerty zxcv"), Category::Other);
    }

    #[test]
    fn test_requests_require_response() {
        let classifier = MessageClassifier::default();
        for body in [
            "Please send me the files",
            "I need you to call the bank",
            "can you pick up milk",
            "URGENT call me",
        ] {
            let result = classifier.classify(&message(body, 10));
            assert!(result.requires_response(), "{}", body);
        }

        let result = classifier.classify(&message("Thanks, see you later", 10));
        assert!(!result.requires_response());
    }

    #[test]
    fn test_intent_attached_to_classification() {
        let classifier = MessageClassifier::default();
        let result = classifier.classify(&message("Following up on my last email", 10));
        let intent = result.intent.unwrap();
        assert_eq!(intent.primary, Intent::Followup);
        assert!(intent.features.is_follow_up);
        assert_eq!(classifier.classify(&message("  ", 10)).intent, None);
    }

    #[test]
    fn test_urgency_tiers_sum() {
        let classifier = MessageClassifier::default();
        assert_eq!(classifier.detect_urgency("hello").score, 0);
        assert_eq!(classifier.detect_urgency("please").score, 1);
        assert_eq!(classifier.detect_urgency("report due").score, 2);
        let urgency = classifier.detect_urgency("critical and important, please!!");
        assert_eq!(urgency.score, 6);
        assert!(urgency.is_urgent);
    }

    #[test]
    fn test_business_hours_bonus() {
        let classifier = MessageClassifier::default().with_sender_priority(FixedSenderPriority(0.0));
        let urgency = Urgency {
            score: 0,
            is_urgent: false,
        };
        let during = classifier.calculate_priority("hello there", urgency, at_hour(10), "bob");
        let after = classifier.calculate_priority("hello there", urgency, at_hour(20), "bob");
        assert_eq!(during, 1);
        assert_eq!(after, 1);

        let during = classifier.calculate_priority("see you soon", urgency, at_hour(10), "bob");
        let after = classifier.calculate_priority("see you soon", urgency, at_hour(20), "bob");
        assert_eq!(during, 2);
        assert_eq!(after, 1);
    }

    #[test]
    fn test_business_hours_respect_offset() {
        let config = ClassifierConfig {
            utc_offset_minutes: -300,
            default_sender_priority: 0.0,
            ..Default::default()
        };
        let classifier = MessageClassifier::new(config);
        let urgency = Urgency {
            score: 0,
            is_urgent: false,
        };
        // 20:30 UTC is 15:30 at UTC-5
        let priority = classifier.calculate_priority("talk soon", urgency, at_hour(20), "bob");
        assert_eq!(priority, 2);
    }

    #[test]
    fn test_custom_sender_priority() {
        let classifier = MessageClassifier::default()
            .with_sender_priority(|sender: &str| if sender == "boss" { 5.0 } else { 0.0 });
        let from_boss = Message::new("c", "boss", "hello", at_hour(20));
        let from_friend = Message::new("c", "friend", "hello", at_hour(20));
        assert!(classifier.classify(&from_boss).priority > classifier.classify(&from_friend).priority);
    }

    #[test]
    fn test_priority_is_clamped() {
        let classifier = MessageClassifier::default()
            .with_sender_priority(FixedSenderPriority(100.0));
        let result = classifier.classify(&message("URGENT critical deadline today!! please", 10));
        assert_eq!(result.priority, 10);
    }

    #[test]
    fn test_sentiment_polarity() {
        let classifier = MessageClassifier::default();
        let positive = classifier.analyze_sentiment("Great job on the project! Really impressed!");
        assert!(positive.score > 0.0);
        assert_eq!(positive.polarity, Polarity::Positive);

        let negative =
            classifier.analyze_sentiment("Very disappointed with the delay. This is unacceptable.");
        assert!(negative.score < 0.0);
        assert_eq!(negative.polarity, Polarity::Negative);

        let intense = classifier.analyze_sentiment("ABSOLUTELY AMAZING!!! This is the BEST thing ever!!!");
        assert!(intense.intensity > 0.5);
    }

    #[test]
    fn test_empty_body_is_neutral() {
        let classifier = MessageClassifier::default();
        let result = classifier.classify(&message("   ", 10));
        assert_eq!(result, ClassificationResult::neutral());

        let media = Message::new("c", "alice", "", at_hour(10)).with_media("image");
        assert_eq!(classifier.classify(&media).category, Category::Other);
    }

    #[test]
    fn test_action_triggers() {
        let classifier = MessageClassifier::default();
        let triggers = classifier.check_triggers("Can you review and confirm today?");
        assert!(triggers.contains("action_required"));
        assert!(triggers.contains("immediate"));
        assert!(triggers.contains("question"));
        assert!(triggers.contains("work"));
    }
}
