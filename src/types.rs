//! Core data types for the Rapport engine
//!
//! This module defines the values that flow through the pipeline: inbound
//! messages, the per-message classification, and the small vocabulary of
//! enums (category, polarity, trend) shared by every component.

use crate::classifier::intent::{Intent, IntentClassification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A chat message as delivered by the messaging transport
///
/// Messages are immutable once received; the pipeline only ever borrows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Transport-assigned message identifier
    pub id: String,

    /// Conversation the message belongs to
    pub chat_id: String,

    /// Author of the message (the contact, or the local user when `from_self`)
    pub sender_id: String,

    /// Text content; may be empty for media-only messages
    #[serde(default)]
    pub body: String,

    /// When the message was sent
    pub timestamp: DateTime<Utc>,

    /// Whether the local user wrote this message
    #[serde(default)]
    pub from_self: bool,

    /// Whether the message carries an attachment
    #[serde(default)]
    pub has_media: bool,

    /// Attachment kind (image, audio, video, ...)
    #[serde(default)]
    pub media_type: Option<String>,
}

impl Message {
    /// Create a text message from a contact with a fresh random id
    pub fn new(
        chat_id: impl Into<String>,
        sender_id: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
            body: body.into(),
            timestamp,
            from_self: false,
            has_media: false,
            media_type: None,
        }
    }

    /// Mark the message as written by the local user
    pub fn from_self(mut self) -> Self {
        self.from_self = true;
        self
    }

    /// Attach media of the given kind
    pub fn with_media(mut self, media_type: impl Into<String>) -> Self {
        self.has_media = true;
        self.media_type = Some(media_type.into());
        self
    }

    /// Communication medium used for style tallies
    pub fn medium(&self) -> &str {
        if self.has_media {
            self.media_type.as_deref().unwrap_or("media")
        } else {
            "text"
        }
    }

    /// The contact this message is about
    ///
    /// For outgoing messages the sender is the local user, so the chat id
    /// identifies the contact instead.
    pub fn contact_id(&self) -> &str {
        if self.from_self || self.sender_id.is_empty() {
            &self.chat_id
        } else {
            &self.sender_id
        }
    }
}

/// Message category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Urgent,
    Work,
    Personal,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Urgent,
        Category::Work,
        Category::Personal,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Urgent => "urgent",
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "urgent" => Ok(Category::Urgent),
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Sentiment polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Polarity {
    /// Polarity of a signed score; exactly zero is neutral
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Polarity::Positive
        } else if score < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }

    /// Map to {+1, 0, -1} for balance and trend calculations
    pub fn as_signed(&self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
            Polarity::Neutral => 0.0,
        }
    }
}

/// Lexicon sentiment of one message
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sentiment {
    /// Average lexicon weight per token
    pub score: f64,
    pub polarity: Polarity,
    /// Absolute value of the score
    pub intensity: f64,
}

impl Sentiment {
    pub fn from_score(score: f64) -> Self {
        let score = if score.is_finite() { score } else { 0.0 };
        Self {
            score,
            polarity: Polarity::from_score(score),
            intensity: score.abs(),
        }
    }

    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Coarse priority bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub fn from_priority(priority: u8) -> Self {
        if priority >= 8 {
            PriorityLevel::High
        } else if priority >= 5 {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }
}

/// Result of classifying one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,

    /// Priority in 1..=10
    pub priority: u8,

    pub sentiment: Sentiment,

    /// Weighted sum of urgency indicator tiers
    pub urgency_score: u32,

    /// Whether the urgency score reached the urgent threshold
    pub is_urgent: bool,

    /// Keyword triggers found in the message (urgent, work, action_required, ...)
    pub triggers: BTreeSet<String>,

    /// Conversational intent; absent for messages without text
    #[serde(default)]
    pub intent: Option<IntentClassification>,
}

impl ClassificationResult {
    /// Safe result for messages that carry no usable text
    pub fn neutral() -> Self {
        Self {
            category: Category::Other,
            priority: 1,
            sentiment: Sentiment::neutral(),
            urgency_score: 0,
            is_urgent: false,
            triggers: BTreeSet::new(),
            intent: None,
        }
    }

    pub fn priority_level(&self) -> PriorityLevel {
        PriorityLevel::from_priority(self.priority)
    }

    /// Whether the message asks something of the reader
    pub fn requires_response(&self) -> bool {
        self.is_urgent
            || self.triggers.contains("question")
            || self.triggers.contains("action_required")
            || self
                .intent
                .as_ref()
                .is_some_and(|intent| intent.features.requires_response())
    }

    /// Primary intent, if the message had text
    pub fn primary_intent(&self) -> Option<Intent> {
        self.intent.as_ref().map(|intent| intent.primary)
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Direction of a metric over recent samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Declining => write!(f, "declining"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}
