//! Engine configuration
//!
//! Every tunable constant of the pipeline lives here with a default equal to
//! the behavior the engine ships with. Configuration is loaded from TOML;
//! any section or field left out falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level configuration for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RapportConfig {
    /// Message classification settings
    pub classifier: ClassifierConfig,

    /// Style analysis and decay settings
    pub style: StyleConfig,

    /// Relationship tracking settings
    pub relationship: RelationshipConfig,

    /// Response confidence settings
    pub confidence: ConfidenceConfig,

    /// Per-contact message log settings
    pub message_log: MessageLogConfig,
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// First hour (inclusive) counted as business hours
    pub business_hours_start: u32,

    /// Last hour (inclusive) counted as business hours
    pub business_hours_end: u32,

    /// Offset applied to message timestamps before reading the hour
    pub utc_offset_minutes: i32,

    /// Maximum points the urgency score contributes to priority
    pub urgency_contribution_cap: f64,

    /// Sender priority used when no custom policy is installed
    pub default_sender_priority: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            business_hours_start: 9,
            business_hours_end: 17,
            utc_offset_minutes: 0,
            urgency_contribution_cap: 6.0,
            default_sender_priority: 2.0,
        }
    }
}

/// Style analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Multiplicative decay applied once per update interval
    pub decay_factor: f64,

    /// Interval the decay factor is expressed against (seconds)
    #[serde(with = "serde_duration")]
    pub update_interval: Duration,

    /// Weight of a fresh observation when blending into stored patterns
    pub learning_rate: f64,

    /// Response time samples retained per profile
    pub max_response_samples: usize,

    /// Messages retained per contact by the topic tracker
    pub topic_window: usize,

    /// Topics reported per contact
    pub max_topics: usize,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            decay_factor: 0.95,
            update_interval: Duration::from_secs(86400), // 24 hours
            learning_rate: 0.2,
            max_response_samples: 100,
            topic_window: 10,
            max_topics: 5,
        }
    }
}

/// Weights of the four relationship score components
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub response_time: f64,
    pub frequency: f64,
    pub sentiment: f64,
    pub engagement: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.response_time + self.frequency + self.sentiment + self.engagement
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            response_time: 0.2,
            frequency: 0.2,
            sentiment: 0.3,
            engagement: 0.3,
        }
    }
}

/// Relationship tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Interactions retained per contact (FIFO)
    pub max_interactions: usize,

    /// Weight of the response time moving average
    pub response_time_ema_weight: f64,

    /// Gap under which consecutive interactions form one conversation (seconds)
    #[serde(with = "serde_duration")]
    pub conversation_window: Duration,

    /// Average response time above which `slow_responses` is raised (seconds)
    #[serde(with = "serde_duration")]
    pub slow_response_threshold: Duration,

    /// Sentiment entries kept in the metric history
    pub sentiment_history: usize,

    /// Interactions averaged into the engagement score
    pub engagement_window: usize,

    /// Samples kept for each trend series
    pub trend_samples: usize,

    /// Relationship score weights
    pub weights: ScoreWeights,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            max_interactions: 100,
            response_time_ema_weight: 10.0,
            conversation_window: Duration::from_secs(3600), // 1 hour
            slow_response_threshold: Duration::from_secs(86400), // 24 hours
            sentiment_history: 10,
            engagement_window: 5,
            trend_samples: 10,
            weights: ScoreWeights::default(),
        }
    }
}

/// Confidence scorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Value returned by the default historical accuracy source
    pub historical_accuracy: f64,

    /// Factor value used when there is nothing to compare against
    pub neutral_factor: f64,

    /// Scored responses and recorded edits kept by message id
    pub max_logged_responses: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            historical_accuracy: 0.7,
            neutral_factor: 0.5,
            max_logged_responses: 1000,
        }
    }
}

/// Message log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageLogConfig {
    /// Messages retained per contact
    pub max_messages_per_contact: usize,

    /// Priority at which a message counts as high priority in summaries
    pub high_priority_threshold: u8,

    /// Priority at which a message is listed as urgent in summaries
    pub urgent_priority_threshold: u8,

    /// Sample messages listed per category
    pub top_messages: usize,
}

impl Default for MessageLogConfig {
    fn default() -> Self {
        Self {
            max_messages_per_contact: 500,
            high_priority_threshold: 7,
            urgent_priority_threshold: 8,
            top_messages: 3,
        }
    }
}

// Custom serde module for Duration (serialize/deserialize as seconds)
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl RapportConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: RapportConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let classifier = &self.classifier;
        if classifier.business_hours_start > 23 || classifier.business_hours_end > 23 {
            return Err(ConfigError::ValidationError(
                "classifier: business hours must be within 0..=23".to_string(),
            ));
        }
        if classifier.business_hours_start > classifier.business_hours_end {
            return Err(ConfigError::ValidationError(
                "classifier: business_hours_start must not exceed business_hours_end".to_string(),
            ));
        }
        if classifier.urgency_contribution_cap < 0.0 {
            return Err(ConfigError::ValidationError(
                "classifier: urgency_contribution_cap must be non-negative".to_string(),
            ));
        }

        let style = &self.style;
        if !(style.decay_factor > 0.0 && style.decay_factor <= 1.0) {
            return Err(ConfigError::ValidationError(
                "style: decay_factor must be in (0, 1]".to_string(),
            ));
        }
        if style.update_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "style: update_interval must be positive".to_string(),
            ));
        }
        if !(style.learning_rate > 0.0 && style.learning_rate <= 1.0) {
            return Err(ConfigError::ValidationError(
                "style: learning_rate must be in (0, 1]".to_string(),
            ));
        }
        self.validate_capacity("style.max_response_samples", style.max_response_samples)?;
        self.validate_capacity("style.topic_window", style.topic_window)?;
        self.validate_capacity("style.max_topics", style.max_topics)?;

        let relationship = &self.relationship;
        self.validate_capacity("relationship.max_interactions", relationship.max_interactions)?;
        self.validate_capacity(
            "relationship.sentiment_history",
            relationship.sentiment_history,
        )?;
        self.validate_capacity(
            "relationship.engagement_window",
            relationship.engagement_window,
        )?;
        self.validate_capacity("relationship.trend_samples", relationship.trend_samples)?;
        if relationship.response_time_ema_weight < 1.0 {
            return Err(ConfigError::ValidationError(
                "relationship: response_time_ema_weight must be at least 1".to_string(),
            ));
        }
        let weight_sum = relationship.weights.sum();
        if (weight_sum - 1.0).abs() > 0.01 {
            return Err(ConfigError::ValidationError(format!(
                "relationship: score weights must sum to 1.0 (got {:.3})",
                weight_sum
            )));
        }

        let confidence = &self.confidence;
        for (name, value) in [
            ("historical_accuracy", confidence.historical_accuracy),
            ("neutral_factor", confidence.neutral_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "confidence: {} must be in [0, 1]",
                    name
                )));
            }
        }

        self.validate_capacity(
            "confidence.max_logged_responses",
            confidence.max_logged_responses,
        )?;
        self.validate_capacity(
            "message_log.max_messages_per_contact",
            self.message_log.max_messages_per_contact,
        )?;

        Ok(())
    }

    fn validate_capacity(&self, name: &str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be greater than zero",
                name
            )));
        }
        Ok(())
    }
}
