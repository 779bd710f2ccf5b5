//! Relationship state for one contact

use super::trend;
use crate::classifier::intent::Intent;
use crate::config::ScoreWeights;
use crate::types::{Category, Polarity, Trend};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

/// Classification of the current score and trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    New,
    Strong,
    Growing,
    Stable,
    Moderate,
    NeedsAttention,
    Weak,
}

impl RelationshipStatus {
    /// Status from score thresholds 8 / 6 / 4, refined by the overall trend
    pub fn derive(score: f64, trend: Trend) -> Self {
        if score >= 8.0 {
            RelationshipStatus::Strong
        } else if score >= 6.0 {
            if trend == Trend::Improving {
                RelationshipStatus::Growing
            } else {
                RelationshipStatus::Stable
            }
        } else if score >= 4.0 {
            if trend == Trend::Declining {
                RelationshipStatus::NeedsAttention
            } else {
                RelationshipStatus::Moderate
            }
        } else {
            RelationshipStatus::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::New => "new",
            RelationshipStatus::Strong => "strong",
            RelationshipStatus::Growing => "growing",
            RelationshipStatus::Stable => "stable",
            RelationshipStatus::Moderate => "moderate",
            RelationshipStatus::NeedsAttention => "needs_attention",
            RelationshipStatus::Weak => "weak",
        }
    }
}

impl std::fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(RelationshipStatus::New),
            "strong" => Ok(RelationshipStatus::Strong),
            "growing" => Ok(RelationshipStatus::Growing),
            "stable" => Ok(RelationshipStatus::Stable),
            "moderate" => Ok(RelationshipStatus::Moderate),
            "needs_attention" => Ok(RelationshipStatus::NeedsAttention),
            "weak" => Ok(RelationshipStatus::Weak),
            other => Err(format!("unknown relationship status: {}", other)),
        }
    }
}

/// Derived warning about a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipFlag {
    SlowResponses,
    DecliningEngagement,
    NegativeSentimentTrend,
    LowInteraction,
}

impl RelationshipFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipFlag::SlowResponses => "slow_responses",
            RelationshipFlag::DecliningEngagement => "declining_engagement",
            RelationshipFlag::NegativeSentimentTrend => "negative_sentiment_trend",
            RelationshipFlag::LowInteraction => "low_interaction",
        }
    }
}

impl std::fmt::Display for RelationshipFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow_responses" => Ok(RelationshipFlag::SlowResponses),
            "declining_engagement" => Ok(RelationshipFlag::DecliningEngagement),
            "negative_sentiment_trend" => Ok(RelationshipFlag::NegativeSentimentTrend),
            "low_interaction" => Ok(RelationshipFlag::LowInteraction),
            other => Err(format!("unknown relationship flag: {}", other)),
        }
    }
}

/// One retained interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub sentiment: Polarity,
    pub sentiment_score: f64,
    pub category: Category,
    /// Sent by the local user
    pub is_response: bool,
    pub engagement_score: f64,
    /// Primary intent of this message
    #[serde(default)]
    pub intent: Option<Intent>,
    /// Most frequent intent over the last five messages, this one included
    #[serde(default)]
    pub top_intent: Option<Intent>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTimeMetric {
    /// Moving average in seconds
    pub average_secs: f64,
    pub samples: Vec<f64>,
    pub trend: Trend,
}

impl ResponseTimeMetric {
    pub fn average_hours(&self) -> f64 {
        self.average_secs / 3600.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyMetric {
    pub daily: u32,
    pub weekly: u32,
    /// Daily counts observed at each update
    pub samples: Vec<f64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentMetric {
    pub current: Polarity,
    pub history: Vec<Polarity>,
    pub trend: Trend,
}

impl SentimentMetric {
    /// Sum of +1/0/-1 over the history
    pub fn balance(&self) -> f64 {
        self.history.iter().map(Polarity::as_signed).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementMetric {
    pub score: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub response_time: ResponseTimeMetric,
    pub interaction_frequency: FrequencyMetric,
    pub sentiment: SentimentMetric,
    pub engagement: EngagementMetric,
}

impl Metrics {
    /// Vote across the four component trends
    pub fn overall_trend(&self) -> Trend {
        trend::overall(&[
            self.response_time.trend,
            self.interaction_frequency.trend,
            self.sentiment.trend,
            self.engagement.trend,
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastInteraction {
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub from_self: bool,
    #[serde(default)]
    pub top_intent: Option<Intent>,
}

/// Long-lived relationship state for one contact
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationshipProfile {
    pub interactions: VecDeque<Interaction>,
    pub metrics: Metrics,
    pub relationship_score: f64,
    pub status: RelationshipStatus,
    pub flags: BTreeSet<RelationshipFlag>,
    pub last_interaction: Option<LastInteraction>,
}

impl RelationshipProfile {
    pub fn overall_trend(&self) -> Trend {
        self.metrics.overall_trend()
    }

    /// Weighted score over the four metric components, clamped to [0, 10]
    pub fn compute_score(&self, weights: &ScoreWeights) -> f64 {
        let metrics = &self.metrics;

        let response_time = (10.0 - metrics.response_time.average_hours()).max(0.0);
        let frequency = (metrics.interaction_frequency.weekly as f64 / 7.0 * 10.0).min(10.0);

        let history_len = metrics.sentiment.history.len().max(1) as f64;
        let sentiment = (metrics.sentiment.balance() + metrics.sentiment.history.len() as f64)
            / (history_len * 2.0)
            * 10.0;

        let engagement = metrics.engagement.score;

        let score = response_time * weights.response_time
            + frequency * weights.frequency
            + sentiment * weights.sentiment
            + engagement * weights.engagement;

        if score.is_finite() {
            score.clamp(0.0, 10.0)
        } else {
            0.0
        }
    }

    /// Flags derived from the current metrics
    pub fn compute_flags(&self, slow_response_threshold: Duration) -> BTreeSet<RelationshipFlag> {
        let metrics = &self.metrics;
        let mut flags = BTreeSet::new();

        if metrics.response_time.average_secs > slow_response_threshold.as_secs_f64() {
            flags.insert(RelationshipFlag::SlowResponses);
        }
        if metrics.engagement.trend == Trend::Declining {
            flags.insert(RelationshipFlag::DecliningEngagement);
        }
        if metrics.sentiment.trend == Trend::Declining {
            flags.insert(RelationshipFlag::NegativeSentimentTrend);
        }
        if metrics.interaction_frequency.daily == 0 && metrics.interaction_frequency.weekly < 3 {
            flags.insert(RelationshipFlag::LowInteraction);
        }

        flags
    }

    /// Recompute score, status and flags from the current metrics
    pub fn rescore(&mut self, weights: &ScoreWeights, slow_response_threshold: Duration) {
        self.relationship_score = self.compute_score(weights);
        self.status = RelationshipStatus::derive(self.relationship_score, self.overall_trend());
        self.flags = self.compute_flags(slow_response_threshold);
    }

    pub fn summary(&self) -> RelationshipSummary {
        RelationshipSummary {
            status: self.status,
            score: self.relationship_score,
            metrics: self.metrics.clone(),
            flags: self.flags.clone(),
            last_interaction: self.last_interaction.clone(),
            trend: self.overall_trend(),
        }
    }
}

/// Read-only view of a relationship
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationshipSummary {
    pub status: RelationshipStatus,
    pub score: f64,
    pub metrics: Metrics,
    pub flags: BTreeSet<RelationshipFlag>,
    pub last_interaction: Option<LastInteraction>,
    pub trend: Trend,
}
