//! Plain persisted forms of the long-lived profiles
//!
//! Records hold only JSON-friendly shapes: timestamps as RFC 3339 strings,
//! sets and deques as arrays. Every field defaults when missing, so an old
//! or partial record still loads as a profile with empty state.

use crate::classifier::intent::Intent;
use crate::error::{RapportError, Result};
use crate::relationship::{
    Interaction, LastInteraction, Metrics, RelationshipFlag, RelationshipProfile,
    RelationshipStatus,
};
use crate::style::{FeatureSet, ResponseTimeSample, StyleProfile};
use crate::types::{Category, Polarity};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RapportError::State(format!("invalid timestamp {:?}: {}", value, e)))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionRecord {
    pub timestamp: String,
    pub sentiment: Polarity,
    pub sentiment_score: f64,
    pub category: Option<Category>,
    pub is_response: bool,
    pub engagement_score: f64,
    pub intent: Option<Intent>,
    pub top_intent: Option<Intent>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LastInteractionRecord {
    pub timestamp: String,
    pub category: Option<Category>,
    pub from_self: bool,
    pub top_intent: Option<Intent>,
}

/// Persisted relationship profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipRecord {
    pub interactions: Vec<InteractionRecord>,
    pub metrics: Metrics,
    pub relationship_score: f64,
    pub status: RelationshipStatus,
    pub flags: Vec<RelationshipFlag>,
    pub last_interaction: Option<LastInteractionRecord>,
}

impl From<&RelationshipProfile> for RelationshipRecord {
    fn from(profile: &RelationshipProfile) -> Self {
        Self {
            interactions: profile
                .interactions
                .iter()
                .map(|i| InteractionRecord {
                    timestamp: format_timestamp(&i.timestamp),
                    sentiment: i.sentiment,
                    sentiment_score: i.sentiment_score,
                    category: Some(i.category),
                    is_response: i.is_response,
                    engagement_score: i.engagement_score,
                    intent: i.intent,
                    top_intent: i.top_intent,
                })
                .collect(),
            metrics: profile.metrics.clone(),
            relationship_score: profile.relationship_score,
            status: profile.status,
            flags: profile.flags.iter().copied().collect(),
            last_interaction: profile.last_interaction.as_ref().map(|last| LastInteractionRecord {
                timestamp: format_timestamp(&last.timestamp),
                category: Some(last.category),
                from_self: last.from_self,
                top_intent: last.top_intent,
            }),
        }
    }
}

impl TryFrom<RelationshipRecord> for RelationshipProfile {
    type Error = RapportError;

    fn try_from(record: RelationshipRecord) -> Result<Self> {
        if !(0.0..=10.0).contains(&record.relationship_score) {
            return Err(RapportError::State(format!(
                "relationship score {} outside 0..=10",
                record.relationship_score
            )));
        }

        let interactions = record
            .interactions
            .into_iter()
            .map(|i| -> Result<Interaction> {
                Ok(Interaction {
                    timestamp: parse_timestamp(&i.timestamp)?,
                    sentiment: i.sentiment,
                    sentiment_score: i.sentiment_score,
                    category: i.category.unwrap_or(Category::Other),
                    is_response: i.is_response,
                    engagement_score: i.engagement_score,
                    intent: i.intent,
                    top_intent: i.top_intent,
                })
            })
            .collect::<Result<VecDeque<_>>>()?;

        let last_interaction = record
            .last_interaction
            .map(|last| -> Result<LastInteraction> {
                Ok(LastInteraction {
                    timestamp: parse_timestamp(&last.timestamp)?,
                    category: last.category.unwrap_or(Category::Other),
                    from_self: last.from_self,
                    top_intent: last.top_intent,
                })
            })
            .transpose()?;

        Ok(RelationshipProfile {
            interactions,
            metrics: record.metrics,
            relationship_score: record.relationship_score,
            status: record.status,
            flags: record.flags.into_iter().collect::<BTreeSet<_>>(),
            last_interaction,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTimeRecord {
    pub value_ms: i64,
    pub timestamp: String,
}

/// Persisted style profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleRecord {
    pub response_times: Vec<ResponseTimeRecord>,
    pub medium_counts: BTreeMap<String, u32>,
    pub language_patterns: FeatureSet,
    pub last_update: Option<String>,
}

impl From<&StyleProfile> for StyleRecord {
    fn from(profile: &StyleProfile) -> Self {
        Self {
            response_times: profile
                .response_times
                .iter()
                .map(|s| ResponseTimeRecord {
                    value_ms: s.value_ms,
                    timestamp: format_timestamp(&s.timestamp),
                })
                .collect(),
            medium_counts: profile.medium_counts.clone(),
            language_patterns: profile.language_patterns.clone(),
            last_update: profile.last_update.as_ref().map(format_timestamp),
        }
    }
}

impl TryFrom<StyleRecord> for StyleProfile {
    type Error = RapportError;

    fn try_from(record: StyleRecord) -> Result<Self> {
        if let Some((feature, value)) = record
            .language_patterns
            .iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(RapportError::State(format!(
                "non-finite value {} for {:?}",
                value, feature
            )));
        }

        let response_times = record
            .response_times
            .into_iter()
            .map(|s| -> Result<ResponseTimeSample> {
                Ok(ResponseTimeSample {
                    value_ms: s.value_ms,
                    timestamp: parse_timestamp(&s.timestamp)?,
                })
            })
            .collect::<Result<VecDeque<_>>>()?;

        let last_update = record
            .last_update
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(StyleProfile {
            response_times,
            medium_counts: record.medium_counts,
            language_patterns: record.language_patterns,
            last_update,
        })
    }
}
