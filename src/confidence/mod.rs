//! Confidence scoring for candidate responses
//!
//! A proposed response is compared against what the engine knows about the
//! conversation:
//!
//! - **style match**: the response's language features against the stored
//!   style (the user's when known, otherwise the contact's)
//! - **topic relevance**: overlap with the contact's current topics
//! - **pattern adherence**: question, exclamation and emoji rates
//! - **historical accuracy**: supplied by a pluggable [`HistoricalAccuracy`]
//!
//! The overall score is the unweighted mean of the four factors. Any factor
//! without data to compare against falls back to a neutral value.

pub mod feedback;
pub mod journal;

pub use feedback::{analyze_differences, FeedbackEntry, FeedbackLog, ResponseDiff, StructuralChanges};
pub use journal::BoundedLog;

use crate::config::ConfidenceConfig;
use crate::context::ResponseContext;
use crate::style::{extract_terms, features, FeatureSet, StyleFeature, StyleProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Source of the historical-accuracy factor
pub trait HistoricalAccuracy: Send + Sync {
    /// Accuracy in [0, 1] of past responses for this context
    fn accuracy(&self, context: &ResponseContext) -> f64;
}

/// Same accuracy for every context
#[derive(Debug, Clone, Copy)]
pub struct ConstantAccuracy(pub f64);

impl Default for ConstantAccuracy {
    fn default() -> Self {
        Self(0.7)
    }
}

impl HistoricalAccuracy for ConstantAccuracy {
    fn accuracy(&self, _context: &ResponseContext) -> f64 {
        self.0
    }
}

impl<F> HistoricalAccuracy for F
where
    F: Fn(&ResponseContext) -> f64 + Send + Sync,
{
    fn accuracy(&self, context: &ResponseContext) -> f64 {
        self(context)
    }
}

/// Per-factor breakdown, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub style_match: f64,
    pub topic_relevance: f64,
    pub pattern_adherence: f64,
    pub historical_accuracy: f64,
}

impl ConfidenceFactors {
    pub fn mean(&self) -> f64 {
        (self.style_match + self.topic_relevance + self.pattern_adherence + self.historical_accuracy)
            / 4.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub overall: f64,
    pub factors: ConfidenceFactors,
}

/// Scores candidate responses against a [`ResponseContext`]
pub struct ConfidenceScorer {
    config: ConfidenceConfig,
    accuracy: Box<dyn HistoricalAccuracy>,
}

impl ConfidenceScorer {
    pub fn new(config: ConfidenceConfig) -> Self {
        let accuracy = Box::new(ConstantAccuracy(config.historical_accuracy));
        Self { config, accuracy }
    }

    /// Replace the historical accuracy source
    pub fn with_accuracy(mut self, accuracy: impl HistoricalAccuracy + 'static) -> Self {
        self.accuracy = Box::new(accuracy);
        self
    }

    /// Score a candidate response
    pub fn score(&self, text: &str, context: &ResponseContext) -> ConfidenceScore {
        let fresh = features::extract(text);
        let reference = reference_style(context);

        let factors = ConfidenceFactors {
            style_match: self.bounded(self.style_match(&fresh, reference)),
            topic_relevance: self.bounded(self.topic_relevance(text, &context.topics)),
            pattern_adherence: self.bounded(self.pattern_adherence(&fresh, reference)),
            historical_accuracy: self.bounded(self.accuracy.accuracy(context)),
        };
        let overall = factors.mean().clamp(0.0, 1.0);

        debug!(
            "Confidence for {}: overall={:.3} style={:.3} topics={:.3} patterns={:.3}",
            context.message_id,
            overall,
            factors.style_match,
            factors.topic_relevance,
            factors.pattern_adherence
        );

        ConfidenceScore { overall, factors }
    }

    /// Mean similarity over features present in both the response and the reference
    pub fn style_match(&self, fresh: &FeatureSet, reference: Option<&StyleProfile>) -> f64 {
        let Some(reference) = reference else {
            return self.config.neutral_factor;
        };

        let similarities: Vec<f64> = fresh
            .iter()
            .filter_map(|(feature, value)| {
                reference
                    .feature(*feature)
                    .map(|stored| similarity(*feature, *value, stored))
            })
            .collect();

        if similarities.is_empty() {
            return self.config.neutral_factor;
        }
        similarities.iter().sum::<f64>() / similarities.len() as f64
    }

    /// `min(1, |response terms ∩ topics| / sqrt(|topics|))`
    pub fn topic_relevance(&self, text: &str, topics: &[String]) -> f64 {
        if topics.is_empty() {
            return self.config.neutral_factor;
        }

        let terms: HashSet<String> = extract_terms(text, usize::MAX).into_iter().collect();
        let topics: HashSet<&str> = topics.iter().map(String::as_str).collect();
        let shared = topics.iter().filter(|t| terms.contains(**t)).count();

        (shared as f64 / (topics.len() as f64).sqrt()).min(1.0)
    }

    /// Agreement of per-character rates with the stored rates
    pub fn pattern_adherence(&self, fresh: &FeatureSet, reference: Option<&StyleProfile>) -> f64 {
        let Some(reference) = reference else {
            return self.config.neutral_factor;
        };
        if fresh.is_empty() {
            return self.config.neutral_factor;
        }

        let agreements: Vec<f64> = StyleFeature::ALL
            .iter()
            .filter(|feature| feature.is_rate())
            .filter_map(|feature| {
                let stored = reference.feature(*feature)?;
                let observed = fresh.get(feature).copied().unwrap_or(0.0);
                Some(1.0 - (observed - stored).abs())
            })
            .collect();

        if agreements.is_empty() {
            return self.config.neutral_factor;
        }
        agreements.iter().sum::<f64>() / agreements.len() as f64
    }

    fn bounded(&self, value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            self.config.neutral_factor
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ConfidenceConfig::default())
    }
}

/// The user's style when it has patterns, otherwise the contact's
pub fn reference_style(context: &ResponseContext) -> Option<&StyleProfile> {
    context
        .user_style
        .as_ref()
        .filter(|style| style.has_patterns())
        .or_else(|| Some(&context.contact_style).filter(|style| style.has_patterns()))
}

/// Similarity of two values of one feature, in [0, 1]
pub fn similarity(feature: StyleFeature, a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    let scaled = if feature.is_unit_interval() {
        diff
    } else {
        diff / a.abs().max(b.abs()).max(1.0)
    };
    (1.0 - scaled).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationshipSummary;
    use crate::types::ClassificationResult;

    fn context() -> ResponseContext {
        ResponseContext {
            message_id: "m1".to_string(),
            contact_id: "alice".to_string(),
            classification: ClassificationResult::neutral(),
            relationship: RelationshipSummary::default(),
            contact_style: StyleProfile::default(),
            user_style: None,
            topics: Vec::new(),
            confidence: None,
        }
    }

    fn styled(text: &str) -> StyleProfile {
        StyleProfile {
            language_patterns: features::extract(text),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_context_is_neutral() {
        let scorer = ConfidenceScorer::default();
        let score = scorer.score("Sounds good, see you then", &context());
        assert_eq!(score.factors.style_match, 0.5);
        assert_eq!(score.factors.topic_relevance, 0.5);
        assert_eq!(score.factors.pattern_adherence, 0.5);
        assert_eq!(score.factors.historical_accuracy, 0.7);
        assert!((score.overall - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_identical_style_matches_fully() {
        let scorer = ConfidenceScorer::default();
        let text = "Hello, could you send the report? Thanks!";
        let mut ctx = context();
        ctx.user_style = Some(styled(text));

        let score = scorer.score(text, &ctx);
        assert!((score.factors.style_match - 1.0).abs() < 1e-9);
        assert!((score.factors.pattern_adherence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_prefers_user_style() {
        let mut ctx = context();
        ctx.contact_style = styled("hey lol");
        assert_eq!(reference_style(&ctx), Some(&ctx.contact_style));

        ctx.user_style = Some(StyleProfile::default());
        assert_eq!(reference_style(&ctx), Some(&ctx.contact_style));

        ctx.user_style = Some(styled("Good morning. Regards"));
        assert_eq!(reference_style(&ctx), ctx.user_style.as_ref());
    }

    #[test]
    fn test_topic_relevance() {
        let scorer = ConfidenceScorer::default();
        let topics: Vec<String> = ["budget", "launch", "hiring", "offsite"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(scorer.topic_relevance("the budget looks fine", &topics), 0.5);
        assert_eq!(scorer.topic_relevance("budget and launch are on track", &topics), 1.0);
        assert_eq!(scorer.topic_relevance("nothing relevant", &topics), 0.0);
    }

    #[test]
    fn test_similarity_scaling() {
        assert!((similarity(StyleFeature::Formality, 0.8, 0.5) - 0.7).abs() < 1e-9);
        assert!((similarity(StyleFeature::SentenceLength, 12.0, 6.0) - 0.5).abs() < 1e-9);
        assert_eq!(similarity(StyleFeature::EmojiUsage, 0.0, 0.0), 1.0);
    }

    #[test]
    fn test_custom_accuracy_is_clamped() {
        let scorer = ConfidenceScorer::default().with_accuracy(|_: &ResponseContext| 3.0);
        let score = scorer.score("ok", &context());
        assert_eq!(score.factors.historical_accuracy, 1.0);
        assert!(score.overall <= 1.0);
    }
}
