//! Learning from user edits to proposed responses

use super::journal::BoundedLog;
use crate::classifier::tokenize;
use crate::style::features;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

const VERBOSITY_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuralChanges {
    pub sentences_added: i64,
    pub words_added: i64,
}

/// How an edited response differs from the proposal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseDiff {
    /// Character count change
    pub length_delta: i64,
    pub formality_delta: f64,
    pub complexity_delta: f64,
    pub structural_changes: StructuralChanges,
    /// 1 - Jaccard similarity of the two word sets, in [0, 1]
    pub confidence_impact: f64,
}

fn sentence_count(text: &str) -> i64 {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count() as i64
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Compare a proposed response with the user's edited version
pub fn analyze_differences(original: &str, edited: &str) -> ResponseDiff {
    let original_words = tokenize(original);
    let edited_words = tokenize(edited);

    let original_terms: HashSet<String> = original_words.iter().cloned().collect();
    let edited_terms: HashSet<String> = edited_words.iter().cloned().collect();

    ResponseDiff {
        length_delta: edited.chars().count() as i64 - original.chars().count() as i64,
        formality_delta: features::formality(edited) - features::formality(original),
        complexity_delta: features::vocabulary_complexity(edited)
            - features::vocabulary_complexity(original),
        structural_changes: StructuralChanges {
            sentences_added: sentence_count(edited) - sentence_count(original),
            words_added: edited_words.len() as i64 - original_words.len() as i64,
        },
        confidence_impact: (1.0 - jaccard(&original_terms, &edited_terms)).clamp(0.0, 1.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub message_id: String,
    pub original: String,
    pub edited: String,
    pub diff: ResponseDiff,
    pub recorded_at: DateTime<Utc>,
}

/// Default number of edits kept
const DEFAULT_CAPACITY: usize = 1000;

/// Most recent edits by message id, plus the verbosity preference they imply
///
/// Only the newest `capacity` edits are kept; the verbosity preference
/// still reflects every edit ever recorded.
pub struct FeedbackLog {
    entries: RwLock<BoundedLog<FeedbackEntry>>,
    verbosity: RwLock<f64>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(BoundedLog::new(capacity)),
            verbosity: RwLock::new(0.5),
        }
    }

    /// Analyze an edit and remember it under `message_id`
    pub fn record(
        &self,
        message_id: &str,
        original: &str,
        edited: &str,
        at: DateTime<Utc>,
    ) -> ResponseDiff {
        let diff = analyze_differences(original, edited);

        {
            let mut verbosity = self.verbosity.write().unwrap_or_else(PoisonError::into_inner);
            let step = match diff.structural_changes.sentences_added.signum() {
                1 => VERBOSITY_STEP,
                -1 => -VERBOSITY_STEP,
                _ => 0.0,
            };
            *verbosity = (*verbosity + step).clamp(0.0, 1.0);
        }

        debug!(
            "Feedback for {}: impact={:.3}, sentences {:+}",
            message_id, diff.confidence_impact, diff.structural_changes.sentences_added
        );

        let evicted = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                message_id,
                FeedbackEntry {
                    message_id: message_id.to_string(),
                    original: original.to_string(),
                    edited: edited.to_string(),
                    diff,
                    recorded_at: at,
                },
            );
        if evicted > 0 {
            debug!("Feedback log full, dropped {} oldest edits", evicted);
        }

        diff
    }

    pub fn get(&self, message_id: &str) -> Option<FeedbackEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(message_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Preferred verbosity in [0, 1]; starts at 0.5
    pub fn verbosity(&self) -> f64 {
        *self.verbosity.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FeedbackLog {
    fn default() -> Self {
        Self::new()
    }
}
