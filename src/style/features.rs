//! Language-pattern features of a single text

use crate::classifier::tokenize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A numeric language-pattern feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleFeature {
    /// 0 (casual) to 1 (formal)
    Formality,
    /// Emoji per message
    EmojiUsage,
    /// Words per sentence
    SentenceLength,
    /// Average word length / 10, clamped to [0, 1]
    VocabularyComplexity,
    /// Question marks per character
    QuestionRate,
    /// Exclamation marks per character
    ExclamationRate,
    /// Emoji per character
    EmojiRate,
}

impl StyleFeature {
    pub const ALL: [StyleFeature; 7] = [
        StyleFeature::Formality,
        StyleFeature::EmojiUsage,
        StyleFeature::SentenceLength,
        StyleFeature::VocabularyComplexity,
        StyleFeature::QuestionRate,
        StyleFeature::ExclamationRate,
        StyleFeature::EmojiRate,
    ];

    /// Features whose values always lie in [0, 1]
    pub fn is_unit_interval(&self) -> bool {
        !matches!(self, StyleFeature::EmojiUsage | StyleFeature::SentenceLength)
    }

    /// Per-character punctuation and emoji rates
    pub fn is_rate(&self) -> bool {
        matches!(
            self,
            StyleFeature::QuestionRate | StyleFeature::ExclamationRate | StyleFeature::EmojiRate
        )
    }
}

/// Feature values keyed by feature
pub type FeatureSet = BTreeMap<StyleFeature, f64>;

fn formal_indicators() -> &'static [Regex] {
    static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?i)\b(please|thank you|would you|could you)\b",
            r"(?i)\b(hello|good morning|good afternoon|good evening)\b",
            r"(?i)\b(sincerely|regards|best wishes)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Valid formal indicator regex"))
        .collect()
    });
    &PATTERNS
}

fn informal_indicators() -> &'static [Regex] {
    static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?i)\b(hey|hi|sup|yo)\b",
            r"(?i)\b(gonna|wanna|gotta)\b",
            r"(?i)\b(lol|omg|wtf)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Valid informal indicator regex"))
        .collect()
    });
    &PATTERNS
}

/// Formality in [0, 1]: 0.5 baseline, ±0.1 per matched indicator group
pub fn formality(text: &str) -> f64 {
    let formal = formal_indicators().iter().filter(|p| p.is_match(text)).count();
    let informal = informal_indicators().iter().filter(|p| p.is_match(text)).count();
    (0.5 + 0.1 * formal as f64 - 0.1 * informal as f64).clamp(0.0, 1.0)
}

pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    (0x1F600..=0x1F64F).contains(&cp) // Emoticons
        || (0x1F300..=0x1F5FF).contains(&cp) // Misc symbols and pictographs
        || (0x1F680..=0x1F6FF).contains(&cp) // Transport
        || (0x1F900..=0x1F9FF).contains(&cp) // Supplemental
        || (0x2600..=0x26FF).contains(&cp) // Misc symbols
        || (0x2700..=0x27BF).contains(&cp) // Dingbats
}

pub fn count_emoji(text: &str) -> usize {
    text.chars().filter(|c| is_emoji(*c)).count()
}

/// Average words per sentence
pub fn sentence_length(text: &str) -> f64 {
    let words = tokenize(text).len();
    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    words as f64 / sentences as f64
}

/// Average word length over 10, clamped to [0, 1]
pub fn vocabulary_complexity(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let total: usize = tokens.iter().map(|t| t.chars().count()).sum();
    (total as f64 / tokens.len() as f64 / 10.0).clamp(0.0, 1.0)
}

/// Extract every feature from a text; empty text yields an empty set
pub fn extract(text: &str) -> FeatureSet {
    let text = text.trim();
    let mut features = FeatureSet::new();
    if text.is_empty() {
        return features;
    }

    let chars = text.chars().count().max(1) as f64;
    let emoji = count_emoji(text) as f64;
    let questions = text.matches('?').count() as f64;
    let exclamations = text.matches('!').count() as f64;

    features.insert(StyleFeature::Formality, formality(text));
    features.insert(StyleFeature::EmojiUsage, emoji);
    features.insert(StyleFeature::SentenceLength, sentence_length(text));
    features.insert(
        StyleFeature::VocabularyComplexity,
        vocabulary_complexity(text),
    );
    features.insert(StyleFeature::QuestionRate, questions / chars);
    features.insert(StyleFeature::ExclamationRate, exclamations / chars);
    features.insert(StyleFeature::EmojiRate, emoji / chars);
    features
}

/// Per-feature mean across several texts, skipping empty ones
pub fn average<'a>(texts: impl IntoIterator<Item = &'a str>) -> FeatureSet {
    let mut sums = FeatureSet::new();
    let mut count = 0usize;

    for text in texts {
        let features = extract(text);
        if features.is_empty() {
            continue;
        }
        count += 1;
        for (feature, value) in features {
            *sums.entry(feature).or_insert(0.0) += value;
        }
    }

    if count > 0 {
        for value in sums.values_mut() {
            *value /= count as f64;
        }
    }
    sums
}
