//! Word lists for sentiment scoring and term extraction
//!
//! The sentiment weights follow the AFINN convention: integers in -5..=5,
//! where the sign carries polarity and the magnitude carries strength.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// AFINN-style word weights
pub struct SentimentLexicon;

impl SentimentLexicon {
    pub fn weights() -> &'static HashMap<&'static str, i32> {
        static MAP: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
            [
                // Positive
                ("absolutely", 1),
                ("agree", 1),
                ("amazing", 4),
                ("appreciate", 2),
                ("appreciated", 2),
                ("awesome", 4),
                ("beautiful", 3),
                ("best", 3),
                ("better", 2),
                ("brilliant", 4),
                ("care", 2),
                ("celebrate", 3),
                ("cheers", 2),
                ("congrats", 2),
                ("congratulations", 2),
                ("cool", 1),
                ("delighted", 3),
                ("enjoy", 2),
                ("enjoyed", 2),
                ("excellent", 3),
                ("excited", 3),
                ("exciting", 3),
                ("fantastic", 4),
                ("favorite", 2),
                ("fine", 2),
                ("fun", 4),
                ("glad", 3),
                ("good", 3),
                ("grateful", 3),
                ("great", 3),
                ("haha", 3),
                ("happy", 3),
                ("helpful", 2),
                ("hope", 2),
                ("hug", 2),
                ("hugs", 2),
                ("impressed", 3),
                ("impressive", 3),
                ("kind", 2),
                ("laugh", 1),
                ("like", 2),
                ("lol", 3),
                ("love", 3),
                ("loved", 3),
                ("lovely", 3),
                ("nice", 3),
                ("perfect", 3),
                ("pleased", 3),
                ("proud", 2),
                ("smile", 2),
                ("success", 2),
                ("successful", 3),
                ("super", 3),
                ("support", 2),
                ("sweet", 2),
                ("thank", 2),
                ("thanks", 2),
                ("welcome", 2),
                ("win", 4),
                ("wonderful", 4),
                ("won", 3),
                ("wow", 4),
                ("yay", 3),
                ("yes", 1),
                // Negative
                ("afraid", -2),
                ("angry", -3),
                ("annoyed", -2),
                ("annoying", -2),
                ("awful", -3),
                ("bad", -3),
                ("boring", -3),
                ("broken", -1),
                ("confused", -2),
                ("crisis", -3),
                ("critical", -2),
                ("cry", -1),
                ("crying", -2),
                ("damn", -4),
                ("delay", -1),
                ("delayed", -1),
                ("disappointed", -2),
                ("disappointing", -2),
                ("emergency", -2),
                ("fail", -2),
                ("failed", -2),
                ("failure", -2),
                ("fear", -2),
                ("frustrated", -2),
                ("frustrating", -2),
                ("hate", -3),
                ("hated", -3),
                ("horrible", -3),
                ("hurt", -2),
                ("issue", -1),
                ("issues", -1),
                ("lonely", -2),
                ("lost", -3),
                ("mad", -3),
                ("miss", -2),
                ("pain", -2),
                ("problem", -2),
                ("problems", -2),
                ("sad", -2),
                ("scared", -2),
                ("sick", -2),
                ("sorry", -1),
                ("stress", -1),
                ("stressed", -2),
                ("terrible", -3),
                ("tired", -2),
                ("ugh", -2),
                ("unacceptable", -2),
                ("unfortunately", -2),
                ("upset", -2),
                ("worried", -3),
                ("worry", -3),
                ("worst", -3),
                ("wrong", -2),
            ]
            .into_iter()
            .collect()
        });
        &MAP
    }

    /// Words that flip the polarity of the next scored word
    pub fn negations() -> &'static HashSet<&'static str> {
        static SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
            [
                "not", "no", "never", "nothing", "don't", "dont", "doesn't", "didn't", "isn't",
                "wasn't", "aren't", "can't", "cannot", "won't", "wouldn't", "shouldn't",
            ]
            .into_iter()
            .collect()
        });
        &SET
    }

    /// Weight of a single lowercase token, if scored
    pub fn weight(token: &str) -> Option<i32> {
        Self::weights().get(token).copied()
    }

    /// Average weight per token, with negation handling
    ///
    /// A negation word flips the sign of the next scored token. Returns 0.0
    /// for an empty token list.
    pub fn score_tokens(tokens: &[String]) -> f64 {
        if tokens.is_empty() {
            return 0.0;
        }

        let mut total = 0i32;
        let mut negate = false;
        for token in tokens {
            if Self::negations().contains(token.as_str()) {
                negate = true;
                continue;
            }
            if let Some(weight) = Self::weight(token) {
                total += if negate { -weight } else { weight };
                negate = false;
            }
        }

        total as f64 / tokens.len() as f64
    }
}

/// Function words ignored by term extraction and the bag-of-words model
pub fn stopwords() -> &'static HashSet<&'static str> {
    static SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
        [
            "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as",
            "at", "be", "been", "before", "being", "but", "by", "can", "could", "did", "do",
            "does", "for", "from", "get", "got", "had", "has", "have", "he", "her", "here", "him",
            "his", "how", "i", "if", "in", "into", "is", "it", "it's", "its", "just", "let's",
            "me", "my", "of", "on", "or", "our", "out", "she", "so", "some", "than", "that",
            "the", "their", "them", "then", "there", "these", "they", "this", "to", "too", "up",
            "us", "was", "we", "were", "what", "when", "where", "which", "who", "why", "will",
            "with", "would", "you", "your", "i'm", "you're", "that's",
        ]
        .into_iter()
        .collect()
    });
    &SET
}
