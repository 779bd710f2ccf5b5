//! Pre-compiled indicator patterns for message classification
//!
//! Every pattern is compiled once on first use and shared across
//! classifier instances.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keyword and punctuation indicators used by the classifier
pub struct Indicators;

impl Indicators {
    /// Urgent category indicators (also worth +3 priority)
    pub fn urgent() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)urgent|asap|emergency|immediate|deadline|critical|!{2,}")
                .expect("Valid urgent indicator regex")
        });
        &PATTERN
    }

    /// Personal category indicators
    pub fn personal() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"(?i)how are you|catch up|miss you|birthday|family|friend|personal|life|feeling|chat",
            )
            .expect("Valid personal indicator regex")
        });
        &PATTERN
    }

    /// Work category indicators
    pub fn work() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"(?i)meeting|project|client|deadline|report|review|team|update|status|work",
            )
            .expect("Valid work indicator regex")
        });
        &PATTERN
    }

    /// Urgency tier A (weight 3)
    pub fn urgency_critical() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)urgent|emergency|asap|immediate|critical")
                .expect("Valid urgency tier A regex")
        });
        &PATTERN
    }

    /// Urgency tier B (weight 2)
    pub fn urgency_important() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(deadline|due|important)\b").expect("Valid urgency tier B regex")
        });
        &PATTERN
    }

    /// Urgency tier C (weight 1)
    pub fn urgency_soft() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)!{2,}|\?{2,}|\bplease\b|\bneed").expect("Valid urgency tier C regex")
        });
        &PATTERN
    }

    /// Same-day time sensitivity
    pub fn time_immediate() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(today|tonight|now)\b").expect("Valid immediate time regex")
        });
        &PATTERN
    }

    /// Next-day time sensitivity
    pub fn time_upcoming() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(tomorrow|next day)\b").expect("Valid upcoming time regex")
        });
        &PATTERN
    }

    /// Loose time sensitivity
    pub fn time_soon() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(this week|soon)\b").expect("Valid soon time regex")
        });
        &PATTERN
    }

    /// Requests for action from the reader
    pub fn action_request() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(todo|task|action|review|respond|reply|check|confirm)\b")
                .expect("Valid action request regex")
        });
        &PATTERN
    }

    /// Word tokens in any script, apostrophes kept so negations survive
    pub fn word() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("Valid word token regex"));
        &PATTERN
    }
}

/// Split text into lowercase word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    Indicators::word()
        .find_iter(&lower)
        .map(|m| m.as_str().trim_matches('\'').to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgent_indicator_matches_punctuation() {
        assert!(Indicators::urgent().is_match("call me back!!"));
        assert!(Indicators::urgent().is_match("ASAP please"));
        assert!(!Indicators::urgent().is_match("call me back!"));
    }

    #[test]
    fn test_urgency_tiers() {
        assert!(Indicators::urgency_critical().is_match("respond immediately"));
        assert!(Indicators::urgency_important().is_match("report due friday"));
        assert!(!Indicators::urgency_important().is_match("procedure"));
        assert!(Indicators::urgency_soft().is_match("I need this"));
        assert!(Indicators::urgency_soft().is_match("really??"));
    }

    #[test]
    fn test_time_patterns_use_word_boundaries() {
        assert!(Indicators::time_immediate().is_match("can we talk now"));
        assert!(!Indicators::time_immediate().is_match("I know"));
        assert!(Indicators::time_upcoming().is_match("see you Tomorrow"));
        assert!(Indicators::time_soon().is_match("sometime this week"));
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("Don't PANIC, it's fine!");
        assert_eq!(tokens, vec!["don't", "panic", "it's", "fine"]);
        assert!(tokenize("!!! ???").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_non_ascii_words_whole() {
        assert_eq!(tokenize("Café au lait"), vec!["café", "au", "lait"]);
        assert_eq!(tokenize("Привет, как дела?"), vec!["привет", "как", "дела"]);
        assert!(tokenize("👍 🎉").is_empty());
    }
}
