//! Conversational intent of a message
//!
//! The primary intent comes from a Naive Bayes model trained on a small
//! labeled corpus and is always one of the six [`Intent`] labels. Secondary
//! intents are every label whose patterns or keywords appear in the text.
//! Five boolean features (question, urgency, action request, social,
//! follow-up) decide whether the message expects an answer.

use super::bayes::NaiveBayes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a message is trying to do in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Question,
    ActionRequest,
    InformationSharing,
    Social,
    Business,
    Followup,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Question,
        Intent::ActionRequest,
        Intent::InformationSharing,
        Intent::Social,
        Intent::Business,
        Intent::Followup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Question => "question",
            Intent::ActionRequest => "action_request",
            Intent::InformationSharing => "information_sharing",
            Intent::Social => "social",
            Intent::Business => "business",
            Intent::Followup => "followup",
        }
    }

    /// Pattern and keyword rule that marks this intent as present
    fn rule(&self) -> &'static IntentRule {
        static RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
            vec![
                IntentRule::new(
                    r"\?$|^(what|who|where|when|why|how)",
                    &["help", "advice", "question", "wondering", "curious"],
                ),
                IntentRule::new(
                    r"^(please|can you|could you)|\b(need|want)\b.*\b(you to|if you)\b",
                    &["send", "share", "help", "do", "make", "get", "update"],
                ),
                IntentRule::new(
                    r"^(fyi|just so you know|heads up)",
                    &["update", "news", "information", "status", "report"],
                ),
                IntentRule::new(
                    r"^(hey|hi|hello|how are you)",
                    &["thanks", "thank you", "appreciate", "congrats", "congratulations", "welcome"],
                ),
                IntentRule::new(
                    r"\b(meeting|deadline|project|client|report)\b",
                    &["urgent", "important", "priority", "asap", "review"],
                ),
                IntentRule::new(
                    r"\b(following up|checking in|any update|status)\b",
                    &["reminder", "pending", "waiting", "response"],
                ),
            ]
        });
        &RULES[*self as usize]
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown intent: {}", s))
    }
}

struct IntentRule {
    pattern: Regex,
    keywords: &'static [&'static str],
}

impl IntentRule {
    fn new(pattern: &str, keywords: &'static [&'static str]) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("Valid intent pattern"),
            keywords,
        }
    }

    /// `text` must already be lowercased and trimmed
    fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text) || self.keywords.iter().any(|k| text.contains(k))
    }
}

const TRAINING_CORPUS: &[(&str, Intent)] = &[
    ("What time is the meeting?", Intent::Question),
    ("How does this work?", Intent::Question),
    ("Where should I send the files?", Intent::Question),
    ("Can you explain this to me?", Intent::Question),
    ("Who is responsible for this?", Intent::Question),
    ("When do you need this by?", Intent::Question),
    ("Please review this document", Intent::ActionRequest),
    ("Can you send me the files?", Intent::ActionRequest),
    ("Need you to check this", Intent::ActionRequest),
    ("Could you help me with this?", Intent::ActionRequest),
    ("Want you to take a look", Intent::ActionRequest),
    ("Make sure this is done", Intent::ActionRequest),
    ("Just letting you know the project is complete", Intent::InformationSharing),
    ("FYI - meeting cancelled", Intent::InformationSharing),
    ("Heads up about tomorrow", Intent::InformationSharing),
    ("Wanted to inform you about the changes", Intent::InformationSharing),
    ("Update on the situation", Intent::InformationSharing),
    ("Here's the latest status", Intent::InformationSharing),
    ("Hey, how are you?", Intent::Social),
    ("Thanks for your help", Intent::Social),
    ("Great working with you", Intent::Social),
    ("Hope you're doing well", Intent::Social),
    ("Have a great weekend", Intent::Social),
    ("Congratulations on the promotion", Intent::Social),
    ("The client meeting is scheduled", Intent::Business),
    ("Project deadline is approaching", Intent::Business),
    ("Urgent: Report needed", Intent::Business),
    ("Review required for presentation", Intent::Business),
    ("Important business update", Intent::Business),
    ("Meeting agenda attached", Intent::Business),
    ("Following up on my last email", Intent::Followup),
    ("Any updates on this?", Intent::Followup),
    ("Checking in about the request", Intent::Followup),
    ("Reminder about the pending items", Intent::Followup),
    ("Still waiting for your response", Intent::Followup),
    ("Status update needed", Intent::Followup),
];

/// Surface features that decide whether a message expects an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntentFeatures {
    pub has_question: bool,
    pub is_urgent: bool,
    pub requires_action: bool,
    pub is_social: bool,
    pub is_follow_up: bool,
}

impl IntentFeatures {
    /// Features of a lowercased, trimmed text
    fn detect(text: &str) -> Self {
        static QUESTION_OPENER: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^(what|who|where|when|why|how)").expect("Valid question opener regex")
        });
        static URGENT: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b(urgent|asap|emergency|immediate)\b").expect("Valid urgent feature regex")
        });
        static ACTION: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b(need|please|must|should|could you|can you)\b")
                .expect("Valid action feature regex")
        });
        static SOCIAL: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b(thanks|thank you|hi|hey|hello|bye|goodbye)\b")
                .expect("Valid social feature regex")
        });
        static FOLLOW_UP: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b(following up|checking|reminder|status|update)\b")
                .expect("Valid follow-up feature regex")
        });

        Self {
            has_question: text.contains('?') || QUESTION_OPENER.is_match(text),
            is_urgent: URGENT.is_match(text),
            requires_action: ACTION.is_match(text),
            is_social: SOCIAL.is_match(text),
            is_follow_up: FOLLOW_UP.is_match(text),
        }
    }

    /// Questions, requests and urgent messages all expect an answer
    pub fn requires_response(&self) -> bool {
        self.has_question || self.requires_action || self.is_urgent
    }
}

/// Intent analysis of one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    /// Most probable intent under the trained model
    pub primary: Intent,

    /// Every intent whose patterns or keywords appear, in declaration order
    #[serde(default)]
    pub secondary: Vec<Intent>,

    /// Posterior of the primary intent in [0, 1]
    pub confidence: f64,

    #[serde(default)]
    pub features: IntentFeatures,
}

/// Intent classifier backed by a corpus-trained Naive Bayes model
#[derive(Debug)]
pub struct IntentClassifier {
    model: NaiveBayes<Intent>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            model: NaiveBayes::train(TRAINING_CORPUS.iter().copied()),
        }
    }

    /// Classify a text; `None` only for blank text
    pub fn classify(&self, text: &str) -> Option<IntentClassification> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let (primary, confidence) = self.model.most_likely(&text)?;
        let secondary = Intent::ALL
            .into_iter()
            .filter(|intent| intent.rule().matches(&text))
            .collect();

        Some(IntentClassification {
            primary,
            secondary,
            confidence,
            features: IntentFeatures::detect(&text),
        })
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Most frequent intent; ties go to the one seen first
pub fn top_intent(intents: impl IntoIterator<Item = Intent>) -> Option<Intent> {
    let mut counts: Vec<(Intent, usize)> = Vec::new();
    for intent in intents {
        match counts.iter_mut().find(|(seen, _)| *seen == intent) {
            Some((_, count)) => *count += 1,
            None => counts.push((intent, 1)),
        }
    }

    let mut best: Option<(Intent, usize)> = None;
    for (intent, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((intent, count));
        }
    }
    best.map(|(intent, _)| intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> IntentClassification {
        IntentClassifier::default().classify(text).unwrap()
    }

    #[test]
    fn test_requests_and_urgency_require_response() {
        for text in [
            "Please send me the files",
            "I need you to call the bank",
            "can you pick up milk",
            "URGENT call me",
            "Are you around?",
        ] {
            assert!(classify(text).features.requires_response(), "{}", text);
        }
        assert!(!classify("Thanks, see you later").features.requires_response());
    }

    #[test]
    fn test_features() {
        let features = classify("Hey, following up on the status").features;
        assert!(features.is_social);
        assert!(features.is_follow_up);
        assert!(!features.has_question);

        let features = classify("how was the trip").features;
        assert!(features.has_question);
        assert!(!features.is_urgent);
    }

    #[test]
    fn test_primary_intent_from_training_vocabulary() {
        assert_eq!(classify("Reminder about the pending items").primary, Intent::Followup);
        assert_eq!(classify("Congratulations on the promotion").primary, Intent::Social);
        assert_eq!(classify("client meeting agenda").primary, Intent::Business);
    }

    #[test]
    fn test_unknown_vocabulary_still_picks_an_intent() {
        let result = classify("qwerty zxcv");
        assert_eq!(result.primary, Intent::Question);
        assert!((result.confidence - 1.0 / 6.0).abs() < 1e-9);
        assert!(result.secondary.is_empty());
    }

    #[test]
    fn test_secondary_intents() {
        let result = classify("Hi! Could you review the client report?");
        assert!(result.secondary.contains(&Intent::Question));
        assert!(result.secondary.contains(&Intent::Social));
        assert!(result.secondary.contains(&Intent::Business));
        assert!(!result.secondary.contains(&Intent::Followup));

        let result = classify("fyi the launch moved");
        assert_eq!(result.secondary, vec![Intent::InformationSharing]);
    }

    #[test]
    fn test_blank_text_has_no_intent() {
        assert_eq!(IntentClassifier::default().classify("  "), None);
    }

    #[test]
    fn test_top_intent_prefers_first_seen_on_ties() {
        use Intent::*;
        assert_eq!(top_intent([Social, Question, Question]), Some(Question));
        assert_eq!(top_intent([Business, Social, Social, Business]), Some(Business));
        assert_eq!(top_intent([]), None);
    }

    #[test]
    fn test_intent_roundtrip_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert!("gossip".parse::<Intent>().is_err());
        assert_eq!(
            serde_json::to_string(&Intent::ActionRequest).unwrap(),
            "\"action_request\""
        );
    }
}
