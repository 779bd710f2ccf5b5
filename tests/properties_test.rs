//! Property tests for pipeline invariants
//!
//! Bounds on priority, relationship score and confidence, interaction
//! retention, style decay, persisted-record fidelity, and urgent messages
//! ranking high regardless of surrounding text

mod common;

use chrono::Duration;
use common::t0;
use proptest::prelude::*;
use rapport_core::relationship::InteractionSample;
use rapport_core::store::RelationshipRecord;
use rapport_core::classifier::Intent;
use rapport_core::style::{StyleFeature, StyleProfile};
use rapport_core::types::Sentiment;
use rapport_core::{
    Category, ClassificationResult, ConfidenceScorer, Message, MessageClassifier,
    RelationshipProfile, RelationshipTracker, ResponseContext,
};

/// (seconds since previous, sentiment score, body length, from self, asks something, intent)
type Step = (i64, f64, usize, bool, bool, Option<Intent>);

fn step() -> impl Strategy<Value = Step> {
    (
        0i64..200_000,
        -15.0f64..15.0,
        0usize..2_000,
        any::<bool>(),
        any::<bool>(),
        prop::option::of(prop::sample::select(Intent::ALL.to_vec())),
    )
}

fn run(tracker: &RelationshipTracker, steps: &[Step]) -> RelationshipProfile {
    let mut at = t0();
    let mut profile = RelationshipProfile::default();
    for (gap, score, length, from_self, asks, intent) in steps {
        at += Duration::seconds(*gap);
        let classification = ClassificationResult {
            category: Category::Personal,
            sentiment: Sentiment::from_score(*score),
            ..Default::default()
        };
        let sample = InteractionSample {
            timestamp: at,
            message_length: *length,
            requires_response: *asks,
            is_from_self: *from_self,
            intent: *intent,
        };
        profile = tracker.update("prop", &classification, &sample);
    }
    profile
}

proptest! {
    #[test]
    fn prop_priority_in_range(body in "\\PC{0,200}", hour in 0u32..24) {
        let classifier = MessageClassifier::default();
        let at = t0() + Duration::hours(hour as i64);
        let result = classifier.classify(&Message::new("chat", "sender", body, at));
        prop_assert!((1..=10).contains(&result.priority));
        prop_assert!(result.sentiment.intensity >= 0.0);
    }

    #[test]
    fn prop_urgent_double_bang(
        before in "\\PC{0,60}",
        between in "\\PC{0,60}",
        after in "\\PC{0,60}",
        hour in 0u32..24,
        sender in prop_oneof![Just(String::new()), "[a-z]{1,12}"],
    ) {
        let classifier = MessageClassifier::default();
        let body = format!("{} URGENT {}!!{}", before, between, after);
        let at = t0() + Duration::hours(hour as i64);
        let result = classifier.classify(&Message::new("chat", sender, body, at));

        prop_assert!(result.is_urgent);
        prop_assert!(result.priority >= 8);
        prop_assert!(result.requires_response());
    }

    #[test]
    fn prop_relationship_score_bounded(steps in prop::collection::vec(step(), 1..150)) {
        let tracker = RelationshipTracker::default();
        let profile = run(&tracker, &steps);

        prop_assert!((0.0..=10.0).contains(&profile.relationship_score));
        prop_assert!(profile.interactions.len() <= 100);
        prop_assert_eq!(profile.interactions.len(), steps.len().min(100));
        prop_assert!(profile.metrics.response_time.average_secs >= 0.0);
        prop_assert!(profile.metrics.engagement.score <= 10.0);
    }

    #[test]
    fn prop_record_preserves_profile(steps in prop::collection::vec(step(), 1..40)) {
        let tracker = RelationshipTracker::default();
        let profile = run(&tracker, &steps);

        let json = serde_json::to_string(&RelationshipRecord::from(&profile)).unwrap();
        let record: RelationshipRecord = serde_json::from_str(&json).unwrap();
        let restored = RelationshipProfile::try_from(record).unwrap();

        prop_assert_eq!(restored.relationship_score, profile.relationship_score);
        prop_assert_eq!(restored.status, profile.status);
        prop_assert_eq!(&restored.flags, &profile.flags);
        prop_assert_eq!(restored, profile);
    }

    #[test]
    fn prop_confidence_in_unit_interval(
        response in "\\PC{0,120}",
        history in "\\PC{0,120}",
        topics in prop::collection::vec("[a-z]{3,8}", 0..6),
        accuracy in -2.0f64..3.0,
    ) {
        let mut contact_style = StyleProfile::default();
        contact_style.blend(&rapport_core::style::features::extract(&history), 0.2);

        let context = ResponseContext {
            message_id: "m".to_string(),
            contact_id: "c".to_string(),
            classification: ClassificationResult::neutral(),
            relationship: Default::default(),
            contact_style,
            user_style: None,
            topics,
            confidence: None,
        };

        let scorer = ConfidenceScorer::default()
            .with_accuracy(move |_: &ResponseContext| accuracy);
        let score = scorer.score(&response, &context);

        prop_assert!((0.0..=1.0).contains(&score.overall));
        for factor in [
            score.factors.style_match,
            score.factors.topic_relevance,
            score.factors.pattern_adherence,
            score.factors.historical_accuracy,
        ] {
            prop_assert!((0.0..=1.0).contains(&factor));
        }
    }

    #[test]
    fn prop_decay_never_grows(
        value in 0.0f64..50.0,
        factor in 0.01f64..=1.0,
        minutes in 0i64..100_000,
    ) {
        let mut profile = StyleProfile::default();
        profile.language_patterns.insert(StyleFeature::SentenceLength, value);
        profile.last_update = Some(t0());

        profile.decay(
            t0() + Duration::minutes(minutes),
            factor,
            std::time::Duration::from_secs(86_400),
        );
        let decayed = profile.language_patterns[&StyleFeature::SentenceLength];
        prop_assert!(decayed <= value);
        prop_assert!(decayed >= 0.0);
    }
}
