//! Rapport - Per-Contact Conversation Intelligence
//!
//! A synchronous engine that learns from a stream of chat messages and
//! prepares context for drafting replies:
//! - Message classification (category, urgency, sentiment, priority, intent)
//! - Per-contact writing style with time decay
//! - Relationship health scoring with trend detection
//! - Confidence scoring for candidate responses
//! - Learning from user edits to proposed responses
//!
//! # Architecture
//!
//! Each inbound message flows through one pipeline:
//! - **Classifier**: category, urgency, sentiment, priority and intent per message
//! - **Style**: language features blended into a decaying per-author profile
//! - **Relationship**: bounded interaction history, metrics, score and status
//! - **Confidence**: how well a candidate response fits what is known
//! - **Context**: orchestration, producing a [`ResponseContext`] per message
//!
//! Long-lived profiles persist through a [`ProfileStore`].
//!
//! # Example
//!
//! ```ignore
//! use rapport_core::{ContextAssembler, JsonFileStore, Message, RapportConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = RapportConfig::from_file("rapport.toml".as_ref())?;
//!     let assembler = ContextAssembler::new(config);
//!     let store = JsonFileStore::open("profiles")?;
//!     assembler.restore(&store)?;
//!
//!     let message = Message::new("alice", "alice", "Can we move the call?", chrono::Utc::now());
//!     let mut context = assembler.process_message(&message);
//!     let score = assembler.score_response(&mut context, "Sure, how about 3pm?");
//!     println!("confidence {:.2}", score.overall);
//!
//!     assembler.persist(&store)?;
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod confidence;
pub mod config;
pub mod contacts;
pub mod context;
pub mod error;
pub mod relationship;
pub mod store;
pub mod style;
pub mod types;

// Re-export commonly used types
pub use classifier::{
    Intent, MessageClassifier, MessageLog, MessageSummary, SenderPriority, Timeframe,
};
pub use confidence::{ConfidenceScore, ConfidenceScorer, HistoricalAccuracy, ResponseDiff};
pub use config::RapportConfig;
pub use contacts::ContactMap;
pub use context::{ContextAssembler, ResponseContext, USER_STYLE_KEY};
pub use error::{RapportError, Result};
pub use relationship::{
    RelationshipProfile, RelationshipStatus, RelationshipSummary, RelationshipTracker,
};
pub use store::{JsonFileStore, MemoryProfileStore, ProfileStore};
pub use style::{StyleAnalyzer, StyleProfile, TopicTracker};
pub use types::{Category, ClassificationResult, Message, Polarity, Sentiment, Trend};
