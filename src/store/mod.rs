//! Profile persistence
//!
//! The engine keeps all state in memory; a [`ProfileStore`] is the narrow
//! seam through which relationship and style profiles are saved and
//! reloaded as plain records.

pub mod json;
pub mod memory;
pub mod records;

pub use json::JsonFileStore;
pub use memory::MemoryProfileStore;
pub use records::{
    InteractionRecord, LastInteractionRecord, RelationshipRecord, ResponseTimeRecord, StyleRecord,
};

use crate::error::Result;

/// Storage backend for persisted profiles
pub trait ProfileStore: Send + Sync {
    /// Load a contact's relationship record, if stored
    fn load_relationship(&self, contact_id: &str) -> Result<Option<RelationshipRecord>>;

    /// Store a contact's relationship record, replacing any previous one
    fn save_relationship(&self, contact_id: &str, record: &RelationshipRecord) -> Result<()>;

    /// Contact ids with a stored relationship, sorted
    fn relationship_ids(&self) -> Result<Vec<String>>;

    /// Load an author's style record, if stored
    fn load_style(&self, author: &str) -> Result<Option<StyleRecord>>;

    /// Store an author's style record, replacing any previous one
    fn save_style(&self, author: &str, record: &StyleRecord) -> Result<()>;

    /// Authors with a stored style, sorted
    fn style_ids(&self) -> Result<Vec<String>>;
}
