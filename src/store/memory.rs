//! In-memory profile store for tests and ephemeral runs

use super::{ProfileStore, RelationshipRecord, StyleRecord};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
pub struct MemoryProfileStore {
    relationships: RwLock<BTreeMap<String, RelationshipRecord>>,
    styles: RwLock<BTreeMap<String, StyleRecord>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load_relationship(&self, contact_id: &str) -> Result<Option<RelationshipRecord>> {
        Ok(self
            .relationships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contact_id)
            .cloned())
    }

    fn save_relationship(&self, contact_id: &str, record: &RelationshipRecord) -> Result<()> {
        self.relationships
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contact_id.to_string(), record.clone());
        Ok(())
    }

    fn relationship_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .relationships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn load_style(&self, author: &str) -> Result<Option<StyleRecord>> {
        Ok(self
            .styles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(author)
            .cloned())
    }

    fn save_style(&self, author: &str, record: &StyleRecord) -> Result<()> {
        self.styles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(author.to_string(), record.clone());
        Ok(())
    }

    fn style_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .styles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let store = MemoryProfileStore::new();
        assert!(store.load_relationship("alice").unwrap().is_none());

        let record = RelationshipRecord {
            relationship_score: 4.5,
            ..Default::default()
        };
        store.save_relationship("bob", &record).unwrap();
        store.save_relationship("alice", &record).unwrap();
        assert_eq!(store.load_relationship("alice").unwrap(), Some(record));
        assert_eq!(store.relationship_ids().unwrap(), vec!["alice", "bob"]);

        store.save_style("self", &StyleRecord::default()).unwrap();
        assert_eq!(store.style_ids().unwrap(), vec!["self"]);
        assert!(store.load_style("alice").unwrap().is_none());
    }
}
