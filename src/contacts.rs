//! Per-contact state repository
//!
//! Every long-lived profile is stored behind its own mutex so that two
//! delivery paths touching the same contact are serialized, while different
//! contacts proceed independently. The outer map lock is only held long
//! enough to find or create an entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Map of contact id to independently locked state
pub struct ContactMap<P> {
    entries: RwLock<HashMap<String, Arc<Mutex<P>>>>,
}

impl<P> ContactMap<P> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Whether state exists for a contact
    pub fn contains(&self, contact_id: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(contact_id)
    }

    /// Number of contacts with state
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contact ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Replace the state for a contact
    pub fn insert(&self, contact_id: &str, state: P) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contact_id.to_string(), Arc::new(Mutex::new(state)));
    }

    /// Drop the state for a contact
    pub fn remove(&self, contact_id: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(contact_id)
            .is_some()
    }

    /// Run `f` on existing state only
    pub fn with_existing<R>(&self, contact_id: &str, f: impl FnOnce(&mut P) -> R) -> Option<R> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contact_id)
            .cloned()?;
        let mut state = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut state))
    }
}

impl<P: Default> ContactMap<P> {
    /// Lock handle for a contact, creating default state on first use
    pub fn entry(&self, contact_id: &str) -> Arc<Mutex<P>> {
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contact_id)
        {
            return Arc::clone(entry);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            entries
                .entry(contact_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(P::default()))),
        )
    }

    /// Run `f` with exclusive access to a contact's state
    pub fn with<R>(&self, contact_id: &str, f: impl FnOnce(&mut P) -> R) -> R {
        let entry = self.entry(contact_id);
        let mut state = entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl<P: Clone> ContactMap<P> {
    /// Copy of a contact's state
    pub fn get(&self, contact_id: &str) -> Option<P> {
        self.with_existing(contact_id, |state| state.clone())
    }

    /// Copy of every contact's state, sorted by id
    pub fn snapshot(&self) -> Vec<(String, P)> {
        let entries: Vec<(String, Arc<Mutex<P>>)> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
            .collect();

        let mut snapshot: Vec<(String, P)> = entries
            .into_iter()
            .map(|(id, entry)| {
                let state = entry.lock().unwrap_or_else(PoisonError::into_inner).clone();
                (id, state)
            })
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }
}

impl<P> Default for ContactMap<P> {
    fn default() -> Self {
        Self::new()
    }
}
