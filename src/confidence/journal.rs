//! Capacity-bounded records keyed by message id

use std::collections::{HashMap, VecDeque};

/// Keeps at most `capacity` entries, evicting the oldest insert first
///
/// Re-recording an id replaces its value in place without refreshing its
/// age. Not synchronized; callers wrap it in their own lock.
#[derive(Debug, Clone)]
pub struct BoundedLog<V> {
    entries: HashMap<String, V>,
    order: VecDeque<String>,
    capacity: usize,
}

impl<V> BoundedLog<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert or replace; returns how many old entries were evicted
    pub fn insert(&mut self, id: &str, value: V) -> usize {
        if let Some(existing) = self.entries.get_mut(id) {
            *existing = value;
            return 0;
        }

        self.entries.insert(id.to_string(), value);
        self.order.push_back(id.to_string());

        let mut evicted = 0;
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                evicted += 1;
            }
        }
        evicted
    }

    pub fn get(&self, id: &str) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
