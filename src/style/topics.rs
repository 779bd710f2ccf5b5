//! Rolling per-contact topic window

use crate::classifier::{lexicon::stopwords, tokenize};
use crate::contacts::ContactMap;
use std::collections::{HashMap, VecDeque};

/// Rank terms by frequency, ties kept in first-seen order
fn rank<'a>(terms: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for term in terms {
        let count = counts.entry(term).or_insert(0);
        if *count == 0 {
            order.push(term);
        }
        *count += 1;
    }

    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.into_iter().take(limit).map(str::to_string).collect()
}

fn is_topic_term(token: &str) -> bool {
    token.chars().count() >= 3
        && !stopwords().contains(token)
        && !token.chars().all(|c| c.is_ascii_digit())
}

/// Most frequent content words of a text
pub fn extract_terms(text: &str, limit: usize) -> Vec<String> {
    let tokens: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|t| is_topic_term(t))
        .collect();
    rank(tokens.iter().map(String::as_str), limit)
}

/// Topic terms of the last few messages per contact
pub struct TopicTracker {
    window: usize,
    max_topics: usize,
    windows: ContactMap<VecDeque<Vec<String>>>,
}

impl TopicTracker {
    pub fn new(window: usize, max_topics: usize) -> Self {
        Self {
            window: window.max(1),
            max_topics,
            windows: ContactMap::new(),
        }
    }

    /// Add a message's terms and return the contact's current topics
    pub fn observe(&self, contact_id: &str, text: &str) -> Vec<String> {
        let terms = extract_terms(text, self.max_topics);
        self.windows.with(contact_id, |window| {
            if !terms.is_empty() {
                window.push_back(terms);
                while window.len() > self.window {
                    window.pop_front();
                }
            }
            rank(window.iter().flatten().map(String::as_str), self.max_topics)
        })
    }

    pub fn current_topics(&self, contact_id: &str) -> Vec<String> {
        self.windows
            .with_existing(contact_id, |window| {
                rank(window.iter().flatten().map(String::as_str), self.max_topics)
            })
            .unwrap_or_default()
    }
}

impl Default for TopicTracker {
    fn default() -> Self {
        Self::new(10, 5)
    }
}
