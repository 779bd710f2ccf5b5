//! Bag-of-words Naive Bayes fallback
//!
//! Multinomial model with Laplace smoothing, trained once from a fixed seed
//! corpus. The category model only decides messages that no indicator
//! pattern matched; the intent classifier trains its own instance over
//! [`Intent`](super::intent::Intent) labels.

use super::lexicon::stopwords;
use super::patterns::tokenize;
use crate::types::Category;
use std::collections::{HashMap, HashSet};

/// Seed corpus: five examples each for urgent, work and personal
const SEED_CORPUS: &[(&str, Category)] = &[
    ("URGENT: Please respond immediately", Category::Urgent),
    ("Emergency situation requires attention", Category::Urgent),
    ("Deadline approaching", Category::Urgent),
    ("Critical issue needs resolution", Category::Urgent),
    ("ASAP: Important update required", Category::Urgent),
    ("Meeting scheduled for tomorrow", Category::Work),
    ("Project update:", Category::Work),
    ("Can you review this document", Category::Work),
    ("Team sync at 2 PM", Category::Work),
    ("Client presentation ready for review", Category::Work),
    ("How are you doing?", Category::Personal),
    ("Let's catch up soon", Category::Personal),
    ("Happy birthday!", Category::Personal),
    ("Great to hear from you", Category::Personal),
    ("Miss talking to you", Category::Personal),
];

#[derive(Debug, Default)]
struct ClassStats {
    documents: usize,
    token_total: usize,
    token_counts: HashMap<String, usize>,
}

/// Trained bag-of-words classifier over labels of type `L`
#[derive(Debug)]
pub struct NaiveBayes<L = Category> {
    classes: Vec<(L, ClassStats)>,
    vocabulary: HashSet<String>,
    document_total: usize,
}

impl<L: Copy + PartialEq> NaiveBayes<L> {
    /// Train on an arbitrary labeled corpus
    pub fn train<'a>(corpus: impl IntoIterator<Item = (&'a str, L)>) -> Self {
        let mut classes: Vec<(L, ClassStats)> = Vec::new();
        let mut vocabulary = HashSet::new();
        let mut document_total = 0;

        for (text, label) in corpus {
            document_total += 1;
            let index = match classes.iter().position(|(l, _)| *l == label) {
                Some(index) => index,
                None => {
                    classes.push((label, ClassStats::default()));
                    classes.len() - 1
                }
            };

            let stats = &mut classes[index].1;
            stats.documents += 1;
            for token in features(text) {
                stats.token_total += 1;
                *stats.token_counts.entry(token.clone()).or_insert(0) += 1;
                vocabulary.insert(token);
            }
        }

        Self {
            classes,
            vocabulary,
            document_total,
        }
    }

    /// Most probable label, or `None` when the text shares no vocabulary
    /// with the training corpus
    pub fn classify(&self, text: &str) -> Option<L> {
        let known = self.known_features(text);
        if known.is_empty() {
            return None;
        }
        self.rank(&known).map(|(label, _)| label)
    }

    /// Most probable label with its normalized posterior
    ///
    /// Always picks a label once trained: text without known vocabulary is
    /// decided by the class priors alone.
    pub fn most_likely(&self, text: &str) -> Option<(L, f64)> {
        let known = self.known_features(text);
        self.rank(&known)
    }

    fn known_features(&self, text: &str) -> Vec<String> {
        features(text)
            .into_iter()
            .filter(|token| self.vocabulary.contains(token))
            .collect()
    }

    fn rank(&self, known: &[String]) -> Option<(L, f64)> {
        if self.document_total == 0 {
            return None;
        }

        let vocabulary_size = self.vocabulary.len() as f64;
        let scores: Vec<(L, f64)> = self
            .classes
            .iter()
            .map(|(label, stats)| {
                let prior = stats.documents as f64 / self.document_total as f64;
                let denominator = stats.token_total as f64 + vocabulary_size;
                let log_prob = known.iter().fold(prior.ln(), |acc, token| {
                    let count = stats.token_counts.get(token).copied().unwrap_or(0) as f64;
                    acc + ((count + 1.0) / denominator).ln()
                });
                (*label, log_prob)
            })
            .collect();

        // Strict comparison keeps the first trained class on ties
        let mut best: Option<(L, f64)> = None;
        for (label, log_prob) in &scores {
            if best.map_or(true, |(_, score)| *log_prob > score) {
                best = Some((*label, *log_prob));
            }
        }

        best.map(|(label, top)| {
            let mass: f64 = scores.iter().map(|(_, lp)| (lp - top).exp()).sum();
            (label, 1.0 / mass)
        })
    }
}

impl NaiveBayes<Category> {
    /// Train on the built-in seed corpus
    pub fn seeded() -> Self {
        Self::train(SEED_CORPUS.iter().copied())
    }
}

impl Default for NaiveBayes<Category> {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Tokens used as model features: stopwords dropped, trailing plural folded
fn features(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| !stopwords().contains(token.as_str()))
        .map(|token| fold_plural(&token))
        .collect()
}

fn fold_plural(token: &str) -> String {
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}
