//! Encounter-ordered id handling and stable top-N selection.

use std::collections::HashSet;

use super::ScoredPosting;

/// Insertion-ordered set of posting ids.
#[derive(Debug, Default, Clone)]
pub struct OrderedIdSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl<'a> FromIterator<&'a str> for OrderedIdSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = OrderedIdSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// First `n` distinct ids in encounter order, all scored 0.0.
pub fn first_distinct<'a>(ids: impl IntoIterator<Item = &'a str>, n: usize) -> Vec<ScoredPosting> {
    ids.into_iter()
        .collect::<OrderedIdSet>()
        .into_vec()
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, posting_id)| ScoredPosting {
            posting_id,
            score: 0.0,
            rank: i + 1,
        })
        .collect()
}

/// Highest `n` scores, descending. The sort is stable, so ties keep encounter order.
pub fn top_n(mut scored: Vec<(String, f64)>, n: usize) -> Vec<ScoredPosting> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (posting_id, score))| ScoredPosting {
            posting_id,
            score,
            rank: i + 1,
        })
        .collect()
}
