//! Bounded Ranking
//!
//! Keeps the `k` best scores seen so far without sorting the whole input.

/// A ranked candidate: store index plus its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub score: f64,
}

/// Fixed-capacity list ordered by descending score.
///
/// A candidate enters only if the list has room or it strictly beats the
/// worst kept score, so among equal scores the earliest offered stays ahead.
/// NaN scores are ignored.
#[derive(Debug, Clone)]
pub struct RankedList {
    capacity: usize,
    entries: Vec<Ranked>,
}

impl RankedList {
    /// Create an empty list holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Offer a candidate; returns whether it was kept
    pub fn offer(&mut self, index: usize, score: f64) -> bool {
        if self.capacity == 0 || score.is_nan() {
            return false;
        }
        if self.entries.len() == self.capacity {
            match self.entries.last() {
                Some(worst) if score > worst.score => {
                    self.entries.pop();
                }
                _ => return false,
            }
        }
        // Insert after every entry scoring at least as high.
        let pos = self.entries.partition_point(|e| e.score >= score);
        self.entries.insert(pos, Ranked { index, score });
        true
    }

    /// Lowest kept score, if any
    pub fn worst(&self) -> Option<f64> {
        self.entries.last().map(|e| e.score)
    }

    /// Get number of kept entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kept entries, best first
    pub fn into_vec(self) -> Vec<Ranked> {
        self.entries
    }
}

/// Rank `scores` and keep the best `k`
pub fn top_k_scores(scores: &[f64], k: usize) -> Vec<Ranked> {
    let mut list = RankedList::new(k.min(scores.len()));
    for (index, &score) in scores.iter().enumerate() {
        list.offer(index, score);
    }
    list.into_vec()
}

/// Index and score of the maximum, first occurrence on ties
pub fn argmax(scores: &[f64]) -> Option<Ranked> {
    let mut best: Option<Ranked> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some(b) if score <= b.score => {}
            _ => best = Some(Ranked { index, score }),
        }
    }
    best
}
