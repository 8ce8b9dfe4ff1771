//! Embedding Store
//!
//! Term dictionary plus dense vectors and frequency counts, kept in lock-step
//! by index. Vectors are stored contiguously, `dimension` floats per term.

use hashbrown::HashMap;
use std::collections::HashSet;

use super::similarity::normalize_vector;
use crate::error::{Result, SpaceError};

/// Frequency value of a term whose count was never set
pub const FREQUENCY_UNSET: i64 = -1;

/// Dictionary-backed store of term embeddings
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStore {
    /// Term -> index
    dictionary: HashMap<String, usize>,
    /// Index -> term
    terms: Vec<String>,
    /// Row-major vector data, `terms.len() * dimension` floats
    data: Vec<f32>,
    /// Index -> corpus frequency
    frequencies: Vec<i64>,
    /// Expected embedding dimension
    dimension: usize,
}

impl EmbeddingStore {
    /// Create a new embedding store
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    /// Create a store with room for `capacity` terms.
    ///
    /// Vector storage is only reserved when `capacity * dimension` fits in
    /// `usize`.
    pub fn with_capacity(dimension: usize, capacity: usize) -> Self {
        Self {
            dictionary: HashMap::with_capacity(capacity),
            terms: Vec::with_capacity(capacity),
            data: Vec::with_capacity(capacity.checked_mul(dimension).unwrap_or(0)),
            frequencies: Vec::with_capacity(capacity),
            dimension,
        }
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get number of stored terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Fail unless `vector` has the store's dimension
    pub fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(SpaceError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Add a term and its vector, returning the term's index.
    ///
    /// An existing term keeps its original vector (first write wins).
    pub fn insert(&mut self, term: impl Into<String>, vector: &[f32]) -> Result<usize> {
        self.check_dimension(vector)?;
        let term = term.into();
        if let Some(&index) = self.dictionary.get(&term) {
            return Ok(index);
        }

        let index = self.terms.len();
        self.dictionary.insert(term.clone(), index);
        self.terms.push(term);
        self.data.extend_from_slice(vector);
        self.frequencies.push(FREQUENCY_UNSET);
        Ok(index)
    }

    /// Get the vector for a term
    pub fn get(&self, term: &str) -> Option<&[f32]> {
        self.index_of(term).map(|i| self.vector(i))
    }

    /// Check if a term exists
    pub fn contains(&self, term: &str) -> bool {
        self.dictionary.contains_key(term)
    }

    /// Check that every whitespace-separated word of `phrase` exists
    pub fn contains_all(&self, phrase: &str) -> bool {
        phrase.split_whitespace().all(|word| self.contains(word))
    }

    /// Get the index of a term
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.dictionary.get(term).copied()
    }

    /// 1-based position of a term in insertion order
    pub fn rank(&self, term: &str) -> Option<usize> {
        self.index_of(term).map(|i| i + 1)
    }

    /// Term at `index`
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn term(&self, index: usize) -> &str {
        &self.terms[index]
    }

    /// Vector at `index`
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn vector(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Set a term's frequency; returns false if the term is absent
    pub fn set_frequency(&mut self, term: &str, count: i64) -> bool {
        match self.index_of(term) {
            Some(i) => {
                self.frequencies[i] = count;
                true
            }
            None => false,
        }
    }

    /// Frequency of a term: `None` if absent, `FREQUENCY_UNSET` if never set
    pub fn frequency(&self, term: &str) -> Option<i64> {
        self.index_of(term).map(|i| self.frequencies[i])
    }

    /// Frequency at `index`
    pub fn frequency_at(&self, index: usize) -> i64 {
        self.frequencies[index]
    }

    /// Keep only the terms in `keep`
    pub fn filter_to(&mut self, keep: &HashSet<String>) {
        self.retain(|term| keep.contains(term));
    }

    /// Keep only the terms matching `predicate`, renumbering the survivors
    /// contiguously in their original order.
    pub fn retain<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&str) -> bool,
    {
        let kept: Vec<usize> = (0..self.len())
            .filter(|&i| predicate(self.terms[i].as_str()))
            .collect();
        if kept.len() == self.len() {
            return;
        }

        let mut rebuilt = Self::with_capacity(self.dimension, kept.len());
        let terms = std::mem::take(&mut self.terms);
        for (old, term) in terms.into_iter().enumerate() {
            if kept.binary_search(&old).is_err() {
                continue;
            }
            let index = rebuilt.terms.len();
            rebuilt.data.extend_from_slice(self.vector(old));
            rebuilt.frequencies.push(self.frequencies[old]);
            rebuilt.dictionary.insert(term.clone(), index);
            rebuilt.terms.push(term);
        }
        *self = rebuilt;
    }

    /// Normalize every vector to unit length; zero vectors are left unchanged
    pub fn normalize_all(&mut self) {
        for v in self.vectors_mut() {
            normalize_vector(v);
        }
    }

    /// Mutable per-term vector slices in index order
    pub(crate) fn vectors_mut(&mut self) -> Vec<&mut [f32]> {
        let dimension = self.dimension;
        if dimension == 0 {
            return (0..self.terms.len()).map(|_| <&mut [f32]>::default()).collect();
        }
        self.data.chunks_exact_mut(dimension).collect()
    }

    /// Terms in index order
    pub fn terms(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.terms.iter().map(String::as_str)
    }

    /// Vectors in index order
    pub fn vectors(&self) -> impl Iterator<Item = &[f32]> + Clone + '_ {
        (0..self.len()).map(move |i| self.vector(i))
    }

    /// `(term, vector)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> + Clone + '_ {
        self.terms().zip(self.vectors())
    }
}
