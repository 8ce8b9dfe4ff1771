//! Similarity Engine
//!
//! Exhaustive dot-product search over an [`EmbeddingStore`], fanned out
//! across a [`RangeExecutor`].
//!
//! Scores are raw dot products. For cosine similarity, normalize the store
//! once (see [`SimilarityEngine::normalize_all`]) before querying.

use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use super::embedding_store::EmbeddingStore;
use super::ranking::{argmax, top_k_scores, Ranked};
use super::similarity::{
    cosine_similarity, dot_product, normalize_vector, normalized, VectorOps,
};
use crate::error::Result;
use crate::metrics::{Metrics, Operation};
use crate::parallel::{ExecutorConfig, RangeExecutor};

/// A scored term returned by a query
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// The matching term
    pub term: String,
    /// Its index in the store
    pub index: usize,
    /// Dot product with the query
    pub score: f64,
}

/// Result of analogy arithmetic
#[derive(Debug, Clone, PartialEq)]
pub struct Analogy {
    /// Sum of positive vectors minus sum of negative vectors (not normalized)
    pub vector: Vec<f32>,
    /// Input terms absent from the store, skipped
    pub missing: Vec<String>,
}

/// Similarity search over an owned embedding store
#[derive(Debug)]
pub struct SimilarityEngine {
    store: EmbeddingStore,
    executor: RangeExecutor,
    metrics: Arc<Metrics>,
}

impl SimilarityEngine {
    /// Create an engine over `store`
    pub fn new(store: EmbeddingStore, executor: RangeExecutor) -> Self {
        Self {
            store,
            executor,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Create an engine, validating the executor configuration
    pub fn with_config(store: EmbeddingStore, config: ExecutorConfig) -> Result<Self> {
        Ok(Self::new(store, RangeExecutor::new(config)?))
    }

    /// Get the underlying store
    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Give the store back
    pub fn into_store(self) -> EmbeddingStore {
        self.store
    }

    /// Get the executor
    pub fn executor(&self) -> &RangeExecutor {
        &self.executor
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    fn neighbor(&self, ranked: Ranked) -> Neighbor {
        Neighbor {
            term: self.store.term(ranked.index).to_string(),
            index: ranked.index,
            score: ranked.score,
        }
    }

    fn scores(&self, query: &[f32]) -> Result<Vec<f64>> {
        self.store.check_dimension(query)?;
        let store = &self.store;
        let mut scores = vec![0.0f64; store.len()];
        self.executor.fill(&mut scores, |i| {
            f64::from(dot_product(store.vector(i), query))
        })?;
        Ok(scores)
    }

    /// Dot product of `query` with every stored vector, in index order
    pub fn score_all(&self, query: &[f32]) -> Result<Vec<f64>> {
        let start = Instant::now();
        let scores = self.scores(query)?;
        self.metrics.record(Operation::ScoreAll, start.elapsed());
        Ok(scores)
    }

    /// The `k` highest-scoring terms, best first.
    ///
    /// Equal scores keep index order. Returns fewer than `k` entries only
    /// when the store is smaller than `k`.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let start = Instant::now();
        self.store.check_dimension(query)?;
        if k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }

        let scores = self.scores(query)?;
        let ranked = top_k_scores(&scores, k);
        self.metrics.record(Operation::TopK, start.elapsed());

        Ok(ranked.into_iter().map(|r| self.neighbor(r)).collect())
    }

    /// The single highest-scoring term, `None` for an empty store
    pub fn best_match(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        let start = Instant::now();
        let scores = self.scores(query)?;
        let best = argmax(&scores).map(|r| self.neighbor(r));
        self.metrics.record(Operation::BestMatch, start.elapsed());
        Ok(best)
    }

    /// Top-K for a stored term's own vector; the term itself is included.
    pub fn similar_to_term(&self, term: &str, k: usize) -> Result<Option<Vec<Neighbor>>> {
        match self.store.get(term) {
            Some(vector) => self.top_k(vector, k).map(Some),
            None => Ok(None),
        }
    }

    /// Cosine similarity between two stored terms
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let va = self.store.get(a)?;
        let vb = self.store.get(b)?;
        Some(f64::from(cosine_similarity(va, vb)))
    }

    /// Add the vectors of `positive` and subtract those of `negative`.
    ///
    /// Terms missing from the store are skipped with a warning.
    pub fn analogy<P, N>(&self, positive: &[P], negative: &[N]) -> Analogy
    where
        P: AsRef<str>,
        N: AsRef<str>,
    {
        let mut vector = vec![0.0f32; self.store.dimension()];
        let mut missing = Vec::new();

        for term in positive.iter().map(|t| t.as_ref()) {
            match self.store.get(term) {
                Some(v) => vector.add_assign(v),
                None => {
                    warn!("Term {:?} not in dictionary; ignoring", term);
                    missing.push(term.to_string());
                }
            }
        }
        for term in negative.iter().map(|t| t.as_ref()) {
            match self.store.get(term) {
                Some(v) => vector.sub_assign(v),
                None => {
                    warn!("Term {:?} not in dictionary; ignoring", term);
                    missing.push(term.to_string());
                }
            }
        }

        Analogy { vector, missing }
    }

    /// Rank terms closest to the normalized analogy vector, leaving out the
    /// input terms themselves. Empty if none of the inputs are known.
    pub fn solve_analogy<P, N>(
        &self,
        positive: &[P],
        negative: &[N],
        k: usize,
    ) -> Result<Vec<Neighbor>>
    where
        P: AsRef<str>,
        N: AsRef<str>,
    {
        let analogy = self.analogy(positive, negative);
        if analogy.missing.len() == positive.len() + negative.len() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = positive
            .iter()
            .map(|t| t.as_ref())
            .chain(negative.iter().map(|t| t.as_ref()))
            .collect();
        let query = normalized(&analogy.vector);

        let mut ranked = self.top_k(&query, k.saturating_add(inputs.len()))?;
        ranked.retain(|n| !inputs.contains(&n.term.as_str()));
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Scale every stored vector to unit length, in parallel.
    ///
    /// Zero vectors are left unchanged, so this is idempotent.
    pub fn normalize_all(&mut self) -> Result<()> {
        let start = Instant::now();
        let mut rows = self.store.vectors_mut();
        self.executor
            .for_each_mut(&mut rows, |_, row| normalize_vector(row))?;
        self.metrics.record(Operation::Normalize, start.elapsed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpaceError;

    fn engine_with(workers: usize, entries: &[(&str, &[f32])]) -> SimilarityEngine {
        let dimension = entries.first().map(|(_, v)| v.len()).unwrap_or(2);
        let mut store = EmbeddingStore::new(dimension);
        for (term, vector) in entries {
            store.insert(*term, vector).unwrap();
        }
        SimilarityEngine::with_config(store, ExecutorConfig::default().with_workers(workers))
            .unwrap()
    }

    fn abc_engine() -> SimilarityEngine {
        engine_with(
            3,
            &[("a", &[1.0, 0.0]), ("b", &[0.0, 1.0]), ("c", &[1.0, 1.0])],
        )
    }

    /// Deterministic pseudo-random store for property checks
    fn random_engine(n: usize, dimension: usize, workers: usize) -> SimilarityEngine {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state % 2001) as f32 - 1000.0) / 1000.0
        };
        let mut store = EmbeddingStore::new(dimension);
        for i in 0..n {
            let v: Vec<f32> = (0..dimension).map(|_| next()).collect();
            store.insert(format!("t{}", i), &v).unwrap();
        }
        SimilarityEngine::with_config(store, ExecutorConfig::default().with_workers(workers))
            .unwrap()
    }

    #[test]
    fn test_analogy_scenario() {
        let engine = abc_engine();
        let analogy = engine.analogy(&["c"], &["a"]);
        assert_eq!(analogy.vector, vec![0.0, 1.0]);
        assert!(analogy.missing.is_empty());
    }

    #[test]
    fn test_best_match_scenario() {
        let engine = abc_engine();
        let best = engine.best_match(&[0.0, 1.0]).unwrap().unwrap();
        // "b" and "c" both score 1.0; the earlier index wins.
        assert_eq!(best.term, "b");
        assert_eq!(best.score, 1.0);
    }

    #[test]
    fn test_top_k_scenario() {
        let engine = abc_engine();
        let top = engine.top_k(&[1.0, 1.0], 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].term, "c");
        assert_eq!(top[0].score, 2.0);
        assert_eq!(top[1].term, "a");
        assert_eq!(top[1].score, 1.0);
    }

    #[test]
    fn test_score_all_in_index_order() {
        let engine = abc_engine();
        assert_eq!(engine.score_all(&[2.0, 3.0]).unwrap(), vec![2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_top_k_lengths() {
        let engine = abc_engine();
        assert!(engine.top_k(&[1.0, 1.0], 0).unwrap().is_empty());
        assert_eq!(engine.top_k(&[1.0, 1.0], 3).unwrap().len(), 3);
        assert_eq!(engine.top_k(&[1.0, 1.0], 100).unwrap().len(), 3);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let engine = abc_engine();
        assert!(matches!(
            engine.top_k(&[1.0, 0.0, 0.0], 2),
            Err(SpaceError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert!(matches!(
            engine.best_match(&[1.0]),
            Err(SpaceError::DimensionMismatch { .. })
        ));
        assert!(engine.score_all(&[]).is_err());
    }

    #[test]
    fn test_empty_store() {
        let engine = SimilarityEngine::new(EmbeddingStore::new(3), RangeExecutor::default());
        assert!(engine.top_k(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
        assert!(engine.best_match(&[1.0, 0.0, 0.0]).unwrap().is_none());
        assert!(engine.score_all(&[1.0, 0.0, 0.0]).unwrap().is_empty());
    }

    #[test]
    fn test_best_match_agrees_with_score_all_and_top_k() {
        for workers in [1, 3, 20] {
            let engine = random_engine(257, 8, workers);
            for q in 0..10 {
                let query = engine.store().vector(q * 13).to_vec();
                let scores = engine.score_all(&query).unwrap();
                let best = engine.best_match(&query).unwrap().unwrap();

                let max = scores.iter().cloned().fold(f64::MIN, f64::max);
                let first_max = scores.iter().position(|&s| s == max).unwrap();
                assert_eq!(best.index, first_max);

                for k in [1, 4, 50] {
                    let top = engine.top_k(&query, k).unwrap();
                    assert_eq!(top[0], best);
                }
            }
        }
    }

    #[test]
    fn test_top_k_consistent_with_full_sort() {
        let engine = random_engine(300, 5, 7);
        let query = [0.3, -0.2, 0.9, 0.0, 0.1];
        let scores = engine.score_all(&query).unwrap();

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap());

        let top = engine.top_k(&query, 25).unwrap();
        assert_eq!(top.len(), 25);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        let indices: Vec<usize> = top.iter().map(|n| n.index).collect();
        assert_eq!(indices, order[..25].to_vec());
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let query = [0.5, 0.5, -0.5, 0.25];
        let single = random_engine(123, 4, 1).top_k(&query, 10).unwrap();
        let many = random_engine(123, 4, 16).top_k(&query, 10).unwrap();
        assert_eq!(single, many);
    }

    #[test]
    fn test_analogy_skips_missing_terms() {
        let engine = abc_engine();
        let analogy = engine.analogy(&["c", "nope"], &["gone", "b"]);
        assert_eq!(analogy.vector, vec![1.0, 0.0]);
        assert_eq!(analogy.missing, vec!["nope".to_string(), "gone".to_string()]);
    }

    #[test]
    fn test_analogy_is_not_normalized() {
        let engine = abc_engine();
        let analogy = engine.analogy::<&str, &str>(&["c", "c"], &[]);
        assert_eq!(analogy.vector, vec![2.0, 2.0]);
    }

    #[test]
    fn test_solve_analogy_excludes_inputs() {
        let mut engine = engine_with(
            2,
            &[
                ("king", &[0.9, 0.8, 0.1]),
                ("man", &[0.9, 0.1, 0.1]),
                ("woman", &[0.1, 0.1, 0.9]),
                ("queen", &[0.1, 0.8, 0.9]),
                ("apple", &[0.5, -0.9, 0.0]),
            ],
        );
        engine.normalize_all().unwrap();

        let answer = engine
            .solve_analogy(&["king", "woman"], &["man"], 1)
            .unwrap();
        assert_eq!(answer.len(), 1);
        assert_eq!(answer[0].term, "queen");

        let none = engine.solve_analogy(&["x"], &["y"], 3).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_normalize_all_idempotent() {
        let mut engine = engine_with(
            4,
            &[("v", &[3.0, 4.0]), ("zero", &[0.0, 0.0]), ("w", &[-1.0, 1.0])],
        );
        engine.normalize_all().unwrap();
        let once: Vec<Vec<f32>> = engine.store().vectors().map(<[f32]>::to_vec).collect();
        engine.normalize_all().unwrap();
        let twice: Vec<Vec<f32>> = engine.store().vectors().map(<[f32]>::to_vec).collect();

        for (a, b) in once.iter().zip(&twice) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-6);
            }
        }
        assert_eq!(engine.store().get("zero"), Some(&[0.0, 0.0][..]));
        assert!((engine.store().get("v").unwrap().magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_similar_to_term_and_similarity() {
        let engine = abc_engine();
        let similar = engine.similar_to_term("a", 2).unwrap().unwrap();
        assert_eq!(similar[0].term, "a");
        assert_eq!(similar[1].term, "c");
        assert!(engine.similar_to_term("missing", 2).unwrap().is_none());

        let sim = engine.similarity("a", "c").unwrap();
        assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(engine.similarity("a", "missing").is_none());
    }

    #[test]
    fn test_queries_are_recorded() {
        let engine = abc_engine();
        engine.top_k(&[1.0, 0.0], 1).unwrap();
        engine.best_match(&[1.0, 0.0]).unwrap();
        assert_eq!(engine.metrics().summary_for(Operation::TopK).count, 1);
        assert_eq!(engine.metrics().summary_for(Operation::BestMatch).count, 1);
        assert_eq!(engine.metrics().summary_for(Operation::ScoreAll).count, 0);
    }
}
