//! Vector Module
//!
//! Embedding storage, bounded ranking and parallel similarity search.

mod embedding_store;
mod engine;
mod ranking;
mod similarity;

pub use embedding_store::{EmbeddingStore, FREQUENCY_UNSET};
pub use engine::{Analogy, Neighbor, SimilarityEngine};
pub use ranking::{argmax, top_k_scores, Ranked, RankedList};
pub use similarity::{cosine_similarity, dot_product, normalize_vector, normalized, VectorOps};
