//! Wordspace - Embedding Vector Store
//!
//! Loads word embeddings into a flat in-memory store and answers similarity
//! queries (top-K, best match, analogies) by splitting the vocabulary across
//! a pool of scoped worker threads.

pub mod command;
pub mod error;
pub mod io;
pub mod metrics;
pub mod parallel;
pub mod persistence;
pub mod vector;

pub use command::QueryCommand;
pub use error::{Result, SpaceError};
pub use io::{load_embeddings, LoadOptions};
pub use metrics::Metrics;
pub use parallel::{ExecutorConfig, RangeExecutor};
pub use vector::{Analogy, EmbeddingStore, Neighbor, SimilarityEngine};
