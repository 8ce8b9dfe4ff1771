//! IO Module
//!
//! Readers and writers for word2vec models and their vocabulary files.

mod loader;
mod vocab;
mod word2vec;

pub use loader::{load_embeddings, LoadOptions};
pub use vocab::{apply_frequencies, read_vocab, words_above_min_frequency};
pub use word2vec::{load_word2vec, read_word2vec, save_word2vec, write_word2vec};
