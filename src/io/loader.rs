//! Embedding Loader
//!
//! Combines a word2vec binary file with an optional vocabulary file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

use super::vocab::{apply_frequencies, read_vocab, words_above_min_frequency};
use super::word2vec::load_word2vec;
use crate::error::Result;
use crate::vector::EmbeddingStore;

/// Loading options
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Maximum number of records to read (None = all)
    pub max_words: Option<usize>,
    /// Stop at the first vocabulary entry counted below this (needs a vocab file)
    pub min_frequency: Option<i64>,
}

impl LoadOptions {
    pub fn with_max_words(mut self, max: usize) -> Self {
        self.max_words = Some(max);
        self
    }

    pub fn with_min_frequency(mut self, min: i64) -> Self {
        self.min_frequency = Some(min);
        self
    }
}

/// Load embeddings, optionally capped and annotated by a vocabulary file.
///
/// With `min_frequency` set, only the leading words of the vocabulary whose
/// count reaches the minimum are read. Frequencies are attached whenever a
/// vocabulary file is given.
pub fn load_embeddings(
    vectors: impl AsRef<Path>,
    vocab: Option<&Path>,
    options: &LoadOptions,
) -> Result<EmbeddingStore> {
    let mut max_words = options.max_words;

    if let Some(min) = options.min_frequency {
        match vocab {
            Some(path) => {
                let reader = BufReader::new(File::open(path)?);
                if let Some(cap) = words_above_min_frequency(reader, min)? {
                    info!("{} words have frequency of at least {}", cap, min);
                    max_words = Some(max_words.map_or(cap, |m| m.min(cap)));
                }
            }
            None => warn!("Minimum frequency {} ignored without a vocabulary file", min),
        }
    }

    let mut store = load_word2vec(vectors, max_words)?;

    if let Some(path) = vocab {
        let counts = read_vocab(BufReader::new(File::open(path)?), None)?;
        let matched = apply_frequencies(&mut store, &counts);
        info!(
            "Annotated {} of {} terms with frequencies from {}",
            matched,
            store.len(),
            path.display()
        );
    }

    Ok(store)
}
