//! Vocabulary Files
//!
//! Whitespace-delimited `<term> <count> ...` lines as written next to a
//! word2vec model, sorted by descending count. Only the first two fields are
//! read.

use hashbrown::HashMap;
use std::io::BufRead;
use tracing::warn;

use crate::error::{Result, SpaceError};
use crate::vector::EmbeddingStore;

/// Parse one line; blank lines yield `None`
fn parse_line(line: &str, line_no: usize) -> Result<Option<(&str, i64)>> {
    let mut fields = line.split_whitespace();
    let Some(term) = fields.next() else {
        return Ok(None);
    };
    let count = fields
        .next()
        .ok_or_else(|| SpaceError::InvalidFormat(format!("Line {}: missing count", line_no)))?;
    let count = count.parse().map_err(|_| {
        SpaceError::InvalidFormat(format!("Line {}: invalid count {:?}", line_no, count))
    })?;
    Ok(Some((term, count)))
}

/// Read term counts, stopping after `limit` entries when given
pub fn read_vocab<R: BufRead>(reader: R, limit: Option<usize>) -> Result<HashMap<String, i64>> {
    let mut counts = HashMap::new();
    for (i, line) in reader.lines().enumerate() {
        if limit.is_some_and(|l| counts.len() >= l) {
            break;
        }
        let line = line?;
        if let Some((term, count)) = parse_line(&line, i + 1)? {
            counts.insert(term.to_string(), count);
        }
    }
    Ok(counts)
}

/// Number of leading entries whose count is at least `min_frequency`.
///
/// Returns `None` when no entry falls below the minimum, meaning every word
/// qualifies.
pub fn words_above_min_frequency<R: BufRead>(
    reader: R,
    min_frequency: i64,
) -> Result<Option<usize>> {
    let mut qualifying = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line, i + 1)? {
            Some((_, count)) if count < min_frequency => return Ok(Some(qualifying)),
            Some(_) => qualifying += 1,
            None => {}
        }
    }
    warn!(
        "No words below minimum frequency {}; reading all words",
        min_frequency
    );
    Ok(None)
}

/// Annotate `store` with counts; returns how many stored terms were matched
pub fn apply_frequencies(store: &mut EmbeddingStore, counts: &HashMap<String, i64>) -> usize {
    counts
        .iter()
        .filter(|&(term, &count)| store.set_frequency(term, count))
        .count()
}
