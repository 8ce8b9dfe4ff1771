//! word2vec Binary Format
//!
//! Layout:
//! - Header: ASCII `"<vocab_size> <dimension>\n"`
//! - Records: term bytes, a space, then `dimension` little-endian f32s
//!
//! Some producers end every record with a newline and some do not; the
//! reader accepts both.

use bytes::{Buf, BufMut, BytesMut};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SpaceError};
use crate::vector::EmbeddingStore;

const BYTES_PER_F32: usize = 4;

/// Upper bound on floats reserved up front; the store grows past it as
/// records actually arrive.
const PREALLOC_FLOATS: usize = 1 << 24;
const PREALLOC_TERMS: usize = 1 << 20;

fn parse_header(line: &[u8]) -> Result<(usize, usize)> {
    let text = String::from_utf8_lossy(line);
    let mut fields = text.split_whitespace();
    let parse = |field: Option<&str>, name: &str| -> Result<usize> {
        field.and_then(|f| f.parse().ok()).ok_or_else(|| {
            SpaceError::InvalidFormat(format!(
                "Malformed header {:?}: bad {}",
                text.trim_end(),
                name
            ))
        })
    };
    let vocab_size = parse(fields.next(), "vocabulary size")?;
    let dimension = parse(fields.next(), "dimension")?;
    Ok((vocab_size, dimension))
}

fn header_overflow(count: usize, dimension: usize) -> SpaceError {
    SpaceError::InvalidFormat(format!(
        "Header size {} x {} is out of range",
        count, dimension
    ))
}

/// Read a word2vec binary stream into a new store.
///
/// At most `max_words` records are read when given. Records with an empty
/// term still count toward that limit but are not inserted.
pub fn read_word2vec<R: BufRead>(
    reader: &mut R,
    max_words: Option<usize>,
) -> Result<EmbeddingStore> {
    let mut header = Vec::new();
    reader.read_until(b'\n', &mut header)?;
    let (vocab_size, dimension) = parse_header(&header)?;
    let count = max_words.map_or(vocab_size, |m| m.min(vocab_size));

    let record_bytes = dimension
        .checked_mul(BYTES_PER_F32)
        .ok_or_else(|| header_overflow(count, dimension))?;
    count
        .checked_mul(dimension)
        .ok_or_else(|| header_overflow(count, dimension))?;

    let prealloc = count
        .min(PREALLOC_TERMS)
        .min(PREALLOC_FLOATS / dimension.max(1));
    let mut store = EmbeddingStore::with_capacity(dimension, prealloc);
    let mut term_buf = Vec::new();
    let mut vector_buf = Vec::new();
    let mut vector = Vec::new();

    for record in 0..count {
        term_buf.clear();
        reader.read_until(b' ', &mut term_buf)?;
        if term_buf.pop() != Some(b' ') {
            return Err(SpaceError::InvalidFormat(format!(
                "Unexpected end of input in record {} of {}",
                record, count
            )));
        }

        // Skip the newline left over from the previous record, if any.
        let start = term_buf
            .iter()
            .position(|&b| b != b'\n')
            .unwrap_or(term_buf.len());
        let term = String::from_utf8_lossy(&term_buf[start..]).into_owned();

        // Buffer only what the input holds, whatever the header claims.
        vector_buf.clear();
        reader
            .by_ref()
            .take(record_bytes as u64)
            .read_to_end(&mut vector_buf)?;
        if vector_buf.len() != record_bytes {
            return Err(SpaceError::InvalidFormat(format!(
                "Vector of record {} truncated: {} of {} bytes",
                record,
                vector_buf.len(),
                record_bytes
            )));
        }
        let mut raw = &vector_buf[..];
        vector.clear();
        vector.extend((0..dimension).map(|_| raw.get_f32_le()));

        if term.is_empty() {
            debug!("Not including zero-length term from record {}", record);
            continue;
        }
        store.insert(term, &vector)?;
    }

    info!(
        "Read {} word vectors with {} dimensions",
        store.len(),
        dimension
    );
    Ok(store)
}

/// Open and read a word2vec binary file
pub fn load_word2vec(path: impl AsRef<Path>, max_words: Option<usize>) -> Result<EmbeddingStore> {
    let path = path.as_ref();
    info!("Reading word vectors from {}", path.display());
    let mut reader = BufReader::new(File::open(path)?);
    read_word2vec(&mut reader, max_words)
}

/// Write `store` in word2vec binary format, newline after every record.
///
/// Terms containing a space, or starting with a newline, cannot be
/// represented and are rejected.
pub fn write_word2vec<W: Write>(store: &EmbeddingStore, writer: &mut W) -> Result<()> {
    writer.write_all(format!("{} {}\n", store.len(), store.dimension()).as_bytes())?;

    let mut buf = BytesMut::with_capacity(store.dimension() * BYTES_PER_F32 + 64);
    for (term, vector) in store.iter() {
        if term.contains(' ') || term.starts_with('\n') {
            return Err(SpaceError::InvalidFormat(format!(
                "Term {:?} cannot be written in word2vec format",
                term
            )));
        }
        buf.clear();
        buf.put_slice(term.as_bytes());
        buf.put_u8(b' ');
        for &x in vector {
            buf.put_f32_le(x);
        }
        buf.put_u8(b'\n');
        writer.write_all(&buf)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `store` to a word2vec binary file
pub fn save_word2vec(store: &EmbeddingStore, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_word2vec(store, &mut writer)
}
