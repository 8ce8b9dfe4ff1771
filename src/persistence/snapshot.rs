//! Store Snapshots
//!
//! Binary dump of an [`EmbeddingStore`] including frequencies.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Result, SpaceError};
use crate::vector::EmbeddingStore;

/// Snapshot file format (all integers little-endian):
/// - Magic: 4 bytes "WSPS"
/// - Version: 1 byte
/// - Dimension: 4 bytes
/// - Entry count: 4 bytes
/// - Entries: [term_len (4) + term + frequency (8) + dimension * f32]*

const SNAPSHOT_MAGIC: &[u8] = b"WSPS";
const SNAPSHOT_VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1 + 4 + 4;

fn too_large(what: &str, value: usize) -> SpaceError {
    SpaceError::InvalidFormat(format!("{} {} does not fit in a snapshot", what, value))
}

fn truncated(what: &str) -> SpaceError {
    SpaceError::InvalidFormat(format!("Snapshot truncated while reading {}", what))
}

/// Serialize a store
pub fn encode_snapshot(store: &EmbeddingStore) -> Result<Bytes> {
    let dimension = store.dimension();
    let dim32 = u32::try_from(dimension).map_err(|_| too_large("dimension", dimension))?;
    let count32 = u32::try_from(store.len()).map_err(|_| too_large("entry count", store.len()))?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + store.len() * (16 + dimension * 4));
    buf.put_slice(SNAPSHOT_MAGIC);
    buf.put_u8(SNAPSHOT_VERSION);
    buf.put_u32_le(dim32);
    buf.put_u32_le(count32);

    for (index, (term, vector)) in store.iter().enumerate() {
        let len = u32::try_from(term.len()).map_err(|_| too_large("term length", term.len()))?;
        buf.put_u32_le(len);
        buf.put_slice(term.as_bytes());
        buf.put_i64_le(store.frequency_at(index));
        for &x in vector {
            buf.put_f32_le(x);
        }
    }

    Ok(buf.freeze())
}

/// Rebuild a store from [`encode_snapshot`] output
pub fn decode_snapshot(mut data: &[u8]) -> Result<EmbeddingStore> {
    if data.remaining() < HEADER_SIZE {
        return Err(truncated("header"));
    }
    if &data[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(SpaceError::InvalidFormat("Invalid snapshot magic".to_string()));
    }
    data.advance(SNAPSHOT_MAGIC.len());

    let version = data.get_u8();
    if version != SNAPSHOT_VERSION {
        return Err(SpaceError::InvalidFormat(format!(
            "Unsupported snapshot version: {}",
            version
        )));
    }

    let dimension = data.get_u32_le() as usize;
    let count = data.get_u32_le() as usize;

    // Smallest possible entry: empty term, frequency, vector.
    let row_bytes = dimension
        .checked_mul(4)
        .ok_or_else(|| truncated("entries"))?;
    let min_entry = row_bytes
        .checked_add(4 + 8)
        .ok_or_else(|| truncated("entries"))?;
    if count > 0 && data.remaining() / min_entry < count {
        return Err(truncated("entries"));
    }

    let mut store = EmbeddingStore::new(dimension);
    let mut vector = Vec::new();

    for _ in 0..count {
        if data.remaining() < 4 {
            return Err(truncated("term length"));
        }
        let term_len = data.get_u32_le() as usize;
        if data.remaining() < term_len.saturating_add(8 + row_bytes) {
            return Err(truncated("entry"));
        }
        let term = String::from_utf8(data[..term_len].to_vec())
            .map_err(|e| SpaceError::InvalidFormat(format!("Term is not UTF-8: {}", e)))?;
        data.advance(term_len);

        let frequency = data.get_i64_le();
        vector.clear();
        vector.extend((0..dimension).map(|_| data.get_f32_le()));

        if store.contains(&term) {
            return Err(SpaceError::InvalidFormat(format!(
                "Duplicate term {:?} in snapshot",
                term
            )));
        }
        store.insert(term.as_str(), &vector)?;
        store.set_frequency(&term, frequency);
    }

    if data.has_remaining() {
        return Err(SpaceError::InvalidFormat(format!(
            "{} trailing bytes after snapshot",
            data.remaining()
        )));
    }
    Ok(store)
}

/// Write a snapshot file
pub fn save_snapshot(store: &EmbeddingStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, encode_snapshot(store)?)?;
    info!("Saved snapshot of {} terms to {}", store.len(), path.display());
    Ok(())
}

/// Read a snapshot file
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<EmbeddingStore> {
    let path = path.as_ref();
    let store = decode_snapshot(&fs::read(path)?)?;
    info!("Loaded snapshot of {} terms from {}", store.len(), path.display());
    Ok(store)
}
