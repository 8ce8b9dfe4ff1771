//! Persistence Module
//!
//! Snapshot files for saving and restoring an embedding store.

mod snapshot;

pub use snapshot::{decode_snapshot, encode_snapshot, load_snapshot, save_snapshot};
