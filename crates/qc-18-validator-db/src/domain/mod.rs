//! Domain module for the validator protection database
//!
//! ## Core Modules
//! - history: encoded attesting history (the circular buffer codec)
//! - legacy: pre-compaction history records
//! - buckets: key spaces inside the key-value store
//! - errors: codec, storage and database errors

pub mod buckets;
pub mod errors;
pub mod history;
pub mod legacy;

pub use buckets::{proposal_key, Bucket, ATTESTATION_EXPORTED_KEY};
pub use errors::{CodecError, DbError, DbResult, KVStoreError};
pub use history::{
    check_layout, EncodedHistory, HistoryData, HEADER_SIZE, HISTORY_ENTRY_SIZE, SIGNING_ROOT_SIZE,
};
pub use legacy::{LegacyAttestationHistory, MIGRATED_SIGNING_ROOT};
