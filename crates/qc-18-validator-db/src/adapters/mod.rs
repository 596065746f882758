//! # Adapters Module
//!
//! - `storage`: `KeyValueStore` backends (in-memory, RocksDB)
//! - `serializer`: legacy record encoding
//! - `lock`: data directory process lock

#[cfg(feature = "locking")]
pub mod lock;
pub mod serializer;
pub mod storage;

#[cfg(feature = "locking")]
pub use lock::{DatabaseLock, LockError};
pub use serializer::BincodeLegacySerializer;
pub use storage::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use storage::{RocksDbConfig, RocksDbStore};
