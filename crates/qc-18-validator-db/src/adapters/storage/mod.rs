//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait.

mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb;

pub use memory::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::{RocksDbConfig, RocksDbStore};
