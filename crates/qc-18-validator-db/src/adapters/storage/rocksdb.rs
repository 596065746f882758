//! # RocksDB Storage Adapter
//!
//! Production RocksDB implementation of the `KeyValueStore` trait.
//!
//! ## Features
//!
//! - Atomic batch writes (WriteBatch)
//! - fsync on write for durability (on by default, the database guards
//!   against signing twice and must survive power loss)
//! - Exclusive process lock on the data directory

use crate::adapters::lock::DatabaseLock;
use crate::domain::errors::{DbError, KVStoreError};
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::PathBuf;

/// RocksDB configuration.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/validator-db"),
            write_buffer_size: 16 * 1024 * 1024, // 16MB
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_buffer_size: 1024 * 1024, // 1MB
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
    _lock: DatabaseLock,
}

impl RocksDbStore {
    /// Lock the data directory, then open or create the database in it.
    pub fn open(config: RocksDbConfig) -> Result<Self, DbError> {
        std::fs::create_dir_all(&config.path).map_err(|e| KVStoreError::OpenFailed {
            message: format!("cannot create {}: {}", config.path.display(), e),
        })?;
        let lock = DatabaseLock::acquire(&config.path).map_err(|e| DbError::Lock {
            message: e.to_string(),
        })?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);

        let db = DB::open(&opts, config.path.join("db")).map_err(|e| KVStoreError::OpenFailed {
            message: format!("Failed to open RocksDB: {}", e),
        })?;

        tracing::info!(path = %config.path.display(), "[qc-18] Opened validator database");

        Ok(Self {
            db,
            config,
            _lock: lock,
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| KVStoreError::IOError {
            message: format!("RocksDB get failed: {}", e),
        })
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();

        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    batch.put(&key, &value);
                }
                BatchOperation::Delete { key } => {
                    batch.delete(&key);
                }
            }
        }

        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB batch write failed: {}", e),
            })
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let mut results = Vec::new();

        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB scan failed: {}", e),
            })?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }
}
