//! # Integration Tests
//!
//! Validator database and protection service together, on RocksDB.

pub mod migration_restart;
pub mod signing_flows;
