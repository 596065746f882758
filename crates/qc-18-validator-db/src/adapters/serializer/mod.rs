//! Serializer Adapters
//!
//! Implementations of the `LegacyRecordSerializer` trait.

mod bincode;

pub use self::bincode::BincodeLegacySerializer;
