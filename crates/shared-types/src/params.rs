//! # Protocol Parameters
//!
//! Chain constants the protection database is laid out against. Changing
//! either value changes the on-disk history layout.

use crate::entities::Epoch;

/// Sentinel epoch meaning "never".
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

/// Weak subjectivity period in epochs.
///
/// Bounds how much attesting history is retained per validator and is the
/// modulus of the circular history buffer.
pub const WEAK_SUBJECTIVITY_PERIOD: Epoch = 54_000;
