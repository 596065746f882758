//! # Legacy Attesting History
//!
//! The pre-compaction record format: a sparse target -> source map plus the
//! latest epoch written. No signing roots were kept.

use serde::{Deserialize, Serialize};
use shared_types::Epoch;
use std::collections::BTreeMap;

/// Placeholder root recorded for votes migrated from the legacy format.
///
/// A one-byte `0x01` right-padded with zeros. It never matches a real signing
/// root, so any re-sign of a migrated target is refused as a double vote.
pub const MIGRATED_SIGNING_ROOT: [u8; 32] = {
    let mut root = [0u8; 32];
    root[0] = 1;
    root
};

/// One validator's legacy attesting history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegacyAttestationHistory {
    pub latest_epoch_written: Epoch,
    /// Ordered so replays are deterministic.
    pub target_to_source: BTreeMap<Epoch, Epoch>,
}

impl LegacyAttestationHistory {
    pub fn new(latest_epoch_written: Epoch) -> Self {
        Self {
            latest_epoch_written,
            target_to_source: BTreeMap::new(),
        }
    }

    /// Record a vote, advancing `latest_epoch_written` when needed.
    pub fn insert(&mut self, target: Epoch, source: Epoch) {
        self.target_to_source.insert(target, source);
        if target > self.latest_epoch_written {
            self.latest_epoch_written = target;
        }
    }
}
