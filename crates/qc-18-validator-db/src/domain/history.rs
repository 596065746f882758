//! # Encoded Attesting History
//!
//! Compact per-validator attesting history stored as one byte blob.
//!
//! ## Layout
//!
//! ```text
//! [0..8)              latest_epoch_written (u64 little-endian)
//! [8 + i*40 .. +8)    entry i: source epoch (u64 little-endian)
//! [8 + i*40 + 8 .. +32) entry i: signing root
//! ```
//!
//! Entry `i` holds the vote for the most recent target epoch `e` with
//! `e % WEAK_SUBJECTIVITY_PERIOD == i`. The buffer grows as targets are
//! written and never shrinks. A source of `FAR_FUTURE_EPOCH` marks an empty
//! slot.
//!
//! ## Invariant
//!
//! `len == HEADER_SIZE + k * HISTORY_ENTRY_SIZE`. It is checked once in
//! `EncodedHistory::from_bytes`; every other method keeps it, so offset math
//! on a constructed value is always in bounds.

use crate::domain::errors::CodecError;
use shared_types::{Epoch, Root, FAR_FUTURE_EPOCH, WEAK_SUBJECTIVITY_PERIOD};
use std::fmt;

/// Width of an encoded epoch.
const UINT64_SIZE: usize = 8;

/// Header: the latest epoch written.
pub const HEADER_SIZE: usize = UINT64_SIZE;

/// Width of a signing root.
pub const SIGNING_ROOT_SIZE: usize = 32;

/// One entry: source epoch followed by signing root.
pub const HISTORY_ENTRY_SIZE: usize = UINT64_SIZE + SIGNING_ROOT_SIZE;

/// What a validator signed for one target epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryData {
    pub source: Epoch,
    pub signing_root: Root,
}

impl HistoryData {
    pub fn new(source: Epoch, signing_root: Root) -> Self {
        Self {
            source,
            signing_root,
        }
    }

    /// The sentinel written to slots with no recorded attestation.
    pub const fn empty() -> Self {
        Self {
            source: FAR_FUTURE_EPOCH,
            signing_root: [0u8; SIGNING_ROOT_SIZE],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source == FAR_FUTURE_EPOCH
    }
}

/// A validated attesting-history buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedHistory(Vec<u8>);

impl EncodedHistory {
    /// Allocate a history covering `target % WEAK_SUBJECTIVITY_PERIOD`, every
    /// covered slot set to the empty sentinel and the header set to 0.
    pub fn new(target: Epoch) -> Self {
        let relative_target = slot_index(target);
        let mut history = Self(vec![0u8; HEADER_SIZE]);
        history.grow_to(relative_target);
        history
    }

    /// Validate raw bytes read from storage.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CodecError> {
        check_layout(&bytes)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a history has at least its header.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of physical entries currently allocated.
    pub fn entry_count(&self) -> usize {
        (self.0.len() - HEADER_SIZE) / HISTORY_ENTRY_SIZE
    }

    pub fn latest_epoch_written(&self) -> Epoch {
        read_u64(&self.0[..HEADER_SIZE])
    }

    pub fn set_latest_epoch_written(&mut self, epoch: Epoch) {
        self.0[..HEADER_SIZE].copy_from_slice(&epoch.to_le_bytes());
    }

    /// Raw physical slot for `target`.
    ///
    /// Returns `None` if the buffer does not reach that slot yet. The slot
    /// may belong to an older target sharing the same index; use
    /// [`EncodedHistory::attested_target`] when that matters.
    pub fn target_data(&self, target: Epoch) -> Option<HistoryData> {
        let cursor = cursor(target);
        if self.0.len() < cursor + HISTORY_ENTRY_SIZE {
            return None;
        }
        let source = read_u64(&self.0[cursor..cursor + UINT64_SIZE]);
        let mut signing_root = [0u8; SIGNING_ROOT_SIZE];
        signing_root.copy_from_slice(&self.0[cursor + UINT64_SIZE..cursor + HISTORY_ENTRY_SIZE]);
        Some(HistoryData {
            source,
            signing_root,
        })
    }

    /// Write the physical slot for `target`, growing the buffer with zero
    /// bytes if it does not reach that slot yet.
    pub fn set_target_data(&mut self, target: Epoch, data: &HistoryData) {
        let cursor = cursor(target);
        if self.0.len() < cursor + HISTORY_ENTRY_SIZE {
            self.0.resize(cursor + HISTORY_ENTRY_SIZE, 0);
        }
        self.0[cursor..cursor + UINT64_SIZE].copy_from_slice(&data.source.to_le_bytes());
        self.0[cursor + UINT64_SIZE..cursor + HISTORY_ENTRY_SIZE]
            .copy_from_slice(&data.signing_root);
    }

    /// Record an attestation for `incoming_target`.
    ///
    /// When the target moves past `latest_epoch_written`, every slot strictly
    /// between the old and new value (at most one period of them) is reset to
    /// the sentinel before the header advances, so slots left over from an
    /// earlier period are never read as current votes.
    pub fn mark_attested_since_latest_written(
        &mut self,
        incoming_target: Epoch,
        incoming: &HistoryData,
    ) {
        let latest = self.latest_epoch_written();
        if incoming_target > latest {
            let clear_end = incoming_target
                .min(latest.saturating_add(WEAK_SUBJECTIVITY_PERIOD).saturating_add(1));
            let empty = HistoryData::empty();
            for epoch in latest + 1..clear_end {
                self.set_target_data(epoch, &empty);
            }
            self.set_latest_epoch_written(incoming_target);
        }
        self.set_target_data(incoming_target, incoming);
    }

    /// Recorded vote for `target`, if `target` is still inside the retained
    /// window `(latest - period, latest]` and its slot is not empty.
    pub fn attested_target(&self, target: Epoch) -> Option<HistoryData> {
        if !self.retains(target) {
            return None;
        }
        self.target_data(target).filter(|data| !data.is_empty())
    }

    /// Whether `target` falls inside the retained window.
    pub fn retains(&self, target: Epoch) -> bool {
        let latest = self.latest_epoch_written();
        target <= latest && latest - target < WEAK_SUBJECTIVITY_PERIOD
    }

    /// Lowest target epoch still inside the retained window.
    pub fn oldest_retained_target(&self) -> Epoch {
        let latest = self.latest_epoch_written();
        latest.saturating_sub(WEAK_SUBJECTIVITY_PERIOD - 1)
    }

    /// Extend the buffer with sentinel entries up to and including `index`.
    fn grow_to(&mut self, index: usize) {
        let empty = HistoryData::empty();
        for i in self.entry_count()..=index {
            self.set_target_data(i as Epoch, &empty);
        }
    }
}

impl fmt::Debug for EncodedHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedHistory")
            .field("latest_epoch_written", &self.latest_epoch_written())
            .field("entries", &self.entry_count())
            .finish()
    }
}

impl TryFrom<Vec<u8>> for EncodedHistory {
    type Error = CodecError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for EncodedHistory {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Check the size invariant of a raw history buffer.
pub fn check_layout(bytes: &[u8]) -> Result<(), CodecError> {
    if bytes.len() < HEADER_SIZE || (bytes.len() - HEADER_SIZE) % HISTORY_ENTRY_SIZE != 0 {
        return Err(CodecError::MalformedEncoding {
            len: bytes.len(),
            header: HEADER_SIZE,
            entry: HISTORY_ENTRY_SIZE,
        });
    }
    Ok(())
}

fn slot_index(target: Epoch) -> usize {
    (target % WEAK_SUBJECTIVITY_PERIOD) as usize
}

fn cursor(target: Epoch) -> usize {
    HEADER_SIZE + slot_index(target) * HISTORY_ENTRY_SIZE
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; UINT64_SIZE];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}
