//! # Inbound Ports (Driving Ports)
//!
//! The database API used by the protection service and by tooling that needs
//! to act over every known validator.

use crate::domain::errors::DbResult;
use crate::domain::history::EncodedHistory;
use crate::domain::legacy::LegacyAttestationHistory;
use shared_types::{Epoch, PublicKey, Root, Slot};
use std::collections::{BTreeSet, HashMap};

/// Which high-water mark to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Source,
    Target,
}

/// Encoded attesting history per validator.
pub trait AttestationHistoryApi {
    /// Histories for `pubkeys`; keys with no record get `EncodedHistory::new(0)`.
    fn attestation_histories(
        &self,
        pubkeys: &[PublicKey],
    ) -> DbResult<HashMap<PublicKey, EncodedHistory>>;

    /// Batched write inside one transaction.
    fn save_attestation_histories(
        &self,
        histories: &HashMap<PublicKey, EncodedHistory>,
    ) -> DbResult<()>;

    fn save_attestation_history(&self, pubkey: &PublicKey, history: &EncodedHistory)
        -> DbResult<()>;

    /// Store `history` and ratchet both high-water marks to `source` and
    /// `target`, all in one transaction.
    fn record_attestation(
        &self,
        pubkey: &PublicKey,
        history: &EncodedHistory,
        source: Epoch,
        target: Epoch,
    ) -> DbResult<()>;

    /// Every key with a stored encoded history.
    fn attested_public_keys(&self) -> DbResult<BTreeSet<PublicKey>>;
}

/// Monotonic per-key source/target marks.
pub trait HighWaterMarkApi {
    /// Stored mark, or 0 if none.
    fn highest_signed_epoch(&self, kind: MarkKind, pubkey: &PublicKey) -> DbResult<Epoch>;

    /// Store `epoch` only if it is strictly greater than the stored mark.
    /// Returns whether the mark moved.
    fn save_highest_signed_epoch(
        &self,
        kind: MarkKind,
        pubkey: &PublicKey,
        epoch: Epoch,
    ) -> DbResult<bool>;
}

/// Signed block proposals per validator and slot.
pub trait ProposalHistoryApi {
    fn proposal_history_for_slot(&self, pubkey: &PublicKey, slot: Slot) -> DbResult<Option<Root>>;

    /// Record a proposal and ratchet the lowest/highest signed slots.
    fn save_proposal_history_for_slot(
        &self,
        pubkey: &PublicKey,
        slot: Slot,
        signing_root: &Root,
    ) -> DbResult<()>;

    fn lowest_signed_proposal(&self, pubkey: &PublicKey) -> DbResult<Option<Slot>>;

    fn highest_signed_proposal(&self, pubkey: &PublicKey) -> DbResult<Option<Slot>>;

    /// Every key with at least one recorded proposal.
    fn proposed_public_keys(&self) -> DbResult<BTreeSet<PublicKey>>;
}

/// Legacy history access and the one-shot migration.
pub trait MigrationApi {
    fn attestation_history_for_pubkeys(
        &self,
        pubkeys: &[PublicKey],
    ) -> DbResult<HashMap<PublicKey, LegacyAttestationHistory>>;

    fn save_legacy_attestation_history(
        &self,
        pubkey: &PublicKey,
        record: &LegacyAttestationHistory,
    ) -> DbResult<()>;

    /// True iff the legacy bucket holds data and no export marker.
    fn should_migrate(&self) -> DbResult<bool>;

    /// Convert every legacy record and write the export marker.
    fn migrate(&self) -> DbResult<()>;
}
