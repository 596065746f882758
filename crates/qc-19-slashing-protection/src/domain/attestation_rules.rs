//! Local attestation slashing rules.
//!
//! Evaluated against a validator's encoded history and highest signed target.
//! The checks run in a fixed order and the first failing rule decides the
//! refusal kind.

use crate::error::SlashingKind;
use qc_18_validator_db::{EncodedHistory, HistoryData};
use shared_types::{Epoch, Root, WEAK_SUBJECTIVITY_PERIOD};

/// Outcome of a passing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationCheck {
    /// Never signed for this target; sign and record.
    Safe,
    /// Identical vote already recorded; safe to sign again, nothing to write.
    Repeat,
}

/// Decide whether `(source, target, signing_root)` may be signed.
pub fn check_attestation(
    history: &EncodedHistory,
    highest_signed_target: Epoch,
    source: Epoch,
    target: Epoch,
    signing_root: &Root,
) -> Result<AttestationCheck, SlashingKind> {
    if source > target {
        return Err(SlashingKind::SourceAfterTarget);
    }

    // Migrated histories may run ahead of the stored mark.
    let highest = highest_signed_target.max(history.latest_epoch_written());
    if highest >= WEAK_SUBJECTIVITY_PERIOD && target <= highest - WEAK_SUBJECTIVITY_PERIOD {
        return Err(SlashingKind::TargetOutsideHistory);
    }

    if let Some(existing) = history.attested_target(target) {
        if existing.signing_root == *signing_root {
            return Ok(AttestationCheck::Repeat);
        }
        return Err(SlashingKind::DoubleVote);
    }

    // Only targets inside the retained window can hold a vote, so both scans
    // stay within one period regardless of the request's epochs.
    let oldest = history.oldest_retained_target();
    let latest = history.latest_epoch_written();

    // New vote surrounds a recorded (s', t') when source < s' and t' < target.
    if (source.saturating_add(1).max(oldest)..target.min(latest.saturating_add(1)))
        .filter_map(|t| history.attested_target(t))
        .any(|HistoryData { source: s, .. }| s > source)
    {
        return Err(SlashingKind::SurroundingVote);
    }

    // A recorded (s', t') surrounds the new vote when s' < source and target < t'.
    if (target.saturating_add(1).max(oldest)..=latest)
        .filter_map(|t| history.attested_target(t))
        .any(|HistoryData { source: s, .. }| s < source)
    {
        return Err(SlashingKind::SurroundedVote);
    }

    Ok(AttestationCheck::Safe)
}
