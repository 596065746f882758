//! Error types for the slashing protection subsystem
//!
//! A refusal to sign is reported as `ProtectionError::Slashable`. Every other
//! variant is a fault; callers must treat all errors as "do not sign".

use crate::config::ConfigError;
use qc_18_validator_db::DbError;
use shared_types::PublicKey;
use thiserror::Error;

/// Why a signing request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlashingKind {
    /// Same target epoch, different signing root
    DoubleVote,
    /// The new vote surrounds a recorded one
    SurroundingVote,
    /// A recorded vote surrounds the new one
    SurroundedVote,
    /// Source epoch greater than target epoch
    SourceAfterTarget,
    /// Target too old for the retained history to prove it safe
    TargetOutsideHistory,
    /// Same slot, different block
    DoubleProposal,
    /// The remote protector judged the request slashable
    RemoteRefusal,
}

impl SlashingKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlashingKind::DoubleVote => "double_vote",
            SlashingKind::SurroundingVote => "surrounding_vote",
            SlashingKind::SurroundedVote => "surrounded_vote",
            SlashingKind::SourceAfterTarget => "source_after_target",
            SlashingKind::TargetOutsideHistory => "target_outside_history",
            SlashingKind::DoubleProposal => "double_proposal",
            SlashingKind::RemoteRefusal => "remote_refusal",
        }
    }
}

impl std::fmt::Display for SlashingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signing request refused as slashable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("slashable {kind} for validator {pubkey}")]
pub struct SlashingDetected {
    pub kind: SlashingKind,
    pub pubkey: PublicKey,
}

/// Remote protector failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Transient: the remote could not be reached. Retried.
    #[error("remote protector unavailable")]
    Unavailable,

    /// The service stopped while the call was in flight.
    #[error("remote protector call cancelled")]
    Cancelled,

    /// The remote answered with an error.
    #[error("remote protector rejected request: {0}")]
    Rejected(String),

    /// The remote protector could not be constructed.
    #[error("remote protector connection failed: {0}")]
    Connect(String),
}

/// Slashing protection errors
#[derive(Debug, Error)]
pub enum ProtectionError {
    /// Refusal: the request must not be signed
    #[error(transparent)]
    Slashable(#[from] SlashingDetected),

    /// Protection database fault
    #[error("protection database error: {0}")]
    Database(#[from] DbError),

    /// Remote protector fault
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The service has been stopped
    #[error("slashing protection service stopped")]
    Stopped,
}

impl ProtectionError {
    /// The refusal kind, if this is a slashing refusal.
    pub fn slashing_kind(&self) -> Option<SlashingKind> {
        match self {
            ProtectionError::Slashable(detected) => Some(detected.kind),
            _ => None,
        }
    }
}

/// Result type for protection operations
pub type ProtectionResult<T> = Result<T, ProtectionError>;
