//! # Core Domain Entities
//!
//! Protocol primitives consumed by the validator client.
//!
//! ## Clusters
//!
//! - **Identity**: `PublicKey`, `Root`
//! - **Time**: `Epoch`, `Slot`
//! - **Attesting**: `Checkpoint`, `AttestationData`, `IndexedAttestation`
//! - **Proposing**: `BeaconBlockHeader`, `SignedBeaconBlock`
//! - **Signing**: `DomainResponse`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte root (signing root, block root, domain).
pub type Root = [u8; 32];

/// Length of a compressed BLS12-381 public key.
pub const PUBLIC_KEY_LENGTH: usize = 48;

/// A validator's compressed BLS12-381 public key.
///
/// Used as the storage key for every per-validator protection record.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey(#[serde_as(as = "Bytes")] pub [u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Build a key from a byte slice, returning `None` on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

// =============================================================================
// CLUSTER B: TIME
// =============================================================================

/// Epoch number.
pub type Epoch = u64;

/// Slot number.
pub type Slot = u64;

// =============================================================================
// CLUSTER C: ATTESTING
// =============================================================================

/// A finality checkpoint: an epoch and the block root at its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: Root,
}

/// The data a validator signs when attesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttestationData {
    pub slot: Slot,
    pub committee_index: u64,
    pub beacon_block_root: Root,
    /// The justified checkpoint the vote builds from.
    pub source: Checkpoint,
    /// The checkpoint the vote is for.
    pub target: Checkpoint,
}

impl AttestationData {
    /// Signing root of this data under `domain`.
    pub fn signing_root(&self, domain: &Root) -> Root {
        let mut hasher = Sha256::new();
        hasher.update(self.slot.to_le_bytes());
        hasher.update(self.committee_index.to_le_bytes());
        hasher.update(self.beacon_block_root);
        hasher.update(self.source.epoch.to_le_bytes());
        hasher.update(self.source.root);
        hasher.update(self.target.epoch.to_le_bytes());
        hasher.update(self.target.root);
        mix_in_domain(hasher.finalize().into(), domain)
    }
}

/// An attestation with explicit attesting validator indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IndexedAttestation {
    pub attesting_indices: Vec<u64>,
    pub data: AttestationData,
    pub signature: Vec<u8>,
}

// =============================================================================
// CLUSTER D: PROPOSING
// =============================================================================

/// Header of a proposed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub proposer_index: u64,
    pub parent_root: Root,
    pub state_root: Root,
    pub body_root: Root,
}

impl BeaconBlockHeader {
    /// Signing root of this header under `domain`.
    pub fn signing_root(&self, domain: &Root) -> Root {
        let mut hasher = Sha256::new();
        hasher.update(self.slot.to_le_bytes());
        hasher.update(self.proposer_index.to_le_bytes());
        hasher.update(self.parent_root);
        hasher.update(self.state_root);
        hasher.update(self.body_root);
        mix_in_domain(hasher.finalize().into(), domain)
    }
}

/// A block submitted for proposal signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SignedBeaconBlock {
    pub header: BeaconBlockHeader,
    pub signature: Vec<u8>,
}

// =============================================================================
// CLUSTER E: SIGNING
// =============================================================================

/// Signature domain returned by the beacon node for a signing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DomainResponse {
    pub signature_domain: Root,
}

fn mix_in_domain(object_root: Root, domain: &Root) -> Root {
    let mut hasher = Sha256::new();
    hasher.update(object_root);
    hasher.update(domain);
    hasher.finalize().into()
}
