//! # Buckets
//!
//! Named key spaces inside the flat key-value store. Every key is the bucket
//! name, a `/` separator, then the record key.

use shared_types::{PublicKey, Slot, PUBLIC_KEY_LENGTH};

/// A named key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bucket(&'static str);

impl Bucket {
    /// Encoded attesting history per public key.
    pub const ATTESTATION_HISTORY: Bucket = Bucket("attestation-history-v2");
    /// Legacy sparse attesting history per public key, plus the export marker.
    pub const LEGACY_ATTESTATION_HISTORY: Bucket = Bucket("attestation-history");
    /// Highest signed source epoch per public key.
    pub const HIGHEST_SIGNED_SOURCE: Bucket = Bucket("highest-signed-source-epoch");
    /// Highest signed target epoch per public key.
    pub const HIGHEST_SIGNED_TARGET: Bucket = Bucket("highest-signed-target-epoch");
    /// Proposal signing roots keyed by public key and slot.
    pub const PROPOSAL_HISTORY: Bucket = Bucket("proposal-history");
    /// Lowest signed proposal slot per public key.
    pub const LOWEST_SIGNED_PROPOSAL: Bucket = Bucket("lowest-signed-proposal");
    /// Highest signed proposal slot per public key.
    pub const HIGHEST_SIGNED_PROPOSAL: Bucket = Bucket("highest-signed-proposal");

    pub const fn name(&self) -> &'static str {
        self.0
    }

    /// Prefix shared by every key in this bucket.
    pub fn prefix(&self) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(self.0.len() + 1);
        prefix.extend_from_slice(self.0.as_bytes());
        prefix.push(b'/');
        prefix
    }

    /// Full store key for `key` inside this bucket.
    pub fn key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = self.prefix();
        full.extend_from_slice(key);
        full
    }

    /// Strip this bucket's prefix from a full store key.
    pub fn strip<'a>(&self, full: &'a [u8]) -> Option<&'a [u8]> {
        full.strip_prefix(self.0.as_bytes())?.strip_prefix(b"/")
    }
}

/// Record key under which the legacy bucket stores its export marker.
pub const ATTESTATION_EXPORTED_KEY: &[u8] = b"attestations-exported";

/// Proposal history record key: public key followed by big-endian slot, so
/// one validator's proposals sort by slot.
pub fn proposal_key(pubkey: &PublicKey, slot: Slot) -> Vec<u8> {
    let mut key = Vec::with_capacity(PUBLIC_KEY_LENGTH + 8);
    key.extend_from_slice(pubkey.as_bytes());
    key.extend_from_slice(&slot.to_be_bytes());
    key
}
