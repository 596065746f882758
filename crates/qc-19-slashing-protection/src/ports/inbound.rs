//! Inbound port: what the validator client calls before signing.

use crate::error::ProtectionResult;
use async_trait::async_trait;
use shared_types::{DomainResponse, IndexedAttestation, PublicKey, SignedBeaconBlock};

/// Slashing protection as seen by the signer.
///
/// `Ok(())` means the message may be signed and has been recorded; any error
/// means it must not be signed.
#[async_trait]
pub trait Protector: Send + Sync {
    async fn is_slashable_attestation(
        &self,
        indexed_att: &IndexedAttestation,
        pubkey: PublicKey,
        domain: &DomainResponse,
    ) -> ProtectionResult<()>;

    async fn is_slashable_block(
        &self,
        block: &SignedBeaconBlock,
        pubkey: PublicKey,
        domain: &DomainResponse,
    ) -> ProtectionResult<()>;

    fn start(&self);

    fn stop(&self) -> ProtectionResult<()>;

    fn status(&self) -> ProtectionResult<()>;
}
