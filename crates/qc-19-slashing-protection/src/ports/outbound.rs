//! Outbound ports: the optional remote protector and how to build one.

use crate::config::RemoteProtectorConfig;
use crate::error::RemoteError;
use async_trait::async_trait;
use shared_types::{DomainResponse, IndexedAttestation, PublicKey, SignedBeaconBlock};
use std::sync::Arc;
use tokio::sync::watch;

/// A remote authority's answer for one signing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteVerdict {
    Safe,
    Slashable,
}

/// Secondary slashing check hosted elsewhere (e.g. a slasher node).
#[async_trait]
pub trait RemoteProtector: Send + Sync {
    async fn check_attestation(
        &self,
        indexed_att: &IndexedAttestation,
        pubkey: &PublicKey,
        domain: &DomainResponse,
    ) -> Result<RemoteVerdict, RemoteError>;

    async fn check_block(
        &self,
        block: &SignedBeaconBlock,
        pubkey: &PublicKey,
        domain: &DomainResponse,
    ) -> Result<RemoteVerdict, RemoteError>;

    fn start(&self) {}

    fn stop(&self) -> Result<(), RemoteError> {
        Ok(())
    }

    fn status(&self) -> Result<(), RemoteError>;
}

/// Builds a remote protector for a configured endpoint.
///
/// `shutdown` flips to `true` when the owning service stops; a connector may
/// hand it to its client to tear down background work.
pub trait RemoteConnector: Send + Sync {
    fn connect(
        &self,
        config: &RemoteProtectorConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Arc<dyn RemoteProtector>, RemoteError>;
}
