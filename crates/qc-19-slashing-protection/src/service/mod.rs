//! # Slashing Protection Service
//!
//! Process-scoped facade over the validator database.
//!
//! ## Request flow
//!
//! 1. Take the per-key lock (requests for different keys run in parallel).
//! 2. Evaluate the local rules against the cached history.
//! 3. If a remote protector is configured, consult it (retrying while it is
//!    unavailable, cancelled when the service stops).
//! 4. Record the message and ratchet the high-water marks in one database
//!    transaction, then release the lock.
//!
//! Local protection is never skipped, whatever the remote says or does.


use crate::config::ProtectionConfig;
use crate::domain::{check_attestation, check_proposal, AttestationCheck, ProposalCheck};
use crate::error::{ProtectionError, ProtectionResult, RemoteError, SlashingDetected, SlashingKind};
use crate::metrics;
use crate::ports::inbound::Protector;
use crate::ports::outbound::{RemoteConnector, RemoteProtector, RemoteVerdict};
use async_trait::async_trait;
use parking_lot::RwLock;
use qc_18_validator_db::{
    AttestationHistoryApi, EncodedHistory, HighWaterMarkApi, HistoryData, MarkKind,
    ProposalHistoryApi,
};
use shared_types::{DomainResponse, IndexedAttestation, PublicKey, SignedBeaconBlock};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// How signing requests are protected.
#[derive(Clone)]
pub enum Protection {
    LocalOnly,
    /// Local rules first, then the remote protector.
    LocalWithRemote(Arc<dyn RemoteProtector>),
}

impl std::fmt::Debug for Protection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protection::LocalOnly => f.write_str("LocalOnly"),
            Protection::LocalWithRemote(_) => f.write_str("LocalWithRemote"),
        }
    }
}

/// Retry policy for an unavailable remote protector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RetryPolicy {
    count: u32,
    delay: Duration,
}

/// Per-key state, guarded by that key's lock.
#[derive(Default)]
struct KeyState {
    /// Decoded history, loaded on first use.
    history: Option<EncodedHistory>,
}

/// Database capabilities the service needs.
pub trait ProtectionDb:
    AttestationHistoryApi + HighWaterMarkApi + ProposalHistoryApi + Send + Sync
{
}

impl<T> ProtectionDb for T where
    T: AttestationHistoryApi + HighWaterMarkApi + ProposalHistoryApi + Send + Sync
{
}

/// The slashing protection service.
pub struct ProtectionService<DB: ProtectionDb> {
    db: Arc<DB>,
    protection: Protection,
    retry: RetryPolicy,
    keys: RwLock<HashMap<PublicKey, Arc<Mutex<KeyState>>>>,
    shutdown: watch::Sender<bool>,
}

impl<DB: ProtectionDb> ProtectionService<DB> {
    /// Build the service, connecting a remote protector if one is configured.
    pub fn new(
        config: ProtectionConfig,
        db: Arc<DB>,
        connector: &dyn RemoteConnector,
    ) -> ProtectionResult<Self> {
        config.validate()?;
        let (shutdown, shutdown_rx) = watch::channel(false);

        let (protection, retry) = match &config.remote {
            Some(remote_config) => {
                let remote = connector.connect(remote_config, shutdown_rx).map_err(|e| {
                    tracing::error!(
                        endpoint = %remote_config.endpoint,
                        error = %e,
                        "[qc-19] Failed to connect remote protector"
                    );
                    e
                })?;
                tracing::info!(
                    endpoint = %remote_config.endpoint,
                    "[qc-19] Remote slashing protection enabled"
                );
                (
                    Protection::LocalWithRemote(remote),
                    RetryPolicy {
                        count: remote_config.retry_count,
                        delay: remote_config.retry_delay,
                    },
                )
            }
            None => (Protection::LocalOnly, RetryPolicy::none()),
        };

        Ok(Self {
            db,
            protection,
            retry,
            keys: RwLock::new(HashMap::new()),
            shutdown,
        })
    }

    /// Local-only protection over `db`.
    pub fn local_only(db: Arc<DB>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            db,
            protection: Protection::LocalOnly,
            retry: RetryPolicy::none(),
            keys: RwLock::new(HashMap::new()),
            shutdown,
        }
    }

    pub fn protection(&self) -> &Protection {
        &self.protection
    }

    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }

    fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn ensure_running(&self) -> ProtectionResult<()> {
        if self.is_stopped() {
            return Err(ProtectionError::Stopped);
        }
        Ok(())
    }

    fn key_lock(&self, pubkey: &PublicKey) -> Arc<Mutex<KeyState>> {
        if let Some(lock) = self.keys.read().get(pubkey) {
            return Arc::clone(lock);
        }
        Arc::clone(self.keys.write().entry(*pubkey).or_default())
    }

    fn refuse(&self, kind: SlashingKind, pubkey: PublicKey) -> ProtectionError {
        metrics::record_refusal(kind.as_str());
        SlashingDetected { kind, pubkey }.into()
    }

    /// Run a remote check, retrying while unavailable and aborting on stop.
    async fn consult_remote<F, Fut>(&self, pubkey: PublicKey, mut call: F) -> ProtectionResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RemoteVerdict, RemoteError>>,
    {
        let mut shutdown = self.shutdown.subscribe();
        let mut attempt = 0;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => Err(RemoteError::Cancelled),
                outcome = call() => outcome,
            };

            match outcome {
                Ok(RemoteVerdict::Safe) => return Ok(()),
                Ok(RemoteVerdict::Slashable) => {
                    tracing::warn!(%pubkey, "[qc-19] Remote protector refused signing");
                    return Err(self.refuse(SlashingKind::RemoteRefusal, pubkey));
                }
                Err(RemoteError::Unavailable) if attempt < self.retry.count => {
                    attempt += 1;
                    metrics::record_remote_retry();
                    tracing::warn!(
                        %pubkey,
                        attempt,
                        max = self.retry.count,
                        "[qc-19] Remote protector unavailable, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = stopped(&mut shutdown) => {
                            return Err(RemoteError::Cancelled.into());
                        }
                        _ = tokio::time::sleep(self.retry.delay) => {}
                    }
                }
                Err(e) => {
                    metrics::record_remote_failure(remote_failure_label(&e));
                    tracing::error!(%pubkey, error = %e, "[qc-19] Remote protector call failed");
                    return Err(e.into());
                }
            }
        }
    }
}

impl RetryPolicy {
    fn none() -> Self {
        Self {
            count: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Resolves once the service is stopped.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stopped| *stopped).await.is_err() {
        // Sender gone: the service itself is gone, nothing left to cancel.
        std::future::pending::<()>().await;
    }
}

fn remote_failure_label(err: &RemoteError) -> &'static str {
    match err {
        RemoteError::Unavailable => "unavailable",
        RemoteError::Cancelled => "cancelled",
        RemoteError::Rejected(_) => "rejected",
        RemoteError::Connect(_) => "connect",
    }
}

#[async_trait]
impl<DB: ProtectionDb> Protector for ProtectionService<DB> {
    async fn is_slashable_attestation(
        &self,
        indexed_att: &IndexedAttestation,
        pubkey: PublicKey,
        domain: &DomainResponse,
    ) -> ProtectionResult<()> {
        self.ensure_running()?;
        let data = &indexed_att.data;
        let (source, target) = (data.source.epoch, data.target.epoch);
        let signing_root = data.signing_root(&domain.signature_domain);

        let lock = self.key_lock(&pubkey);
        let mut state = lock.lock().await;

        let loaded = match state.history.take() {
            Some(history) => history,
            None => self
                .db
                .attestation_histories(&[pubkey])?
                .remove(&pubkey)
                .unwrap_or_else(|| EncodedHistory::new(0)),
        };
        let history = state.history.insert(loaded);
        let highest_target = self.db.highest_signed_epoch(MarkKind::Target, &pubkey)?;

        match check_attestation(history, highest_target, source, target, &signing_root) {
            Ok(AttestationCheck::Safe) => {}
            Ok(AttestationCheck::Repeat) => {
                tracing::debug!(%pubkey, source, target, "[qc-19] Repeat of recorded attestation");
                metrics::record_signing_allowed("attestation");
                return Ok(());
            }
            Err(kind) => {
                tracing::warn!(
                    %pubkey,
                    source,
                    target,
                    %kind,
                    "[qc-19] Refusing slashable attestation"
                );
                return Err(self.refuse(kind, pubkey));
            }
        }

        if let Protection::LocalWithRemote(remote) = &self.protection {
            self.consult_remote(pubkey, || remote.check_attestation(indexed_att, &pubkey, domain))
                .await?;
        }

        history.mark_attested_since_latest_written(target, &HistoryData::new(source, signing_root));
        if let Err(e) = self.db.record_attestation(&pubkey, history, source, target) {
            tracing::error!(%pubkey, error = %e, "[qc-19] Failed to record attestation");
            // The cached copy now runs ahead of storage; reload next time.
            state.history = None;
            return Err(e.into());
        }

        metrics::record_signing_allowed("attestation");
        Ok(())
    }

    async fn is_slashable_block(
        &self,
        block: &SignedBeaconBlock,
        pubkey: PublicKey,
        domain: &DomainResponse,
    ) -> ProtectionResult<()> {
        self.ensure_running()?;
        let slot = block.header.slot;
        let signing_root = block.header.signing_root(&domain.signature_domain);

        let lock = self.key_lock(&pubkey);
        let _state = lock.lock().await;

        let recorded = self.db.proposal_history_for_slot(&pubkey, slot)?;
        match check_proposal(recorded.as_ref(), &signing_root) {
            Ok(ProposalCheck::Safe) => {}
            Ok(ProposalCheck::Repeat) => {
                tracing::debug!(%pubkey, slot, "[qc-19] Repeat of recorded proposal");
                metrics::record_signing_allowed("block");
                return Ok(());
            }
            Err(kind) => {
                tracing::warn!(%pubkey, slot, %kind, "[qc-19] Refusing slashable block");
                return Err(self.refuse(kind, pubkey));
            }
        }

        if let Protection::LocalWithRemote(remote) = &self.protection {
            self.consult_remote(pubkey, || remote.check_block(block, &pubkey, domain))
                .await?;
        }

        self.db
            .save_proposal_history_for_slot(&pubkey, slot, &signing_root)
            .map_err(|e| {
                tracing::error!(%pubkey, slot, error = %e, "[qc-19] Failed to record proposal");
                e
            })?;

        metrics::record_signing_allowed("block");
        Ok(())
    }

    fn start(&self) {
        tracing::info!(protection = ?self.protection, "[qc-19] Starting slashing protection service");
        if let Protection::LocalWithRemote(remote) = &self.protection {
            remote.start();
        }
    }

    fn stop(&self) -> ProtectionResult<()> {
        self.shutdown.send_replace(true);
        tracing::info!("[qc-19] Stopping slashing protection service");
        if let Protection::LocalWithRemote(remote) = &self.protection {
            remote.stop()?;
        }
        Ok(())
    }

    fn status(&self) -> ProtectionResult<()> {
        self.ensure_running()?;
        if let Protection::LocalWithRemote(remote) = &self.protection {
            remote.status()?;
        }
        Ok(())
    }
}
