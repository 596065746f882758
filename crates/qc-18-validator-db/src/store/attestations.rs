use super::marks::raise_mark;
use super::{Reader, ValidatorDb, WriteTx};
use crate::domain::buckets::Bucket;
use crate::domain::errors::DbResult;
use crate::domain::history::EncodedHistory;
use crate::ports::inbound::{AttestationHistoryApi, MarkKind};
use crate::ports::outbound::{KeyValueStore, LegacyRecordSerializer};
use shared_types::{Epoch, PublicKey};
use std::collections::{BTreeSet, HashMap};

/// Stored history for `pubkey`, or a fresh one if none was written yet.
pub(crate) fn read_history<R: Reader>(tx: &R, pubkey: &PublicKey) -> DbResult<EncodedHistory> {
    match tx.get(Bucket::ATTESTATION_HISTORY, pubkey.as_bytes())? {
        Some(bytes) => Ok(EncodedHistory::from_bytes(bytes)?),
        None => Ok(EncodedHistory::new(0)),
    }
}

pub(crate) fn write_history<KV: KeyValueStore>(
    tx: &mut WriteTx<'_, KV>,
    pubkey: &PublicKey,
    history: &EncodedHistory,
) {
    tx.put(
        Bucket::ATTESTATION_HISTORY,
        pubkey.as_bytes(),
        history.as_bytes(),
    );
}

impl<KV: KeyValueStore, LS: LegacyRecordSerializer> AttestationHistoryApi for ValidatorDb<KV, LS> {
    fn attestation_histories(
        &self,
        pubkeys: &[PublicKey],
    ) -> DbResult<HashMap<PublicKey, EncodedHistory>> {
        self.view(|tx| {
            pubkeys
                .iter()
                .map(|pubkey| Ok((*pubkey, read_history(tx, pubkey)?)))
                .collect()
        })
    }

    fn save_attestation_histories(
        &self,
        histories: &HashMap<PublicKey, EncodedHistory>,
    ) -> DbResult<()> {
        self.update(|tx| {
            for (pubkey, history) in histories {
                write_history(tx, pubkey, history);
            }
            Ok(())
        })
    }

    fn save_attestation_history(
        &self,
        pubkey: &PublicKey,
        history: &EncodedHistory,
    ) -> DbResult<()> {
        self.update(|tx| {
            write_history(tx, pubkey, history);
            Ok(())
        })
    }

    fn record_attestation(
        &self,
        pubkey: &PublicKey,
        history: &EncodedHistory,
        source: Epoch,
        target: Epoch,
    ) -> DbResult<()> {
        self.update(|tx| {
            write_history(tx, pubkey, history);
            raise_mark(tx, MarkKind::Source, pubkey, source)?;
            raise_mark(tx, MarkKind::Target, pubkey, target)?;
            Ok(())
        })
    }

    fn attested_public_keys(&self) -> DbResult<BTreeSet<PublicKey>> {
        self.view(|tx| tx.public_keys(Bucket::ATTESTATION_HISTORY))
    }
}
