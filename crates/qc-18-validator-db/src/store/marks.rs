use super::{decode_u64, Reader, ValidatorDb, WriteTx};
use crate::domain::buckets::Bucket;
use crate::domain::errors::DbResult;
use crate::ports::inbound::{HighWaterMarkApi, MarkKind};
use crate::ports::outbound::{KeyValueStore, LegacyRecordSerializer};
use shared_types::{Epoch, PublicKey};

fn bucket(kind: MarkKind) -> Bucket {
    match kind {
        MarkKind::Source => Bucket::HIGHEST_SIGNED_SOURCE,
        MarkKind::Target => Bucket::HIGHEST_SIGNED_TARGET,
    }
}

pub(crate) fn read_mark<R: Reader>(tx: &R, kind: MarkKind, pubkey: &PublicKey) -> DbResult<Epoch> {
    let bucket = bucket(kind);
    match tx.get(bucket, pubkey.as_bytes())? {
        Some(bytes) => decode_u64(bucket, &bytes),
        None => Ok(0),
    }
}

/// Ratchet the mark inside an open transaction. Returns whether it moved.
pub(crate) fn raise_mark<KV: KeyValueStore>(
    tx: &mut WriteTx<'_, KV>,
    kind: MarkKind,
    pubkey: &PublicKey,
    epoch: Epoch,
) -> DbResult<bool> {
    if epoch <= read_mark(&*tx, kind, pubkey)? {
        return Ok(false);
    }
    tx.put(bucket(kind), pubkey.as_bytes(), epoch.to_be_bytes());
    Ok(true)
}

impl<KV: KeyValueStore, LS: LegacyRecordSerializer> HighWaterMarkApi for ValidatorDb<KV, LS> {
    fn highest_signed_epoch(&self, kind: MarkKind, pubkey: &PublicKey) -> DbResult<Epoch> {
        self.view(|tx| read_mark(tx, kind, pubkey))
    }

    fn save_highest_signed_epoch(
        &self,
        kind: MarkKind,
        pubkey: &PublicKey,
        epoch: Epoch,
    ) -> DbResult<bool> {
        self.update(|tx| raise_mark(tx, kind, pubkey, epoch))
    }
}
