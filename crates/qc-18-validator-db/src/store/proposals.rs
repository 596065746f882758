use super::{decode_u64, Reader, ValidatorDb};
use crate::domain::buckets::{proposal_key, Bucket};
use crate::domain::errors::{DbError, DbResult};
use crate::ports::inbound::ProposalHistoryApi;
use crate::ports::outbound::{KeyValueStore, LegacyRecordSerializer};
use shared_types::{PublicKey, Root, Slot, PUBLIC_KEY_LENGTH};
use std::collections::BTreeSet;

fn read_slot<R: Reader>(tx: &R, bucket: Bucket, pubkey: &PublicKey) -> DbResult<Option<Slot>> {
    tx.get(bucket, pubkey.as_bytes())?
        .map(|bytes| decode_u64(bucket, &bytes))
        .transpose()
}

impl<KV: KeyValueStore, LS: LegacyRecordSerializer> ProposalHistoryApi for ValidatorDb<KV, LS> {
    fn proposal_history_for_slot(&self, pubkey: &PublicKey, slot: Slot) -> DbResult<Option<Root>> {
        self.view(|tx| {
            let Some(bytes) = tx.get(Bucket::PROPOSAL_HISTORY, &proposal_key(pubkey, slot))? else {
                return Ok(None);
            };
            let root: Root = bytes.as_slice().try_into().map_err(|_| DbError::CorruptRecord {
                bucket: Bucket::PROPOSAL_HISTORY.name(),
                expected: 32,
                found: bytes.len(),
            })?;
            Ok(Some(root))
        })
    }

    fn save_proposal_history_for_slot(
        &self,
        pubkey: &PublicKey,
        slot: Slot,
        signing_root: &Root,
    ) -> DbResult<()> {
        self.update(|tx| {
            tx.put(
                Bucket::PROPOSAL_HISTORY,
                &proposal_key(pubkey, slot),
                signing_root.to_vec(),
            );
            if read_slot(&*tx, Bucket::LOWEST_SIGNED_PROPOSAL, pubkey)?.map_or(true, |low| slot < low) {
                tx.put(Bucket::LOWEST_SIGNED_PROPOSAL, pubkey.as_bytes(), slot.to_be_bytes());
            }
            if read_slot(&*tx, Bucket::HIGHEST_SIGNED_PROPOSAL, pubkey)?.map_or(true, |high| slot > high) {
                tx.put(Bucket::HIGHEST_SIGNED_PROPOSAL, pubkey.as_bytes(), slot.to_be_bytes());
            }
            Ok(())
        })
    }

    fn lowest_signed_proposal(&self, pubkey: &PublicKey) -> DbResult<Option<Slot>> {
        self.view(|tx| read_slot(tx, Bucket::LOWEST_SIGNED_PROPOSAL, pubkey))
    }

    fn highest_signed_proposal(&self, pubkey: &PublicKey) -> DbResult<Option<Slot>> {
        self.view(|tx| read_slot(tx, Bucket::HIGHEST_SIGNED_PROPOSAL, pubkey))
    }

    fn proposed_public_keys(&self) -> DbResult<BTreeSet<PublicKey>> {
        self.view(|tx| {
            Ok(tx
                .scan(Bucket::PROPOSAL_HISTORY)?
                .into_iter()
                .filter_map(|(key, _)| PublicKey::from_slice(key.get(..PUBLIC_KEY_LENGTH)?))
                .collect())
        })
    }
}
