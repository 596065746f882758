use crate::domain::errors::DbError;
use crate::domain::legacy::LegacyAttestationHistory;
use crate::ports::outbound::LegacyRecordSerializer;

/// Legacy history serializer using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeLegacySerializer;

impl LegacyRecordSerializer for BincodeLegacySerializer {
    fn serialize(&self, record: &LegacyAttestationHistory) -> Result<Vec<u8>, DbError> {
        Ok(bincode::serialize(record)?)
    }

    fn deserialize(&self, data: &[u8]) -> Result<LegacyAttestationHistory, DbError> {
        Ok(bincode::deserialize(data)?)
    }
}
