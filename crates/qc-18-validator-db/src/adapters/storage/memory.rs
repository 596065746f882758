use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::BTreeMap;

/// In-memory key-value store for unit tests and ephemeral validators.
///
/// Ordered so prefix scans return keys in the same order as RocksDB.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        // Single owner behind the database lock, nothing can observe a half-applied batch.
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let results = self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(pairs: &[(&str, &str)]) -> InMemoryKVStore {
        let mut store = InMemoryKVStore::new();
        let ops = pairs
            .iter()
            .map(|(k, v)| BatchOperation::put(k.as_bytes(), v.as_bytes()))
            .collect();
        store.atomic_batch_write(ops).unwrap();
        store
    }

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = store_with(&[("key1", "value1"), ("key2", "value2")]);

        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"key3").unwrap(), None);

        store.atomic_batch_write(vec![BatchOperation::delete(b"key1")]).unwrap();
        assert_eq!(store.get(b"key1").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_in_memory_kv_batch_write() {
        let mut store = store_with(&[("c", "old")]);

        let ops = vec![
            BatchOperation::put(b"a", b"1"),
            BatchOperation::put(b"b", b"2"),
            BatchOperation::delete(b"c"),
        ];
        store.atomic_batch_write(ops).unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"c").unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_prefix_scan_is_ordered() {
        let store = store_with(&[
            ("block:2", "data2"),
            ("block:1", "data1"),
            ("blocks", "other"),
            ("height:1", "hash1"),
        ]);

        let blocks = store.prefix_scan(b"block:").unwrap();
        assert_eq!(
            blocks,
            vec![
                (b"block:1".to_vec(), b"data1".to_vec()),
                (b"block:2".to_vec(), b"data2".to_vec()),
            ]
        );
    }
}
