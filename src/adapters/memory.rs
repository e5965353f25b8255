use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Slot store kept in process memory. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(self, key: &str, data: &[u8]) -> Self {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), data.to_vec());
        }
        self
    }

    /// Number of `write_slot` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, key: &str) -> Option<Vec<u8>> {
        self.slots.lock().ok()?.get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    async fn read_slot(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot(key))
    }

    async fn write_slot(&self, key: &str, data: &[u8]) -> Result<()> {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), data.to_vec());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_slots() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        tokio_test::block_on(storage.write_slot("a", b"1")).unwrap();
        assert_eq!(tokio_test::block_on(other.read_slot("a")).unwrap(), Some(b"1".to_vec()));
        assert_eq!(other.write_count(), 1);
        assert_eq!(tokio_test::block_on(other.read_slot("b")).unwrap(), None);
    }
}
