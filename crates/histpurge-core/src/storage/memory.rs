//! In-memory storage backend

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::StateStorage;
use crate::error::{Error, Result};
use crate::state::BlacklistState;

/// Volatile storage, used for `backend = "memory"` and in tests
///
/// Can be switched offline to simulate an unavailable backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: RwLock<Option<BlacklistState>>,
    offline: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage that already holds a record
    pub fn with_state(state: BlacklistState) -> Self {
        Self {
            record: RwLock::new(Some(state)),
            ..Self::default()
        }
    }

    /// Make every subsequent read and write fail
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::storage("memory storage is offline"))
        } else {
            Ok(())
        }
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self) -> Result<Option<BlacklistState>> {
        self.check_online()?;
        Ok(self.record.read().clone())
    }

    fn write(&self, state: &BlacklistState) -> Result<()> {
        self.check_online()?;
        *self.record.write() = Some(state.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ListMode;

    #[test]
    fn test_empty_reads_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let storage = MemoryStorage::new();
        let state = BlacklistState::with_patterns(ListMode::Whitelist, ["a"]);
        storage.write(&state).unwrap();
        assert_eq!(storage.read().unwrap(), Some(state));
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_offline() {
        let storage = MemoryStorage::new();
        storage.set_offline(true);
        assert!(storage.read().is_err());
        assert!(storage.write(&BlacklistState::new()).is_err());
        assert_eq!(storage.write_count(), 0);

        storage.set_offline(false);
        assert!(storage.read().is_ok());
    }
}
