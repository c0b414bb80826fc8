// 📸 Snapshot - the full {accounts, transfers} state as one unit
//
// The persistence bridge only ever sees whole snapshots: one load at startup,
// one save after every mutation. No schema versioning.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::entities::{Account, Transfer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub accounts: Vec<Account>,
    pub transfers: Vec<Transfer>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.transfers.is_empty()
    }
}

/// Key-value blob store the ledger state is persisted through.
///
/// `load` returning `Ok(None)` means nothing was ever saved. Errors from
/// `load` are treated by the session as a corrupt store (start empty);
/// errors from `save` are logged and the in-memory state stands.
pub trait SnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// In-process store. Keeps the last saved snapshot and a save counter.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<Snapshot>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        MemoryStore {
            saved: Some(snapshot),
            saves: 0,
        }
    }

    pub fn last_saved(&self) -> Option<&Snapshot> {
        self.saved.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.saved = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_starts_absent() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_memory_store_keeps_last_save() {
        let mut store = MemoryStore::new();
        store.save(&Snapshot::default()).unwrap();
        store.save(&Snapshot::default()).unwrap();

        assert_eq!(store.save_count(), 2);
        assert!(store.load().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_json_keys() {
        let json = serde_json::to_value(Snapshot::default()).unwrap();
        assert_eq!(json, serde_json::json!({"accounts": [], "transfers": []}));
    }
}
