// 🔐 Session - the one owned ledger state of a running process
//
// Lifecycle:
//   Session::open(store)   load snapshot (absent/corrupt -> empty), audit balances
//   session.<mutation>()   apply to ledger, then hand the full snapshot to the store
//   session.close()        flush anything still unsaved, gives the store back
//
// There is no way to reach a ledger before `open` or after `close`: both are
// ownership transitions, so "use before init" cannot compile.
//
// Persistence is best-effort. A failed save is logged and the in-memory
// change stands. A session that never mutated never writes, so a failed load
// followed by read-only use leaves the stored snapshot alone.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::entities::{Account, AccountType, Recipient, Transfer, TransferDraft};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::ledger::{BalanceDrift, Ledger};
use crate::reporting::{monthly_volume_by_recipient, MonthlyVolumeReport};
use crate::snapshot::{Snapshot, SnapshotStore};

pub struct Session<S: SnapshotStore> {
    ledger: Ledger,
    store: S,
    failed_saves: usize,
    /// Set by every effective mutation, cleared by a successful save
    dirty: bool,
}

impl<S: SnapshotStore> Session<S> {
    /// Open a session with UUID identifiers
    pub fn open(store: S) -> Self {
        Session::open_with(store, UuidGenerator)
    }

    pub fn open_with(store: S, ids: impl IdGenerator + Send + 'static) -> Self {
        let snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!("no stored snapshot; starting empty");
                Snapshot::default()
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "stored snapshot unreadable; starting empty");
                Snapshot::default()
            }
        };

        let ledger = Ledger::from_snapshot(snapshot, ids);

        for drift in ledger.audit() {
            warn!(
                account_id = %drift.account_id,
                stored = drift.stored,
                replayed = drift.replayed,
                "stored balance disagrees with transfer history"
            );
        }

        info!(
            accounts = ledger.accounts().len(),
            transfers = ledger.transfers().len(),
            "session opened"
        );

        Session {
            ledger,
            store,
            failed_saves: 0,
            dirty: false,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Saves that failed since the session was opened
    pub fn failed_saves(&self) -> usize {
        self.failed_saves
    }

    // ========================================================================
    // MUTATIONS (each one persists on success)
    // ========================================================================

    pub fn add_account(&mut self, name: impl Into<String>, account_type: AccountType) -> Account {
        let account = self.ledger.add_account(name, account_type);
        self.persist();
        account
    }

    /// Returns false for unknown ids; nothing is persisted in that case
    pub fn update_account(&mut self, id: &str, name: impl Into<String>, account_type: AccountType) -> bool {
        let updated = self.ledger.update_account(id, name, account_type);
        if updated {
            self.persist();
        }
        updated
    }

    pub fn delete_account(&mut self, id: &str) -> Option<Account> {
        let removed = self.ledger.delete_account(id);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    pub fn apply_transfer(
        &mut self,
        source_account_id: &str,
        date: NaiveDate,
        recipients: Vec<Recipient>,
    ) -> Transfer {
        let transfer = self.ledger.apply_transfer(source_account_id, date, recipients);
        self.persist();
        transfer
    }

    /// Submit a distribute-transfer draft; zero-amount lines are dropped
    pub fn submit_draft(&mut self, draft: &TransferDraft) -> Transfer {
        self.apply_transfer(&draft.source_account_id, draft.date, draft.recipients())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn monthly_volume(&self) -> MonthlyVolumeReport {
        monthly_volume_by_recipient(self.ledger.transfers().as_slice(), self.ledger.accounts())
    }

    pub fn new_draft(&self, source_account_id: impl Into<String>, date: NaiveDate) -> TransferDraft {
        TransferDraft::new(self.ledger.accounts(), source_account_id, date)
    }

    pub fn audit(&self) -> Vec<BalanceDrift> {
        self.ledger.audit()
    }

    /// Whether some mutation has not reached the store yet
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Retry any unsaved changes and hand the store back
    pub fn close(mut self) -> S {
        if self.dirty {
            self.persist();
        }
        info!(
            failed_saves = self.failed_saves,
            unsaved = self.dirty,
            "session closed"
        );
        self.store
    }

    fn persist(&mut self) -> bool {
        self.dirty = true;
        match self.store.save(&self.ledger.snapshot()) {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                self.failed_saves += 1;
                warn!(error = %format!("{:#}", e), "failed to persist snapshot; in-memory state kept");
                false
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
