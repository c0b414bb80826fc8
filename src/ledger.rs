// ⚖️ Ledger - accounts + transfer log + the balance-update algorithm
//
// Applying a transfer:
//   source.balance    -= sum(recipients.amount)   (if the source exists)
//   recipient.balance += amount                   (for each recipient that exists)
//   transfer appended to the log
//
// All of it happens inside one `&mut self` call, so no other operation can
// observe a debited-but-not-credited state. Unknown recipients still count
// toward the debit: funds sent to a deleted account leave the source and
// land nowhere. Overdrafts are allowed.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

use crate::entities::{Account, AccountStore, AccountType, Recipient, Transfer, TransferLog};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::snapshot::Snapshot;

/// Balances closer than this are considered equal by the audit
const AUDIT_TOLERANCE: f64 = 1e-6;

pub struct Ledger {
    accounts: AccountStore,
    transfers: TransferLog,
    ids: Box<dyn IdGenerator + Send>,
}

/// An account whose stored balance disagrees with a replay of the transfer log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceDrift {
    pub account_id: String,
    pub name: String,
    pub stored: f64,
    pub replayed: f64,
}

impl BalanceDrift {
    pub fn difference(&self) -> f64 {
        self.stored - self.replayed
    }
}

impl Ledger {
    /// Empty ledger with UUID identifiers
    pub fn new() -> Self {
        Ledger::with_id_generator(UuidGenerator)
    }

    pub fn with_id_generator(ids: impl IdGenerator + Send + 'static) -> Self {
        Ledger {
            accounts: AccountStore::new(),
            transfers: TransferLog::new(),
            ids: Box::new(ids),
        }
    }

    /// Rebuild a ledger from a persisted snapshot. Balances are taken as stored.
    pub fn from_snapshot(snapshot: Snapshot, ids: impl IdGenerator + Send + 'static) -> Self {
        Ledger {
            accounts: AccountStore::from_accounts(snapshot.accounts),
            transfers: TransferLog::from_transfers(snapshot.transfers),
            ids: Box::new(ids),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            accounts: self.accounts.all().to_vec(),
            transfers: self.transfers.as_slice().to_vec(),
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn transfers(&self) -> &TransferLog {
        &self.transfers
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    // ========================================================================
    // ACCOUNT OPERATIONS
    // ========================================================================

    pub fn add_account(&mut self, name: impl Into<String>, account_type: AccountType) -> Account {
        let account = self.accounts.add(self.ids.as_mut(), name.into(), account_type);
        info!(account_id = %account.id(), name = %account.name, account_type = %account_type, "account created");
        account
    }

    /// Rename/retype an account. Unknown ids are ignored; returns whether anything changed.
    pub fn update_account(&mut self, id: &str, name: impl Into<String>, account_type: AccountType) -> bool {
        let updated = self.accounts.update(id, name.into(), account_type);
        if updated {
            info!(account_id = %id, account_type = %account_type, "account updated");
        } else {
            warn!(account_id = %id, "update ignored: unknown account");
        }
        updated
    }

    /// Delete an account. Historical transfers keep referencing its id.
    pub fn delete_account(&mut self, id: &str) -> Option<Account> {
        let removed = self.accounts.delete(id);
        match &removed {
            Some(account) => info!(account_id = %id, name = %account.name, "account deleted"),
            None => warn!(account_id = %id, "delete ignored: unknown account"),
        }
        removed
    }

    // ========================================================================
    // TRANSFER APPLICATION
    // ========================================================================

    pub fn apply_transfer(
        &mut self,
        source_account_id: &str,
        date: NaiveDate,
        recipients: Vec<Recipient>,
    ) -> Transfer {
        let total: f64 = recipients.iter().map(|r| r.amount).sum();

        match self.accounts.get_mut(source_account_id) {
            Some(source) => source.debit(total),
            None => warn!(source_account_id, total, "transfer source not found; no debit applied"),
        }

        for recipient in &recipients {
            match self.accounts.get_mut(&recipient.account_id) {
                Some(account) => account.credit(recipient.amount),
                None => warn!(
                    account_id = %recipient.account_id,
                    amount = recipient.amount,
                    "transfer recipient not found; amount debited but not credited"
                ),
            }
        }

        let transfer = Transfer::new(
            self.fresh_transfer_id(),
            date,
            source_account_id.to_string(),
            recipients,
        );
        self.transfers.append(transfer.clone());

        info!(
            transfer_id = %transfer.id(),
            source_account_id,
            %date,
            recipients = transfer.recipients().len(),
            total,
            "transfer applied"
        );
        transfer
    }

    /// Next id not already used by a logged transfer or a live account
    fn fresh_transfer_id(&mut self) -> String {
        let mut id = self.ids.next_id();
        while self.transfers.contains(&id) || self.accounts.contains(&id) {
            id = self.ids.next_id();
        }
        id
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Accounts of one type, or all of them when `filter` is `None`
    pub fn accounts_of_type(&self, filter: Option<AccountType>) -> Vec<&Account> {
        self.accounts.by_type(filter)
    }

    pub fn total_balance(&self) -> f64 {
        self.accounts.total_balance()
    }

    /// Replay the transfer log from zero and report every account whose
    /// stored balance differs from the replayed one.
    ///
    /// Replays only credit and debit accounts that still exist, mirroring
    /// what `apply_transfer` does.
    pub fn audit(&self) -> Vec<BalanceDrift> {
        let mut replayed: HashMap<&str, f64> =
            self.accounts.iter().map(|a| (a.id(), 0.0)).collect();

        for transfer in self.transfers.iter() {
            if let Some(balance) = replayed.get_mut(transfer.source_account_id()) {
                *balance -= transfer.total_amount();
            }
            for recipient in transfer.recipients() {
                if let Some(balance) = replayed.get_mut(recipient.account_id.as_str()) {
                    *balance += recipient.amount;
                }
            }
        }

        self.accounts
            .iter()
            .filter_map(|account| {
                let expected = replayed.get(account.id()).copied().unwrap_or(0.0);
                if (account.balance() - expected).abs() > AUDIT_TOLERANCE {
                    Some(BalanceDrift {
                        account_id: account.id().to_string(),
                        name: account.name.clone(),
                        stored: account.balance(),
                        replayed: expected,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("accounts", &self.accounts)
            .field("transfers", &self.transfers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use std::collections::HashSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ledger() -> Ledger {
        Ledger::with_id_generator(SequentialIds::new("id"))
    }

    fn balance(ledger: &Ledger, id: &str) -> f64 {
        ledger.account(id).unwrap().balance()
    }

    #[test]
    fn test_transfer_conserves_funds_when_all_accounts_exist() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);
        let b = ledger.add_account("Broker", AccountType::Investment);

        let before = ledger.total_balance();
        ledger.apply_transfer(
            src.id(),
            date("2024-03-01"),
            vec![Recipient::new(a.id(), 60.0), Recipient::new(b.id(), 40.0)],
        );

        assert_eq!(balance(&ledger, src.id()), -100.0);
        assert_eq!(balance(&ledger, a.id()), 60.0);
        assert_eq!(balance(&ledger, b.id()), 40.0);
        assert_eq!(ledger.total_balance(), before);
    }

    #[test]
    fn test_transfer_to_unknown_recipient_debits_without_credit() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);

        ledger.apply_transfer(
            src.id(),
            date("2024-03-01"),
            vec![Recipient::new(a.id(), 30.0), Recipient::new("gone", 20.0)],
        );

        assert_eq!(balance(&ledger, src.id()), -50.0);
        assert_eq!(balance(&ledger, a.id()), 30.0);
        // 20.0 left the system
        assert_eq!(ledger.total_balance(), -20.0);
    }

    #[test]
    fn test_transfer_from_unknown_source_still_credits_and_logs() {
        let mut ledger = ledger();
        let a = ledger.add_account("Savings", AccountType::Savings);

        let transfer = ledger.apply_transfer("gone", date("2024-03-01"), vec![Recipient::new(a.id(), 10.0)]);

        assert_eq!(balance(&ledger, a.id()), 10.0);
        assert_eq!(ledger.transfers().len(), 1);
        assert_eq!(transfer.source_account_id(), "gone");
    }

    #[test]
    fn test_empty_transfer_is_logged_without_effect() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);

        ledger.apply_transfer(src.id(), date("2024-03-01"), vec![]);

        assert_eq!(balance(&ledger, src.id()), 0.0);
        assert_eq!(ledger.transfers().len(), 1);
    }

    #[test]
    fn test_repeated_recipient_is_credited_per_line() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);

        ledger.apply_transfer(
            src.id(),
            date("2024-03-01"),
            vec![Recipient::new(a.id(), 10.0), Recipient::new(a.id(), 5.0)],
        );

        assert_eq!(balance(&ledger, src.id()), -15.0);
        assert_eq!(balance(&ledger, a.id()), 15.0);
    }

    #[test]
    fn test_self_transfer_nets_to_zero() {
        let mut ledger = ledger();
        let a = ledger.add_account("Savings", AccountType::Savings);

        ledger.apply_transfer(a.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 80.0)]);

        assert_eq!(balance(&ledger, a.id()), 0.0);
    }

    #[test]
    fn test_overdraft_is_permitted() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);

        ledger.apply_transfer(src.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 1_000.0)]);

        assert!(ledger.account(src.id()).unwrap().is_overdrawn());
    }

    #[test]
    fn test_transfer_ids_are_fresh() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);

        let t1 = ledger.apply_transfer(src.id(), date("2024-03-01"), vec![]);
        let t2 = ledger.apply_transfer(src.id(), date("2024-03-01"), vec![]);

        assert_ne!(t1.id(), t2.id());
        assert_ne!(t1.id(), src.id());
    }

    #[test]
    fn test_transfer_ids_skip_ids_already_in_restored_log() {
        let mut first = ledger();
        let src = first.add_account("Checking", AccountType::Checking);
        let a = first.add_account("Savings", AccountType::Savings);
        first.apply_transfer(src.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 5.0)]);

        // Same prefix restarts at id-1 after a reload
        let mut second = Ledger::from_snapshot(first.snapshot(), SequentialIds::new("id"));
        for _ in 0..3 {
            second.apply_transfer(src.id(), date("2024-04-01"), vec![Recipient::new(a.id(), 1.0)]);
        }

        let ids: HashSet<&str> = second.transfers().iter().map(|t| t.id()).collect();
        assert_eq!(ids.len(), 4);
        assert!(!ids.contains(src.id()));
        assert!(!ids.contains(a.id()));
    }

    #[test]
    fn test_update_account_does_not_touch_balance() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);
        ledger.apply_transfer(src.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 25.0)]);

        assert!(ledger.update_account(a.id(), "Vacation", AccountType::Investment));

        let updated = ledger.account(a.id()).unwrap();
        assert_eq!(updated.name, "Vacation");
        assert_eq!(updated.account_type, AccountType::Investment);
        assert_eq!(updated.balance(), 25.0);
    }

    #[test]
    fn test_delete_keeps_history() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);
        let transfer =
            ledger.apply_transfer(src.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 25.0)]);

        assert!(ledger.delete_account(a.id()).is_some());
        assert!(ledger.delete_account(a.id()).is_none());

        assert!(ledger.account(a.id()).is_none());
        assert_eq!(ledger.transfers().get(transfer.id()), Some(&transfer));
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_state() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);
        ledger.apply_transfer(src.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 25.0)]);

        let restored = Ledger::from_snapshot(ledger.snapshot(), SequentialIds::new("restored"));

        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert_eq!(restored.account(a.id()).unwrap().balance(), 25.0);
    }

    #[test]
    fn test_audit_is_clean_after_normal_operation() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);
        let b = ledger.add_account("Broker", AccountType::Investment);

        ledger.apply_transfer(src.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 0.1)]);
        ledger.apply_transfer(src.id(), date("2024-04-01"), vec![Recipient::new(b.id(), 0.2)]);
        ledger.delete_account(b.id());
        ledger.apply_transfer(a.id(), date("2024-05-01"), vec![Recipient::new(b.id(), 0.05)]);

        assert!(ledger.audit().is_empty());
    }

    #[test]
    fn test_audit_reports_tampered_balance() {
        let mut ledger = ledger();
        let src = ledger.add_account("Checking", AccountType::Checking);
        let a = ledger.add_account("Savings", AccountType::Savings);
        ledger.apply_transfer(src.id(), date("2024-03-01"), vec![Recipient::new(a.id(), 25.0)]);

        let mut snapshot = ledger.snapshot();
        snapshot.accounts[1].credit(5.0);
        let tampered = Ledger::from_snapshot(snapshot, SequentialIds::new("x"));

        let drift = tampered.audit();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].account_id, a.id());
        assert_eq!(drift[0].stored, 30.0);
        assert_eq!(drift[0].replayed, 25.0);
        assert_eq!(drift[0].difference(), 5.0);
    }
}
