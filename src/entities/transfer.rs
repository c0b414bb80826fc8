// 🔁 Transfer Entity - one source, many recipients, one date
//
// A transfer is an immutable fact once it reaches the log. Account ids inside
// it are lookup keys, not ownership: they may outlive the accounts they name.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::entities::account::AccountStore;
use crate::error::LedgerError;

// ============================================================================
// RECIPIENT LINE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub account_id: String,
    pub amount: f64,
}

impl Recipient {
    pub fn new(account_id: impl Into<String>, amount: f64) -> Self {
        Recipient {
            account_id: account_id.into(),
            amount,
        }
    }

    /// Build a recipient, rejecting negative, NaN and infinite amounts
    pub fn checked(account_id: impl Into<String>, amount: f64) -> Result<Self, LedgerError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        Ok(Recipient::new(account_id, amount))
    }
}

/// Parses `<account-id>=<amount>`, the form used on the command line.
impl FromStr for Recipient {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (account_id, amount) = s
            .split_once('=')
            .ok_or_else(|| LedgerError::InvalidRecipient(s.to_string()))?;

        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(LedgerError::InvalidRecipient(s.to_string()));
        }

        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidAmount(amount.trim().to_string()))?;

        Recipient::checked(account_id, amount)
    }
}

// ============================================================================
// TRANSFER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    id: String,
    date: NaiveDate,
    source_account_id: String,
    recipients: Vec<Recipient>,
}

impl Transfer {
    pub(crate) fn new(
        id: String,
        date: NaiveDate,
        source_account_id: String,
        recipients: Vec<Recipient>,
    ) -> Self {
        Transfer {
            id,
            date,
            source_account_id,
            recipients,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn source_account_id(&self) -> &str {
        &self.source_account_id
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Total debited from the source, including lines whose account no longer exists
    pub fn total_amount(&self) -> f64 {
        self.recipients.iter().map(|r| r.amount).sum()
    }

    /// Whether the transfer names this account as source or recipient
    pub fn involves(&self, account_id: &str) -> bool {
        self.source_account_id == account_id
            || self.recipients.iter().any(|r| r.account_id == account_id)
    }
}

// ============================================================================
// TRANSFER LOG
// ============================================================================

/// Append-only history of transfers in submission order (not date order).
#[derive(Debug, Clone, Default)]
pub struct TransferLog {
    entries: Vec<Transfer>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted transfers. Later duplicates of an id are dropped.
    pub fn from_transfers(entries: Vec<Transfer>) -> Self {
        let mut log = TransferLog::new();
        for transfer in entries {
            if log.contains(&transfer.id) {
                warn!(transfer_id = %transfer.id, "dropping duplicate transfer id from snapshot");
                continue;
            }
            log.entries.push(transfer);
        }
        log
    }

    pub fn append(&mut self, transfer: Transfer) {
        self.entries.push(transfer);
    }

    pub fn as_slice(&self) -> &[Transfer] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transfer> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Transfer> {
        self.entries.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn last(&self) -> Option<&Transfer> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transfers touching an account, oldest submission first
    pub fn involving(&self, account_id: &str) -> Vec<&Transfer> {
        self.entries.iter().filter(|t| t.involves(account_id)).collect()
    }
}

// ============================================================================
// TRANSFER DRAFT (distribute form)
// ============================================================================

/// A transfer being composed before submission.
///
/// Starts with one zero-amount line for every savings and investment account,
/// in store order. Lines still at zero are dropped on submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDraft {
    pub source_account_id: String,
    pub date: NaiveDate,
    lines: Vec<Recipient>,
}

impl TransferDraft {
    pub fn new(accounts: &AccountStore, source_account_id: impl Into<String>, date: NaiveDate) -> Self {
        let lines = accounts
            .iter()
            .filter(|a| a.account_type.receives_distributions())
            .map(|a| Recipient::new(a.id(), 0.0))
            .collect();

        TransferDraft {
            source_account_id: source_account_id.into(),
            date,
            lines,
        }
    }

    pub fn lines(&self) -> &[Recipient] {
        &self.lines
    }

    /// Set the amount on an existing line. Returns false if the account has no line.
    pub fn set_amount(&mut self, account_id: &str, amount: f64) -> bool {
        match self.lines.iter_mut().find(|l| l.account_id == account_id) {
            Some(line) => {
                line.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Running total shown next to the submit button
    pub fn total(&self) -> f64 {
        self.lines.iter().map(|l| l.amount).sum()
    }

    /// Lines that will actually be submitted
    pub fn recipients(&self) -> Vec<Recipient> {
        self.lines.iter().filter(|l| l.amount > 0.0).cloned().collect()
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.amount = 0.0;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
