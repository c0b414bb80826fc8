// 💳 Account Entity - named, typed balance holder
//
// "Account name is a VALUE (can change), Account id is IDENTITY (never changes)"
//
// Balance is derived state: it starts at zero and only the ledger's transfer
// application moves it. Nothing outside this crate can write it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::LedgerError;
use crate::ids::IdGenerator;

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Savings account (interest-bearing)
    Savings,

    /// Checking account (debit card, daily transactions)
    Checking,

    /// Investment account (brokerage, stocks, bonds)
    Investment,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [
        AccountType::Savings,
        AccountType::Checking,
        AccountType::Investment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Checking => "checking",
            AccountType::Investment => "investment",
        }
    }

    /// Whether a distribute-transfer draft offers this account as a recipient
    pub fn receives_distributions(&self) -> bool {
        matches!(self, AccountType::Savings | AccountType::Investment)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountType::Savings),
            "checking" => Ok(AccountType::Checking),
            "investment" => Ok(AccountType::Investment),
            _ => Err(LedgerError::UnknownAccountType(s.to_string())),
        }
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identity - NEVER changes
    id: String,

    /// Display name (e.g., "Emergency Fund")
    pub name: String,

    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Sum of all transfer effects since creation
    balance: f64,
}

impl Account {
    pub(crate) fn new(id: String, name: String, account_type: AccountType) -> Self {
        Account {
            id,
            name,
            account_type,
            balance: 0.0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Check if account is overdrawn (negative balance)
    pub fn is_overdrawn(&self) -> bool {
        self.balance < 0.0
    }

    /// Display label used by account pickers, e.g. "Emergency Fund (savings)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.account_type)
    }

    pub(crate) fn credit(&mut self, amount: f64) {
        self.balance += amount;
    }

    pub(crate) fn debit(&mut self, amount: f64) {
        self.balance -= amount;
    }
}

// ============================================================================
// ACCOUNT STORE
// ============================================================================

/// All known accounts, in insertion order.
///
/// Ids are unique within the store. Lookups of unknown ids return `None`
/// and mutations of unknown ids are no-ops, so a stale id coming from the
/// presentation layer after a delete never aborts anything.
#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    accounts: Vec<Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted accounts. Later duplicates of an id are dropped.
    pub fn from_accounts(accounts: Vec<Account>) -> Self {
        let mut store = AccountStore::new();
        for account in accounts {
            if store.contains(&account.id) {
                warn!(account_id = %account.id, "dropping duplicate account id from snapshot");
                continue;
            }
            store.accounts.push(account);
        }
        store
    }

    /// Create an account with a fresh id and zero balance
    pub fn add(
        &mut self,
        ids: &mut dyn IdGenerator,
        name: String,
        account_type: AccountType,
    ) -> Account {
        let mut id = ids.next_id();
        while self.contains(&id) {
            id = ids.next_id();
        }

        let account = Account::new(id, name, account_type);
        self.accounts.push(account.clone());
        account
    }

    /// Replace name and type. Returns false (and changes nothing) if the id is unknown.
    pub fn update(&mut self, id: &str, name: String, account_type: AccountType) -> bool {
        match self.get_mut(id) {
            Some(account) => {
                account.name = name;
                account.account_type = account_type;
                true
            }
            None => false,
        }
    }

    /// Remove an account, returning it if it existed
    pub fn delete(&mut self, id: &str) -> Option<Account> {
        let index = self.accounts.iter().position(|a| a.id == id)?;
        Some(self.accounts.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn all(&self) -> &[Account] {
        &self.accounts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Accounts of one type, or every account when `filter` is `None`
    pub fn by_type(&self, filter: Option<AccountType>) -> Vec<&Account> {
        self.accounts
            .iter()
            .filter(|a| filter.map_or(true, |t| a.account_type == t))
            .collect()
    }

    pub fn total_balance(&self) -> f64 {
        self.accounts.iter().map(|a| a.balance).sum()
    }
}

// ============================================================================
// TESTS
// ============================================================================
