use thiserror::Error;

/// Errors raised while turning raw user input into ledger values.
///
/// Ledger operations themselves never fail: unknown ids degrade to no-ops.
/// These errors only appear at construction time, before anything reaches
/// the ledger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("unknown account type `{0}` (expected savings, checking or investment)")]
    UnknownAccountType(String),

    #[error("invalid transfer date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid recipient `{0}` (expected <account-id>=<amount>)")]
    InvalidRecipient(String),

    #[error("invalid amount `{0}` (must be a finite, non-negative number)")]
    InvalidAmount(String),
}
