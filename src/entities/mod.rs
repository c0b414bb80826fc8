// Entity Models
// "Identity persists, values change"
//
// Each entity has a stable string identity that NEVER changes.
// Accounts carry mutable values; transfers are immutable once logged.

pub mod account;
pub mod transfer;

pub use account::{Account, AccountStore, AccountType};
pub use transfer::{Recipient, Transfer, TransferDraft, TransferLog};
