// Transfer Ledger - Core Library
// Exposes the ledger state manager for the CLI, dashboard, API server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod export;
pub mod ids;
pub mod ledger;
pub mod logging;
pub mod reporting;
pub mod session;
pub mod snapshot;

// Re-export commonly used types
pub use config::Config;
pub use db::SqliteStore;
pub use entities::{
    Account, AccountStore, AccountType,
    Recipient, Transfer, TransferDraft, TransferLog,
};
pub use error::LedgerError;
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use ledger::{BalanceDrift, Ledger};
pub use reporting::{
    month_label, monthly_volume_by_recipient,
    MonthlyVolumeReport, VolumeSeries, UNKNOWN_ACCOUNT,
};
pub use session::Session;
pub use snapshot::{MemoryStore, Snapshot, SnapshotStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
