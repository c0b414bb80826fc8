// 🗄️ SQLite snapshot store - key-value blobs + WAL
//
// Two keys, `accounts` and `transfers`, each holding a JSON array. Every blob
// is stored next to its SHA-256 digest; a blob that no longer matches its
// digest, or no longer parses, is reported as corrupt.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

use crate::entities::{Account, Transfer};
use crate::snapshot::{Snapshot, SnapshotStore};

pub const ACCOUNTS_KEY: &str = "accounts";
pub const TRANSFERS_KEY: &str = "transfers";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    fn get_blob(&self, key: &str) -> Result<Option<(String, String)>> {
        let blob = self
            .conn
            .query_row(
                "SELECT value, digest FROM snapshot_kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(blob)
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some((value, digest)) = self.get_blob(key)? else {
            return Ok(None);
        };

        if compute_digest(&value) != digest {
            return Err(anyhow!("Digest mismatch for snapshot key `{}`", key));
        }

        let parsed = serde_json::from_str(&value)
            .with_context(|| format!("Failed to parse snapshot key `{}`", key))?;
        Ok(Some(parsed))
    }
}

/// Create the key-value table (idempotent)
pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshot_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            digest TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// SHA-256 of a blob, lowercase hex
pub fn compute_digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl SnapshotStore for SqliteStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let accounts: Option<Vec<Account>> = self.read_key(ACCOUNTS_KEY)?;
        let transfers: Option<Vec<Transfer>> = self.read_key(TRANSFERS_KEY)?;

        if accounts.is_none() && transfers.is_none() {
            debug!("no snapshot stored yet");
            return Ok(None);
        }

        let snapshot = Snapshot {
            accounts: accounts.unwrap_or_default(),
            transfers: transfers.unwrap_or_default(),
        };
        debug!(
            accounts = snapshot.accounts.len(),
            transfers = snapshot.transfers.len(),
            "snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        let accounts = serde_json::to_string(&snapshot.accounts)?;
        let transfers = serde_json::to_string(&snapshot.transfers)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        for (key, value) in [(ACCOUNTS_KEY, &accounts), (TRANSFERS_KEY, &transfers)] {
            tx.execute(
                "INSERT INTO snapshot_kv (key, value, digest, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    digest = excluded.digest,
                    updated_at = excluded.updated_at",
                params![key, value, compute_digest(value), now],
            )?;
        }
        tx.commit().context("Failed to commit snapshot")?;

        debug!(
            accounts = snapshot.accounts.len(),
            transfers = snapshot.transfers.len(),
            "snapshot saved"
        );
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
