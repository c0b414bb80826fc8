// Runtime configuration.
//
// Precedence: command-line flags > LEDGER_* environment variables > defaults.
// The CLI gets flags and env through clap; the server reads env directly.

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "ledger.db";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const ENV_DB_PATH: &str = "LEDGER_DB";
pub const ENV_SERVER_ADDR: &str = "LEDGER_ADDR";
pub const ENV_LOG_FILTER: &str = "LEDGER_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding the snapshot
    pub db_path: PathBuf,
    /// Bind address for the HTTP API
    pub server_addr: String,
    /// `tracing` filter directive used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Config {
            db_path: get(ENV_DB_PATH).map(PathBuf::from).unwrap_or(defaults.db_path),
            server_addr: get(ENV_SERVER_ADDR).unwrap_or(defaults.server_addr),
            log_filter: get(ENV_LOG_FILTER).unwrap_or(defaults.log_filter),
        }
    }
}
