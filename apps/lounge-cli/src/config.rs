//! # CLI Configuration
//!
//! ## Sources (Priority Order)
//! 1. Environment variables (`LOUNGE_*`, e.g. `LOUNGE_DATABASE_PATH`)
//! 2. Config file (`lounge.toml`, or the path given with `--config`)
//! 3. Defaults (this file)
//!
//! Read once at startup and never mutated.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use lounge_core::Tenant;
use lounge_db::{BookingPolicy, DbConfig};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "lounge.toml";

/// Operator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoungeConfig {
    /// SQLite file, created when missing. `:memory:` for a throwaway run.
    pub database_path: PathBuf,

    /// Pool size.
    pub max_connections: u32,

    /// Per-report deadline in seconds.
    pub report_timeout_secs: u64,

    /// Re-check table availability inside the booking write transaction.
    pub strict_table_availability: bool,

    /// Tenant the commands act on.
    pub company_id: i64,
    pub branch_id: i64,
}

impl Default for LoungeConfig {
    fn default() -> Self {
        LoungeConfig {
            database_path: PathBuf::from("lounge.db"),
            max_connections: 5,
            report_timeout_secs: lounge_db::DEFAULT_REPORT_TIMEOUT.as_secs(),
            strict_table_availability: false,
            company_id: 1,
            branch_id: 1,
        }
    }
}

impl LoungeConfig {
    /// Loads the file (optional unless given explicitly) and the environment
    /// on top of the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("LOUNGE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn tenant(&self) -> Tenant {
        Tenant::new(self.company_id, self.branch_id)
    }

    pub fn db_config(&self) -> DbConfig {
        if self.database_path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            strict_availability: self.strict_table_availability,
        }
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }
}
