//! # Ledger Session
//!
//! Loads and persists the [`AuditLedger`] snapshot that every subcommand
//! operates on. The snapshot lives at `<state-dir>/ledger.json`; when it does
//! not exist yet, a fresh ledger is created from the `--config` YAML (or
//! defaults).
//!
//! A rejected transaction still seals its block, so the snapshot is written
//! back whether the transaction succeeded or not.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use cav_core::AccountAddress;
use cav_registry::{AuditLedger, Receipt, RegistryConfig, RegistryError};

/// File name of the ledger snapshot inside the state directory.
pub const LEDGER_FILE: &str = "ledger.json";

/// Default state directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".cav";

/// Where the ledger lives and who is signing.
#[derive(Debug, Clone)]
pub struct Session {
    state_dir: PathBuf,
    config_path: Option<PathBuf>,
    signer: Option<AccountAddress>,
}

impl Session {
    /// Session over `state_dir`, with an optional `--config` path and signer.
    pub fn new(
        state_dir: impl Into<PathBuf>,
        config_path: Option<PathBuf>,
        signer: Option<AccountAddress>,
    ) -> Self {
        Self {
            state_dir: state_dir.into(),
            config_path,
            signer,
        }
    }

    /// Directory holding the snapshot.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Full path of the snapshot file, `<state-dir>/ledger.json`.
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_FILE)
    }

    /// The `--as` account.
    pub fn signer(&self) -> Result<AccountAddress> {
        match self.signer {
            Some(account) => Ok(account),
            None => bail!("this command needs a signer: pass --as <account>"),
        }
    }

    /// The `--as` account, or `fallback` when none was given.
    pub fn signer_or(&self, fallback: AccountAddress) -> AccountAddress {
        self.signer.unwrap_or(fallback)
    }

    /// Registry configuration from `--config`, or defaults.
    pub fn load_config(&self) -> Result<RegistryConfig> {
        let Some(path) = &self.config_path else {
            return Ok(RegistryConfig::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: RegistryConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            admin = %config.admin,
            "loaded registry config"
        );
        Ok(config)
    }

    /// Load the ledger snapshot, or start a fresh ledger if none exists.
    pub fn open(&self) -> Result<AuditLedger> {
        let path = self.ledger_path();
        if !path.exists() {
            let config = self.load_config()?;
            tracing::info!(
                path = %path.display(),
                genesis = %config.genesis_height,
                "starting new ledger"
            );
            return Ok(AuditLedger::new(config));
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read ledger {}", path.display()))?;
        let ledger: AuditLedger = serde_json::from_str(&content)
            .with_context(|| format!("corrupt ledger {}", path.display()))?;

        if self.config_path.is_some() && self.load_config()? != *ledger.config() {
            tracing::warn!(
                path = %path.display(),
                "ledger already exists; ignoring --config for the stored configuration"
            );
        }
        Ok(ledger)
    }

    /// Persist the ledger snapshot.
    pub fn save(&self, ledger: &AuditLedger) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir).with_context(|| {
            format!("failed to create state directory {}", self.state_dir.display())
        })?;
        let path = self.ledger_path();
        let json = serde_json::to_string_pretty(ledger)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write ledger {}", path.display()))?;
        Ok(())
    }

    /// Persist the ledger after a transaction, then surface its outcome.
    pub fn commit<T>(
        &self,
        ledger: &AuditLedger,
        operation: &str,
        result: Result<Receipt<T>, RegistryError>,
    ) -> Result<Receipt<T>> {
        self.save(ledger)?;
        result.with_context(|| format!("{operation} rejected"))
    }
}
