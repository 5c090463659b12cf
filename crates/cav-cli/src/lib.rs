//! # cav-cli — Contract Audit Voucher CLI
//!
//! Provides the `cav` command-line interface over a local [`AuditLedger`]
//! snapshot. Each state-changing subcommand is one transaction, executed at
//! the ledger's current height.
//!
//! ## Subcommands
//!
//! - `cav init-auditor` — Register the signer's auditor proxy.
//! - `cav authorize-auditor` — Admin grants auditor capability.
//! - `cav new-audit` — Auditor issues or replaces a voucher.
//! - `cav delete-audit` — Auditor deletes a voucher.
//! - `cav deploy` — Deploy code, consuming a voucher.
//! - `cav cleanup` — Admin sweeps expired vouchers.
//! - `cav vouchers` — Count or list stored vouchers.
//! - `cav events` — Print the transaction journal.
//! - `cav hash` — Print the SHA3-256 code hash.
//!
//! ```bash
//! cav --as 0xe03daebed8ca0615 init-auditor
//! cav authorize-auditor --account 0xe03daebed8ca0615
//! cav --as 0xe03daebed8ca0615 new-audit --address 0x01cf0e2f2f715450 \
//!     --code-file Hello.cdc --expiry-offset 10
//! cav --as 0x01cf0e2f2f715450 deploy --code-file Hello.cdc
//! ```
//!
//! [`AuditLedger`]: cav_registry::AuditLedger

pub mod admin;
pub mod audit;
pub mod query;
pub mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cav_core::AccountAddress;
use cav_registry::{Receipt, VoucherEvent};

pub use session::Session;

/// Contract source, inline or from a file.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct CodeSource {
    /// Contract source text.
    #[arg(long)]
    pub code: Option<String>,

    /// Path to a file holding the contract source.
    #[arg(long)]
    pub code_file: Option<PathBuf>,
}

impl CodeSource {
    /// Source given as text, as `--code` would.
    pub fn inline(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            code_file: None,
        }
    }

    /// The source text, read from disk if given as a file.
    pub fn read(&self) -> Result<String> {
        match (&self.code, &self.code_file) {
            (Some(code), _) => Ok(code.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read contract source {}", path.display())),
            (None, None) => anyhow::bail!("pass --code or --code-file"),
        }
    }
}

/// One event as `<qualified name> key=value ...`.
pub fn render_event(event: &VoucherEvent, contract: &AccountAddress) -> String {
    let mut line = event.qualified_name(contract);
    for (name, value) in event.fields() {
        line.push_str(&format!(" {name}={value}"));
    }
    line
}

pub(crate) fn print_receipt<T>(operation: &str, receipt: &Receipt<T>, contract: &AccountAddress) {
    println!("OK: {operation} at height {}", receipt.height);
    for event in &receipt.events {
        println!("  {}", render_event(event, contract));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cav_registry::SERVICE_ACCOUNT;

    #[test]
    fn render_event_lists_fields_in_key_order() {
        let event = VoucherEvent::AuditorCreated {
            address: AccountAddress::parse("e03daebed8ca0615").unwrap(),
        };
        assert_eq!(
            render_event(&event, &SERVICE_ACCOUNT),
            "A.f8d6e0586b0a20c7.FlowContractAudits.AuditorCreated address=0xe03daebed8ca0615"
        );
    }

    #[test]
    fn render_event_with_empty_expiry() {
        let code_hash = cav_core::CodeHash::from_hex(&"ab".repeat(32)).unwrap();
        let event = VoucherEvent::VoucherCreated {
            address: None,
            code_hash: code_hash.clone(),
            expiry_block_height: None,
            recurrent: true,
        };
        let line = render_event(&event, &SERVICE_ACCOUNT);
        assert!(line.starts_with("A.f8d6e0586b0a20c7.FlowContractAudits.AuditVoucherCreated "));
        assert!(line.contains(" address= "));
        assert!(line.contains(&format!("codeHash={code_hash}")));
        assert!(line.contains("expiryBlockHeight= "));
        assert!(line.ends_with("recurrent=true"));
    }

    #[test]
    fn code_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Hello.cdc");
        std::fs::write(&path, "contract CodyCode {}").unwrap();

        let source = CodeSource {
            code: None,
            code_file: Some(path),
        };
        assert_eq!(source.read().unwrap(), "contract CodyCode {}");
    }

    #[test]
    fn code_source_missing_file_fails() {
        let source = CodeSource {
            code: None,
            code_file: Some(PathBuf::from("/nonexistent/Hello.cdc")),
        };
        assert!(source.read().is_err());
    }
}
