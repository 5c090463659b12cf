//! # Read-Only Subcommands
//!
//! `vouchers`, `events`, and `hash` never execute a transaction, so they do
//! not advance the ledger height or write the snapshot.

use std::fmt::Write as _;

use anyhow::Result;
use clap::Args;

use cav_core::{CodeHasher, Sha3CodeHasher};
use cav_registry::AuditLedger;

use crate::session::Session;
use crate::{render_event, CodeSource};

/// Arguments for `cav vouchers`.
#[derive(Args, Debug)]
pub struct VouchersArgs {
    /// Print every stored voucher, not just the count.
    #[arg(long)]
    pub list: bool,
}

/// Arguments for `cav events`.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Only the most recent N transactions.
    #[arg(long)]
    pub last: Option<usize>,
}

/// Arguments for `cav hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    #[command(flatten)]
    pub source: CodeSource,
}

pub fn run_vouchers(args: &VouchersArgs, session: &Session) -> Result<u8> {
    let ledger = session.open()?;
    print!("{}", format_vouchers(&ledger, args.list));
    Ok(0)
}

pub fn run_events(args: &EventsArgs, session: &Session) -> Result<u8> {
    let ledger = session.open()?;
    print!("{}", format_events(&ledger, args.last));
    Ok(0)
}

pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let code = args.source.read()?;
    println!("{}", Sha3CodeHasher.hash(&code));
    Ok(0)
}

/// Voucher count, then one line per voucher when `list` is set.
pub fn format_vouchers(ledger: &AuditLedger, list: bool) -> String {
    let mut out = format!("{}\n", ledger.get_vouchers());
    if !list {
        return out;
    }

    let height = ledger.height();
    for voucher in ledger.vouchers().iter() {
        let expiry = voucher
            .expiry_block_height
            .map(|h| h.to_string())
            .unwrap_or_else(|| "never".to_string());
        let status = if voucher.is_expired(height) {
            " (expired)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {}  recurrent={} expires={expiry}{status}",
            voucher.key, voucher.recurrent
        );
    }
    out
}

/// Journal entries with their events, limited to the most recent `last`.
pub fn format_events(ledger: &AuditLedger, last: Option<usize>) -> String {
    let journal = ledger.journal();
    if journal.is_empty() {
        return "No transactions recorded.\n".to_string();
    }

    let skip = last.map(|n| journal.len().saturating_sub(n)).unwrap_or(0);
    let mut out = String::new();
    for entry in &journal[skip..] {
        let _ = writeln!(
            out,
            "[{}] {} at {}",
            entry.height,
            entry.operation,
            entry.recorded_at.to_rfc3339()
        );
        for event in &entry.events {
            let _ = writeln!(out, "  {}", render_event(event, &ledger.config().admin));
        }
    }
    out
}
