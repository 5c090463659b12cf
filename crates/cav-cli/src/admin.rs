//! # Auditor and Admin Subcommands
//!
//! - `init-auditor` — the signer registers its auditor proxy.
//! - `authorize-auditor` — the admin grants auditor capability.
//! - `cleanup` — the admin sweeps expired vouchers.
//!
//! Admin commands sign as the configured admin unless `--as` overrides it.

use anyhow::Result;
use clap::Args;

use cav_core::AccountAddress;

use crate::print_receipt;
use crate::session::Session;

/// Arguments for `cav init-auditor`.
#[derive(Args, Debug)]
pub struct InitAuditorArgs {}

/// Arguments for `cav authorize-auditor`.
#[derive(Args, Debug)]
pub struct AuthorizeAuditorArgs {
    /// Account to grant auditor capability to.
    #[arg(long)]
    pub account: AccountAddress,
}

/// Arguments for `cav cleanup`.
#[derive(Args, Debug)]
pub struct CleanupArgs {}

pub fn run_init_auditor(_args: &InitAuditorArgs, session: &Session) -> Result<u8> {
    let caller = session.signer()?;
    let mut ledger = session.open()?;

    let result = ledger.init_auditor(caller);
    let receipt = session.commit(&ledger, "init-auditor", result)?;

    if receipt.output {
        tracing::info!(account = %caller, height = %receipt.height, "auditor proxy initialized");
    } else {
        tracing::info!(account = %caller, "auditor proxy already present");
    }
    print_receipt("init-auditor", &receipt, &ledger.config().admin);
    Ok(0)
}

pub fn run_authorize_auditor(args: &AuthorizeAuditorArgs, session: &Session) -> Result<u8> {
    let mut ledger = session.open()?;
    let caller = session.signer_or(ledger.config().admin);

    let result = ledger.authorize_auditor(caller, args.account);
    let receipt = session.commit(&ledger, "authorize-auditor", result)?;

    tracing::info!(account = %args.account, height = %receipt.height, "auditor authorized");
    print_receipt("authorize-auditor", &receipt, &ledger.config().admin);
    Ok(0)
}

pub fn run_cleanup(_args: &CleanupArgs, session: &Session) -> Result<u8> {
    let mut ledger = session.open()?;
    let caller = session.signer_or(ledger.config().admin);

    let result = ledger.cleanup_expired(caller);
    let receipt = session.commit(&ledger, "cleanup", result)?;

    print_receipt("cleanup", &receipt, &ledger.config().admin);
    println!(
        "Removed {} expired voucher(s); {} remain.",
        receipt.output,
        ledger.get_vouchers()
    );
    Ok(0)
}
