//! # cav CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cav_cli::admin::{
    run_authorize_auditor, run_cleanup, run_init_auditor, AuthorizeAuditorArgs, CleanupArgs,
    InitAuditorArgs,
};
use cav_cli::audit::{
    run_delete_audit, run_deploy, run_new_audit, DeleteAuditArgs, DeployArgs, NewAuditArgs,
};
use cav_cli::query::{run_events, run_hash, run_vouchers, EventsArgs, HashArgs, VouchersArgs};
use cav_cli::session::{Session, DEFAULT_STATE_DIR};
use cav_core::AccountAddress;

/// Contract audit vouchers
///
/// Auditors issue vouchers for exact contract code; a deploy succeeds only by
/// consuming a matching, unexpired voucher. State is a local JSON ledger.
#[derive(Parser, Debug)]
#[command(name = "cav", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Registry configuration (YAML), applied when the ledger is created.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the ledger snapshot.
    #[arg(long, global = true, default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,

    /// Account signing the transaction.
    #[arg(long = "as", global = true, value_name = "ACCOUNT")]
    signer: Option<AccountAddress>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register the signer's auditor proxy.
    InitAuditor(InitAuditorArgs),

    /// Grant auditor capability to an account (admin).
    AuthorizeAuditor(AuthorizeAuditorArgs),

    /// Issue or replace a voucher for contract code (auditor).
    NewAudit(NewAuditArgs),

    /// Delete a voucher by key or by scope and code hash (auditor).
    DeleteAudit(DeleteAuditArgs),

    /// Deploy contract code to the signer (or `--account`), consuming a voucher.
    Deploy(DeployArgs),

    /// Remove expired vouchers (admin).
    Cleanup(CleanupArgs),

    /// Count or list stored vouchers.
    Vouchers(VouchersArgs),

    /// Print committed transactions and their events.
    Events(EventsArgs),

    /// Print the SHA3-256 hash of contract code.
    Hash(HashArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(state_dir = %cli.state_dir.display(), "cav CLI starting");

    let session = Session::new(cli.state_dir, cli.config, cli.signer);

    let result = match cli.command {
        Commands::InitAuditor(args) => run_init_auditor(&args, &session),
        Commands::AuthorizeAuditor(args) => run_authorize_auditor(&args, &session),
        Commands::NewAudit(args) => run_new_audit(&args, &session),
        Commands::DeleteAudit(args) => run_delete_audit(&args, &session),
        Commands::Deploy(args) => run_deploy(&args, &session),
        Commands::Cleanup(args) => run_cleanup(&args, &session),
        Commands::Vouchers(args) => run_vouchers(&args, &session),
        Commands::Events(args) => run_events(&args, &session),
        Commands::Hash(args) => run_hash(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
