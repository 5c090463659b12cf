//! # Voucher Subcommands
//!
//! Auditor-signed voucher issuance and deletion, and voucher-gated deploys.

use anyhow::{bail, Result};
use clap::Args;

use cav_core::{AccountAddress, CodeHash, VoucherKey, VoucherScope};
use cav_registry::{DeleteTarget, NewAudit};

use crate::session::Session;
use crate::{print_receipt, CodeSource};

/// Arguments for `cav new-audit`.
#[derive(Args, Debug)]
pub struct NewAuditArgs {
    /// Account allowed to deploy. Omit to issue an any-account voucher.
    #[arg(long)]
    pub address: Option<AccountAddress>,

    #[command(flatten)]
    pub source: CodeSource,

    /// Keep the voucher after it is used.
    #[arg(long)]
    pub recurrent: bool,

    /// Blocks of validity after issuance. 0 or omitted never expires.
    #[arg(long)]
    pub expiry_offset: Option<u64>,
}

/// Arguments for `cav delete-audit`.
#[derive(Args, Debug)]
pub struct DeleteAuditArgs {
    /// Voucher key, `0x<address>-<hash>` or `any-<hash>`.
    #[arg(long, conflicts_with_all = ["address", "any", "code_hash"])]
    pub key: Option<VoucherKey>,

    /// Account of a specific-account voucher.
    #[arg(long, conflicts_with = "any")]
    pub address: Option<AccountAddress>,

    /// Target the any-account voucher.
    #[arg(long)]
    pub any: bool,

    /// Code hash of the voucher.
    #[arg(long)]
    pub code_hash: Option<CodeHash>,
}

impl DeleteAuditArgs {
    fn target(&self) -> Result<DeleteTarget> {
        if let Some(key) = &self.key {
            return Ok(DeleteTarget::Key(key.clone()));
        }
        let Some(code_hash) = &self.code_hash else {
            bail!("pass --key, or --code-hash with --address or --any");
        };
        let scope = match (self.address, self.any) {
            (Some(address), false) => VoucherScope::SpecificAccount(address),
            (None, true) => VoucherScope::AnyAccount,
            _ => bail!("pass exactly one of --address or --any with --code-hash"),
        };
        Ok(DeleteTarget::Scoped {
            scope,
            code_hash: code_hash.clone(),
        })
    }
}

/// Arguments for `cav deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub source: CodeSource,

    /// Account to deploy to. Defaults to the signer.
    #[arg(long)]
    pub account: Option<AccountAddress>,
}

pub fn run_new_audit(args: &NewAuditArgs, session: &Session) -> Result<u8> {
    let caller = session.signer()?;
    let code = args.source.read()?;
    let mut ledger = session.open()?;

    let result = ledger.new_audit(
        caller,
        NewAudit {
            target: args.address,
            code,
            recurrent: args.recurrent,
            expiry_offset: args.expiry_offset,
        },
    );
    let receipt = session.commit(&ledger, "new-audit", result)?;

    tracing::info!(key = %receipt.output.key, height = %receipt.height, "voucher issued");
    print_receipt("new-audit", &receipt, &ledger.config().admin);
    println!("Voucher: {}", receipt.output.key);
    Ok(0)
}

pub fn run_delete_audit(args: &DeleteAuditArgs, session: &Session) -> Result<u8> {
    let caller = session.signer()?;
    let target = args.target()?;
    let mut ledger = session.open()?;

    let result = ledger.delete_audit(caller, target);
    let receipt = session.commit(&ledger, "delete-audit", result)?;

    tracing::info!(key = %receipt.output.key, height = %receipt.height, "voucher deleted");
    print_receipt("delete-audit", &receipt, &ledger.config().admin);
    Ok(0)
}

pub fn run_deploy(args: &DeployArgs, session: &Session) -> Result<u8> {
    let account = match args.account {
        Some(account) => account,
        None => session.signer()?,
    };
    let code = args.source.read()?;
    let mut ledger = session.open()?;

    let result = ledger.deploy_contract(account, &code);
    let receipt = session.commit(&ledger, "deploy", result)?;

    let authorization = &receipt.output;
    tracing::info!(
        account = %account,
        code_hash = %authorization.code_hash,
        removed = authorization.consumption.removed,
        "deploy authorized"
    );
    print_receipt("deploy", &receipt, &ledger.config().admin);
    println!("Deployed {} to {account}", authorization.code_hash);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{
        run_authorize_auditor, run_init_auditor, AuthorizeAuditorArgs, InitAuditorArgs,
    };
    use cav_core::BlockHeight;

    const CODE: &str = "contract CodyCode {}";
    const CODE_SHA3: &str = "cd1057bd9f593dab406b0a09ffcc7f7468d3ef85021884c4b07430933d94fec0";

    fn auditor() -> AccountAddress {
        AccountAddress::parse("e03daebed8ca0615").unwrap()
    }

    fn developer() -> AccountAddress {
        AccountAddress::parse("01cf0e2f2f715450").unwrap()
    }

    /// State directory with an authorized auditor, returning the auditor's session.
    fn onboarded(dir: &std::path::Path) -> Session {
        let as_auditor = Session::new(dir, None, Some(auditor()));
        run_init_auditor(&InitAuditorArgs {}, &as_auditor).unwrap();
        run_authorize_auditor(
            &AuthorizeAuditorArgs { account: auditor() },
            &Session::new(dir, None, None),
        )
        .unwrap();
        as_auditor
    }

    fn deploy_args(account: Option<AccountAddress>) -> DeployArgs {
        DeployArgs {
            source: CodeSource::inline(CODE),
            account,
        }
    }

    fn new_audit(address: Option<AccountAddress>, recurrent: bool) -> NewAuditArgs {
        NewAuditArgs {
            address,
            source: CodeSource::inline(CODE),
            recurrent,
            expiry_offset: Some(10),
        }
    }

    #[test]
    fn issue_then_deploy_once() {
        let dir = tempfile::tempdir().unwrap();
        let as_auditor = onboarded(dir.path());
        run_new_audit(&new_audit(Some(developer()), false), &as_auditor).unwrap();

        let as_developer = Session::new(dir.path(), None, Some(developer()));
        let deploy = deploy_args(None);
        assert_eq!(run_deploy(&deploy, &as_developer).unwrap(), 0);

        let err = run_deploy(&deploy, &as_developer).unwrap_err();
        assert_eq!(format!("{err:#}"), "deploy rejected: invalid voucher");
        assert_eq!(as_developer.open().unwrap().get_vouchers(), 0);
    }

    #[test]
    fn recurrent_any_account_voucher_survives() {
        let dir = tempfile::tempdir().unwrap();
        let as_auditor = onboarded(dir.path());
        run_new_audit(&new_audit(None, true), &as_auditor).unwrap();

        let deploy = deploy_args(None);
        run_deploy(&deploy, &Session::new(dir.path(), None, Some(developer()))).unwrap();
        run_deploy(&deploy, &Session::new(dir.path(), None, Some(auditor()))).unwrap();

        let ledger = as_auditor.open().unwrap();
        assert_eq!(ledger.get_vouchers(), 1);
        assert_eq!(ledger.height(), BlockHeight(6));
    }

    #[test]
    fn deploy_on_behalf_of_account() {
        let dir = tempfile::tempdir().unwrap();
        let as_auditor = onboarded(dir.path());
        run_new_audit(&new_audit(Some(developer()), false), &as_auditor).unwrap();
        let as_admin = Session::new(dir.path(), None, None);

        let err = run_deploy(&deploy_args(Some(auditor())), &as_admin).unwrap_err();
        assert_eq!(format!("{err:#}"), "deploy rejected: invalid voucher");
        assert_eq!(run_deploy(&deploy_args(Some(developer())), &as_admin).unwrap(), 0);

        let ledger = as_admin.open().unwrap();
        assert_eq!(ledger.get_vouchers(), 0);
        let deploys: Vec<_> = ledger
            .journal()
            .iter()
            .filter(|entry| entry.operation == "deploy_contract")
            .collect();
        assert_eq!(deploys.len(), 1);
        assert_eq!(deploys[0].events[0].fields()["address"], developer().to_string());
    }

    #[test]
    fn deploy_without_account_or_signer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(dir.path(), None, None);
        let err = run_deploy(&deploy_args(None), &session).unwrap_err();
        assert!(err.to_string().contains("needs a signer"));
        assert!(!session.ledger_path().exists());
    }

    #[test]
    fn non_auditor_cannot_issue() {
        let dir = tempfile::tempdir().unwrap();
        let as_developer = Session::new(dir.path(), None, Some(developer()));
        let err = run_new_audit(&new_audit(None, false), &as_developer).unwrap_err();
        assert!(format!("{err:#}").contains("lacks auditor capability"));
    }

    #[test]
    fn delete_by_address_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let as_auditor = onboarded(dir.path());
        run_new_audit(&new_audit(Some(developer()), true), &as_auditor).unwrap();

        let args = DeleteAuditArgs {
            key: None,
            address: Some(developer()),
            any: false,
            code_hash: Some(CodeHash::from_hex(CODE_SHA3).unwrap()),
        };
        assert_eq!(run_delete_audit(&args, &as_auditor).unwrap(), 0);
        assert_eq!(as_auditor.open().unwrap().get_vouchers(), 0);
    }

    #[test]
    fn delete_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let as_auditor = onboarded(dir.path());
        run_new_audit(&new_audit(None, true), &as_auditor).unwrap();

        let args = DeleteAuditArgs {
            key: Some(VoucherKey::parse(&format!("any-{CODE_SHA3}")).unwrap()),
            address: None,
            any: false,
            code_hash: None,
        };
        run_delete_audit(&args, &as_auditor).unwrap();

        let err = run_delete_audit(&args, &as_auditor).unwrap_err();
        assert!(format!("{err:#}").contains("voucher not found"));
    }

    #[test]
    fn delete_target_needs_scope() {
        let args = DeleteAuditArgs {
            key: None,
            address: None,
            any: false,
            code_hash: Some(CodeHash::from_hex(CODE_SHA3).unwrap()),
        };
        assert!(args.target().is_err());

        let args = DeleteAuditArgs {
            key: None,
            address: None,
            any: true,
            code_hash: None,
        };
        assert!(args.target().is_err());
    }
}
