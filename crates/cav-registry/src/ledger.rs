//! # Audit Ledger
//!
//! A transaction-serialized session over the registry: one owner for the
//! auditor registry, the voucher store, the gate, the sweeper, and the
//! current block height.
//!
//! ## Block Semantics
//!
//! Every state-changing transaction executes at the current height, then
//! the height advances by `height_step`, whether the transaction succeeded
//! or not. Read-only queries never advance the height.
//!
//! ```text
//! genesis 6:  init_auditor @6 → authorize_auditor @7 → new_audit(offset 2) @8  ⇒ expiry 10
//!             deploy @9 ✓ → deploy @10 ✓ → deploy @11 ✗ invalid voucher
//! ```
//!
//! ## Atomicity
//!
//! Each transaction collects its events into a private buffer. On success
//! the buffer is returned in a [`Receipt`] and appended to the journal; on
//! failure it is dropped. Component operations validate before mutating, so
//! a failure leaves no partial state.

use cav_core::{AccountAddress, BlockHeight, CodeHash, CodeHasher, VoucherKey, VoucherScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auditor::{AuditorAuthorization, AuditorRegistry};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::event::VoucherEvent;
use crate::gate::{DeployAuthorization, DeploymentGate};
use crate::store::VoucherStore;
use crate::sweep::CleanupSweeper;
use crate::voucher::{Voucher, VoucherRequest};

/// Inputs of a `new_audit` transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAudit {
    /// Target account; `None` issues an any-account voucher.
    pub target: Option<AccountAddress>,
    /// The audited contract source.
    pub code: String,
    /// Whether the voucher survives consumption.
    pub recurrent: bool,
    /// Blocks of validity after the creating height.
    pub expiry_offset: Option<u64>,
}

/// How a `delete_audit` transaction names its voucher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A rendered key.
    Key(VoucherKey),
    /// The parts the key derives from.
    Scoped {
        /// Voucher scope.
        scope: VoucherScope,
        /// Hash of the covered code.
        code_hash: CodeHash,
    },
}

impl DeleteTarget {
    fn into_key(self) -> VoucherKey {
        match self {
            Self::Key(key) => key,
            Self::Scoped { scope, code_hash } => VoucherKey::derive(scope, code_hash),
        }
    }
}

impl From<VoucherKey> for DeleteTarget {
    fn from(key: VoucherKey) -> Self {
        Self::Key(key)
    }
}

/// Result of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<T> {
    /// Height the transaction executed at.
    pub height: BlockHeight,
    /// Events in emission order.
    pub events: Vec<VoucherEvent>,
    /// Operation-specific output.
    pub output: T,
}

/// A committed transaction in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Height the transaction executed at.
    pub height: BlockHeight,
    /// Operation name, e.g. `deploy_contract`.
    pub operation: String,
    /// Events in emission order.
    pub events: Vec<VoucherEvent>,
    /// Wall-clock commit time.
    pub recorded_at: DateTime<Utc>,
}

/// Registry session with block-per-transaction height tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLedger {
    config: RegistryConfig,
    height: BlockHeight,
    auditors: AuditorRegistry,
    vouchers: VoucherStore,
    journal: Vec<JournalEntry>,
    #[serde(skip)]
    gate: DeploymentGate,
    #[serde(skip)]
    sweeper: CleanupSweeper,
}

impl AuditLedger {
    /// Fresh ledger at the configured genesis height.
    pub fn new(config: RegistryConfig) -> Self {
        let auditors = AuditorRegistry::new(&config);
        Self {
            height: config.genesis_height,
            vouchers: VoucherStore::new(auditors.id()),
            auditors,
            journal: Vec::new(),
            gate: DeploymentGate::new(),
            sweeper: CleanupSweeper,
            config,
        }
    }

    // ── Transactions ─────────────────────────────────────────────────

    /// `caller` initializes its auditor proxy. Returns `false` if it already had one.
    pub fn init_auditor(
        &mut self,
        caller: AccountAddress,
    ) -> Result<Receipt<bool>, RegistryError> {
        self.transact("init_auditor", |ledger, _height, _events| {
            Ok(ledger.auditors.register_proxy(caller))
        })
    }

    /// Admin grants auditor capability to `account`.
    pub fn authorize_auditor(
        &mut self,
        caller: AccountAddress,
        account: AccountAddress,
    ) -> Result<Receipt<AuditorAuthorization>, RegistryError> {
        self.transact("authorize_auditor", |ledger, height, events| {
            let admin = ledger.auditors.admin_capability(&caller)?;
            ledger.auditors.authorize(&admin, account, height, events)
        })
    }

    /// Auditor creates or replaces a voucher for `audit.code`.
    pub fn new_audit(
        &mut self,
        caller: AccountAddress,
        audit: NewAudit,
    ) -> Result<Receipt<Voucher>, RegistryError> {
        self.transact("new_audit", |ledger, height, events| {
            let auditor = ledger.auditors.auditor_capability(&caller)?;
            let request = VoucherRequest {
                scope: VoucherScope::from_target(audit.target),
                code_hash: ledger.gate.hasher().hash(&audit.code),
                recurrent: audit.recurrent,
                expiry_offset: audit.expiry_offset,
            };
            ledger
                .vouchers
                .create_or_replace(&auditor, request, height, events)
        })
    }

    /// Auditor deletes a voucher by key or by `(scope, code_hash)`.
    pub fn delete_audit(
        &mut self,
        caller: AccountAddress,
        target: impl Into<DeleteTarget>,
    ) -> Result<Receipt<Voucher>, RegistryError> {
        let key = target.into().into_key();
        self.transact("delete_audit", |ledger, _height, events| {
            let auditor = ledger.auditors.auditor_capability(&caller)?;
            ledger.vouchers.delete(&auditor, &key, events)
        })
    }

    /// Deploy `code` to `account`, consuming a voucher.
    pub fn deploy_contract(
        &mut self,
        account: AccountAddress,
        code: &str,
    ) -> Result<Receipt<DeployAuthorization>, RegistryError> {
        self.transact("deploy_contract", |ledger, height, events| {
            ledger
                .gate
                .deploy(&mut ledger.vouchers, &account, code, height, events)
        })
    }

    /// Admin sweeps expired vouchers. Returns the number removed.
    pub fn cleanup_expired(
        &mut self,
        caller: AccountAddress,
    ) -> Result<Receipt<usize>, RegistryError> {
        self.transact("cleanup_expired", |ledger, height, events| {
            let admin = ledger.auditors.admin_capability(&caller)?;
            ledger
                .sweeper
                .sweep(&admin, &mut ledger.vouchers, height, events)
        })
    }

    /// Seal `blocks` empty blocks.
    pub fn advance(&mut self, blocks: u64) {
        self.height = self.height.saturating_add(blocks);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Number of stored vouchers, including expired ones not yet swept.
    pub fn get_vouchers(&self) -> usize {
        self.vouchers.count()
    }

    /// The voucher at `key`, if any.
    pub fn voucher(&self, key: &VoucherKey) -> Option<&Voucher> {
        self.vouchers.get(key)
    }

    /// Height the next transaction will execute at.
    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// The ledger configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The auditor registry.
    pub fn auditors(&self) -> &AuditorRegistry {
        &self.auditors
    }

    /// The voucher store.
    pub fn vouchers(&self) -> &VoucherStore {
        &self.vouchers
    }

    /// Committed transactions, oldest first.
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Run one transaction at the current height and advance it.
    fn transact<T>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(
            &mut Self,
            BlockHeight,
            &mut Vec<VoucherEvent>,
        ) -> Result<T, RegistryError>,
    ) -> Result<Receipt<T>, RegistryError> {
        let height = self.height;
        self.height = height.saturating_add(self.config.height_step);

        let mut events = Vec::new();
        match apply(self, height, &mut events) {
            Ok(output) => {
                tracing::debug!(
                    operation,
                    height = %height,
                    events = events.len(),
                    "transaction committed"
                );
                self.journal.push(JournalEntry {
                    height,
                    operation: operation.to_string(),
                    events: events.clone(),
                    recorded_at: Utc::now(),
                });
                Ok(Receipt {
                    height,
                    events,
                    output,
                })
            }
            Err(err) => {
                tracing::debug!(
                    operation,
                    height = %height,
                    error = %err,
                    "transaction failed"
                );
                Err(err)
            }
        }
    }
}

impl Default for AuditLedger {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SERVICE_ACCOUNT;
    use crate::error::Capability;

    const CODE: &str = "contract CodyCode {}";

    fn auditor() -> AccountAddress {
        AccountAddress::parse("e03daebed8ca0615").unwrap()
    }

    fn developer() -> AccountAddress {
        AccountAddress::parse("01cf0e2f2f715450").unwrap()
    }

    fn ledger_with_auditor() -> AuditLedger {
        let mut ledger = AuditLedger::default();
        ledger.init_auditor(auditor()).unwrap();
        ledger.authorize_auditor(SERVICE_ACCOUNT, auditor()).unwrap();
        ledger
    }

    #[test]
    fn height_advances_per_transaction() {
        let mut ledger = AuditLedger::default();
        assert_eq!(ledger.height(), BlockHeight(1));
        let receipt = ledger.init_auditor(auditor()).unwrap();
        assert_eq!(receipt.height, BlockHeight(1));
        assert_eq!(ledger.height(), BlockHeight(2));
    }

    #[test]
    fn failed_transaction_still_advances_height() {
        let mut ledger = AuditLedger::default();
        assert!(ledger.deploy_contract(developer(), CODE).is_err());
        assert_eq!(ledger.height(), BlockHeight(2));
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn queries_do_not_advance_height() {
        let ledger = ledger_with_auditor();
        let before = ledger.height();
        assert_eq!(ledger.get_vouchers(), 0);
        assert_eq!(ledger.height(), before);
    }

    #[test]
    fn non_auditor_cannot_audit() {
        let mut ledger = AuditLedger::default();
        let err = ledger
            .new_audit(
                developer(),
                NewAudit {
                    target: None,
                    code: CODE.to_string(),
                    recurrent: true,
                    expiry_offset: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert_eq!(ledger.get_vouchers(), 0);
    }

    #[test]
    fn non_admin_cannot_authorize_or_sweep() {
        let mut ledger = AuditLedger::default();
        ledger.init_auditor(auditor()).unwrap();
        assert!(ledger.authorize_auditor(developer(), auditor()).is_err());
        assert!(ledger.cleanup_expired(developer()).is_err());
        assert!(!ledger.auditors().is_auditor(&auditor()));
    }

    #[test]
    fn journal_records_committed_transactions() {
        let mut ledger = ledger_with_auditor();
        ledger
            .new_audit(
                auditor(),
                NewAudit {
                    target: Some(developer()),
                    code: CODE.to_string(),
                    recurrent: false,
                    expiry_offset: None,
                },
            )
            .unwrap();

        let ops: Vec<_> = ledger
            .journal()
            .iter()
            .map(|e| e.operation.as_str())
            .collect();
        assert_eq!(ops, ["init_auditor", "authorize_auditor", "new_audit"]);
        assert_eq!(ledger.journal()[2].events[0].name(), "VoucherCreated");
    }

    #[test]
    fn delete_by_scope_target() {
        let mut ledger = ledger_with_auditor();
        let created = ledger
            .new_audit(
                auditor(),
                NewAudit {
                    target: None,
                    code: CODE.to_string(),
                    recurrent: true,
                    expiry_offset: Some(5),
                },
            )
            .unwrap();

        let receipt = ledger
            .delete_audit(
                auditor(),
                DeleteTarget::Scoped {
                    scope: VoucherScope::AnyAccount,
                    code_hash: created.output.code_hash.clone(),
                },
            )
            .unwrap();
        assert_eq!(receipt.output, created.output);
        assert_eq!(ledger.get_vouchers(), 0);

        let err = ledger.delete_audit(auditor(), created.output.key).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn non_auditor_cannot_delete() {
        let mut ledger = ledger_with_auditor();
        let created = ledger
            .new_audit(
                auditor(),
                NewAudit {
                    target: Some(developer()),
                    code: CODE.to_string(),
                    recurrent: true,
                    expiry_offset: None,
                },
            )
            .unwrap();
        let journal_len = ledger.journal().len();

        let err = ledger
            .delete_audit(developer(), created.output.key.clone())
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::Unauthorized {
                account: developer(),
                capability: Capability::Auditor,
            }
        );
        assert_eq!(ledger.get_vouchers(), 1);
        assert_eq!(ledger.voucher(&created.output.key), Some(&created.output));
        assert_eq!(ledger.journal().len(), journal_len);
        let last = ledger.journal().last().unwrap();
        assert_eq!(last.operation, "new_audit");
        assert!(last.events.iter().all(|e| e.name() != "VoucherRemoved"));
    }

    #[test]
    fn advance_seals_empty_blocks() {
        let mut ledger = AuditLedger::default();
        ledger.advance(5);
        assert_eq!(ledger.height(), BlockHeight(6));
    }

    #[test]
    fn snapshot_round_trip_keeps_state() {
        let mut ledger = ledger_with_auditor();
        ledger
            .new_audit(
                auditor(),
                NewAudit {
                    target: None,
                    code: CODE.to_string(),
                    recurrent: true,
                    expiry_offset: None,
                },
            )
            .unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        let mut restored: AuditLedger = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.height(), ledger.height());
        assert_eq!(restored.get_vouchers(), 1);
        assert!(restored.auditors().is_auditor(&auditor()));
        assert!(restored.deploy_contract(developer(), CODE).is_ok());
    }
}
