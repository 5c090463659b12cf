//! # Registry Events
//!
//! Structured events emitted by committed operations. Delivery to an event
//! log is the ledger runtime's job; the registry only hands events to an
//! [`EventSink`] in emission order.
//!
//! ## Field Contract
//!
//! [`VoucherEvent::fields()`] renders every payload as strings, exactly as
//! downstream consumers match on them:
//!
//! | Field               | Rendering                                           |
//! |---------------------|-----------------------------------------------------|
//! | `address`           | `0x` + 16 hex digits; empty for any-account creates |
//! | `codeHash`          | 64 lowercase hex digits                             |
//! | `key`               | `0x<address>-<hash>` or `any-<hash>`                |
//! | `expiryBlockHeight` | decimal, or empty when the voucher never expires    |
//! | `recurrent`         | `true` / `false`                                    |

use std::collections::BTreeMap;

use cav_core::{AccountAddress, BlockHeight, CodeHash, VoucherKey};
use serde::{Deserialize, Serialize};

/// Name of the contract the events are qualified with.
pub const CONTRACT_NAME: &str = "FlowContractAudits";

/// An event emitted by a committed registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VoucherEvent {
    /// An account received auditor capability.
    AuditorCreated {
        /// The authorized account.
        address: AccountAddress,
    },
    /// A voucher was inserted.
    VoucherCreated {
        /// Target account, `None` for an any-account voucher.
        address: Option<AccountAddress>,
        /// Hash of the covered code.
        code_hash: CodeHash,
        /// Last valid height, if any.
        expiry_block_height: Option<BlockHeight>,
        /// Whether the voucher survives consumption.
        recurrent: bool,
    },
    /// A voucher authorized a deployment.
    VoucherUsed {
        /// The deploying account.
        address: AccountAddress,
        /// Key of the consumed voucher.
        key: VoucherKey,
        /// Last valid height, if any.
        expiry_block_height: Option<BlockHeight>,
        /// Whether the voucher survives consumption.
        recurrent: bool,
    },
    /// A voucher left the store (replaced, consumed, deleted, or swept).
    VoucherRemoved {
        /// Key of the removed voucher.
        key: VoucherKey,
        /// Last valid height, if any.
        expiry_block_height: Option<BlockHeight>,
        /// Whether the voucher was recurrent.
        recurrent: bool,
    },
}

impl VoucherEvent {
    /// Short event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuditorCreated { .. } => "AuditorCreated",
            Self::VoucherCreated { .. } => "VoucherCreated",
            Self::VoucherUsed { .. } => "VoucherUsed",
            Self::VoucherRemoved { .. } => "VoucherRemoved",
        }
    }

    /// Name the contract declares the event under. Voucher events carry an
    /// `Audit` prefix there.
    pub fn contract_event_name(&self) -> &'static str {
        match self {
            Self::AuditorCreated { .. } => "AuditorCreated",
            Self::VoucherCreated { .. } => "AuditVoucherCreated",
            Self::VoucherUsed { .. } => "AuditVoucherUsed",
            Self::VoucherRemoved { .. } => "AuditVoucherRemoved",
        }
    }

    /// Fully qualified name, e.g.
    /// `A.f8d6e0586b0a20c7.FlowContractAudits.AuditVoucherUsed`.
    pub fn qualified_name(&self, contract_address: &AccountAddress) -> String {
        format!(
            "A.{}.{CONTRACT_NAME}.{}",
            contract_address.to_hex(),
            self.contract_event_name()
        )
    }

    /// Payload rendered per the field contract.
    pub fn fields(&self) -> BTreeMap<&'static str, String> {
        let mut fields = BTreeMap::new();
        match self {
            Self::AuditorCreated { address } => {
                fields.insert("address", address.to_string());
            }
            Self::VoucherCreated {
                address,
                code_hash,
                expiry_block_height,
                recurrent,
            } => {
                fields.insert(
                    "address",
                    address.map(|a| a.to_string()).unwrap_or_default(),
                );
                fields.insert("codeHash", code_hash.to_string());
                fields.insert("expiryBlockHeight", render_expiry(expiry_block_height));
                fields.insert("recurrent", recurrent.to_string());
            }
            Self::VoucherUsed {
                address,
                key,
                expiry_block_height,
                recurrent,
            } => {
                fields.insert("address", address.to_string());
                fields.insert("key", key.to_string());
                fields.insert("expiryBlockHeight", render_expiry(expiry_block_height));
                fields.insert("recurrent", recurrent.to_string());
            }
            Self::VoucherRemoved {
                key,
                expiry_block_height,
                recurrent,
            } => {
                fields.insert("key", key.to_string());
                fields.insert("expiryBlockHeight", render_expiry(expiry_block_height));
                fields.insert("recurrent", recurrent.to_string());
            }
        }
        fields
    }
}

fn render_expiry(expiry: &Option<BlockHeight>) -> String {
    expiry.map(|h| h.to_string()).unwrap_or_default()
}

/// Receiver of emitted events.
pub trait EventSink {
    /// Accept one event. Called in emission order.
    fn emit(&mut self, event: VoucherEvent);
}

impl EventSink for Vec<VoucherEvent> {
    fn emit(&mut self, event: VoucherEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cav_core::{CodeHasher, Sha3CodeHasher, VoucherScope};

    const CODE_SHA3: &str = "cd1057bd9f593dab406b0a09ffcc7f7468d3ef85021884c4b07430933d94fec0";

    fn hash() -> CodeHash {
        Sha3CodeHasher.hash("contract CodyCode {}")
    }

    #[test]
    fn any_account_create_renders_empty_address() {
        let event = VoucherEvent::VoucherCreated {
            address: None,
            code_hash: hash(),
            expiry_block_height: Some(BlockHeight(13)),
            recurrent: false,
        };
        let fields = event.fields();
        assert_eq!(fields["address"], "");
        assert_eq!(fields["codeHash"], CODE_SHA3);
        assert_eq!(fields["expiryBlockHeight"], "13");
        assert_eq!(fields["recurrent"], "false");
    }

    #[test]
    fn absent_expiry_renders_empty() {
        let event = VoucherEvent::VoucherRemoved {
            key: VoucherKey::derive(VoucherScope::AnyAccount, hash()),
            expiry_block_height: None,
            recurrent: true,
        };
        let fields = event.fields();
        assert_eq!(fields["expiryBlockHeight"], "");
        assert_eq!(fields["recurrent"], "true");
        assert_eq!(fields["key"], format!("any-{CODE_SHA3}"));
    }

    #[test]
    fn used_event_carries_deployer_address() {
        let developer = AccountAddress::parse("01cf0e2f2f715450").unwrap();
        let event = VoucherEvent::VoucherUsed {
            address: developer,
            key: VoucherKey::derive(VoucherScope::SpecificAccount(developer), hash()),
            expiry_block_height: Some(BlockHeight(19)),
            recurrent: false,
        };
        let fields = event.fields();
        assert_eq!(fields["address"], "0x01cf0e2f2f715450");
        assert_eq!(fields["key"], format!("0x01cf0e2f2f715450-{CODE_SHA3}"));
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn qualified_names_use_contract_event_names() {
        let contract = AccountAddress::parse("f8d6e0586b0a20c7").unwrap();
        let developer = AccountAddress::parse("01cf0e2f2f715450").unwrap();
        let key = VoucherKey::derive(VoucherScope::AnyAccount, hash());
        let events = [
            VoucherEvent::AuditorCreated { address: developer },
            VoucherEvent::VoucherCreated {
                address: None,
                code_hash: hash(),
                expiry_block_height: None,
                recurrent: false,
            },
            VoucherEvent::VoucherUsed {
                address: developer,
                key: key.clone(),
                expiry_block_height: None,
                recurrent: false,
            },
            VoucherEvent::VoucherRemoved {
                key,
                expiry_block_height: None,
                recurrent: false,
            },
        ];
        let names: Vec<_> = events
            .iter()
            .map(|e| e.qualified_name(&contract))
            .collect();
        assert_eq!(
            names,
            [
                "A.f8d6e0586b0a20c7.FlowContractAudits.AuditorCreated",
                "A.f8d6e0586b0a20c7.FlowContractAudits.AuditVoucherCreated",
                "A.f8d6e0586b0a20c7.FlowContractAudits.AuditVoucherUsed",
                "A.f8d6e0586b0a20c7.FlowContractAudits.AuditVoucherRemoved",
            ]
        );
    }

    #[test]
    fn vec_sink_preserves_order() {
        let mut sink: Vec<VoucherEvent> = Vec::new();
        let key = VoucherKey::derive(VoucherScope::AnyAccount, hash());
        sink.emit(VoucherEvent::VoucherRemoved {
            key: key.clone(),
            expiry_block_height: None,
            recurrent: true,
        });
        sink.emit(VoucherEvent::VoucherCreated {
            address: None,
            code_hash: hash(),
            expiry_block_height: None,
            recurrent: true,
        });
        let names: Vec<_> = sink.iter().map(VoucherEvent::name).collect();
        assert_eq!(names, ["VoucherRemoved", "VoucherCreated"]);
    }
}
