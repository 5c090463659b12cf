//! # Registry Configuration
//!
//! Deserializable settings for an [`AuditLedger`](crate::AuditLedger).
//! Every field has a default, so an empty document is a valid config.

use cav_core::{AccountAddress, BlockHeight};
use serde::{Deserialize, Serialize};

/// The emulator service account, used as the default admin.
pub const SERVICE_ACCOUNT: AccountAddress =
    AccountAddress::from_bytes([0xf8, 0xd6, 0xe0, 0x58, 0x6b, 0x0a, 0x20, 0xc7]);

/// What happens when the admin authorizes an account that is already an auditor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReauthorizationPolicy {
    /// Succeeds without changing state; `AuditorCreated` is emitted again.
    #[default]
    Idempotent,
    /// Fails with `AlreadyAuthorized`.
    Reject,
}

/// Settings for the registry and its transaction session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Account holding admin capability.
    pub admin: AccountAddress,
    /// Re-authorization behavior.
    pub reauthorization: ReauthorizationPolicy,
    /// Whether an account must initialize an auditor proxy before it can be authorized.
    pub require_auditor_proxy: bool,
    /// Height at which the first transaction executes.
    pub genesis_height: BlockHeight,
    /// Blocks advanced by each state-changing transaction.
    pub height_step: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            admin: SERVICE_ACCOUNT,
            reauthorization: ReauthorizationPolicy::default(),
            require_auditor_proxy: true,
            genesis_height: BlockHeight(1),
            height_step: 1,
        }
    }
}
