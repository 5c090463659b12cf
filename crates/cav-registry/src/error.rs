//! # Registry Errors
//!
//! Every failure aborts the enclosing operation before any mutation is
//! committed, so an error is the only observable effect of a rejected call.
//! Nothing here is retried internally.

use cav_core::{AccountAddress, CodeHash, ValidationError, VoucherKey};
use thiserror::Error;

/// The capability an operation demanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Registry administrator.
    Admin,
    /// Authorized auditor.
    Auditor,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Admin => "admin",
            Self::Auditor => "auditor",
        };
        f.write_str(s)
    }
}

/// Errors returned by registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Caller lacks the capability required for the attempted write.
    #[error("unauthorized: {account} lacks {capability} capability")]
    Unauthorized {
        /// The calling account.
        account: AccountAddress,
        /// The capability it would have needed.
        capability: Capability,
    },

    /// No matching, non-expired voucher for the deploying account and code.
    ///
    /// The message is matched on by callers and must stay `invalid voucher`.
    #[error("invalid voucher")]
    InvalidVoucher {
        /// The account that attempted the deployment.
        account: AccountAddress,
        /// Hash of the submitted code.
        code_hash: CodeHash,
    },

    /// Explicit deletion targeted a key with no entry.
    #[error("voucher not found: {key}")]
    NotFound {
        /// The key that was looked up.
        key: VoucherKey,
    },

    /// Re-authorization rejected by the configured policy.
    #[error("account {account} is already an authorized auditor")]
    AlreadyAuthorized {
        /// The account that already holds auditor capability.
        account: AccountAddress,
    },

    /// Authorization requires the account to have initialized an auditor proxy.
    #[error("account {account} has not initialized an auditor proxy")]
    MissingAuditorProxy {
        /// The account without a proxy.
        account: AccountAddress,
    },

    /// Malformed address, hash, or key.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl RegistryError {
    /// Whether this is the deploy-time rejection.
    pub fn is_invalid_voucher(&self) -> bool {
        matches!(self, Self::InvalidVoucher { .. })
    }
}
