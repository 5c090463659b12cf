//! # Voucher Scope and Key Derivation
//!
//! A voucher applies either to one named account or to any account. The
//! registry stores vouchers under a key derived from the scope and the code
//! hash:
//!
//! ```text
//! SpecificAccount(addr)  →  0x<16 hex digits>-<64 hex digits>
//! AnyAccount             →  any-<64 hex digits>
//! ```
//!
//! The rendered key is part of the event contract and must match
//! bit-for-bit. [`VoucherKey`] keeps the scope and hash as typed fields and
//! renders the string only at the edges (display, serde).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::AccountAddress;
use crate::digest::CodeHash;
use crate::error::ValidationError;

/// Prefix of keys for any-account vouchers.
pub const ANY_ACCOUNT_PREFIX: &str = "any-";

/// Which deploying accounts a voucher covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum VoucherScope {
    /// Only this account may deploy.
    SpecificAccount(AccountAddress),
    /// Any account may deploy.
    AnyAccount,
}

impl VoucherScope {
    /// Scope from an optional target account; `None` means any account.
    pub fn from_target(target: Option<AccountAddress>) -> Self {
        match target {
            Some(address) => Self::SpecificAccount(address),
            None => Self::AnyAccount,
        }
    }

    /// Whether `account` may deploy under this scope.
    pub fn admits(&self, account: &AccountAddress) -> bool {
        match self {
            Self::SpecificAccount(address) => address == account,
            Self::AnyAccount => true,
        }
    }

    /// The named account, if any.
    pub fn address(&self) -> Option<&AccountAddress> {
        match self {
            Self::SpecificAccount(address) => Some(address),
            Self::AnyAccount => None,
        }
    }
}

/// Lookup key of a voucher in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoucherKey {
    scope: VoucherScope,
    code_hash: CodeHash,
}

impl VoucherKey {
    /// Derive the key for `(scope, code_hash)`.
    pub fn derive(scope: VoucherScope, code_hash: CodeHash) -> Self {
        Self { scope, code_hash }
    }

    /// Parse a rendered key back into its parts.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidVoucherKey {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some(hash) = s.strip_prefix(ANY_ACCOUNT_PREFIX) {
            let code_hash = CodeHash::from_hex(hash)
                .map_err(|e| invalid(&e.to_string()))?;
            return Ok(Self::derive(VoucherScope::AnyAccount, code_hash));
        }

        if !s.starts_with("0x") {
            return Err(invalid("expected `0x` or `any-` prefix"));
        }
        let (address, hash) = s
            .split_once('-')
            .ok_or_else(|| invalid("missing `-` separator"))?;
        if address.len() != 2 + crate::address::ADDRESS_HEX_LEN {
            return Err(invalid("address must be 16 hex digits"));
        }
        let address = AccountAddress::parse(address)
            .map_err(|e| invalid(&e.to_string()))?;
        let code_hash = CodeHash::from_hex(hash)
            .map_err(|e| invalid(&e.to_string()))?;
        Ok(Self::derive(VoucherScope::SpecificAccount(address), code_hash))
    }

    /// The scope this key was derived from.
    pub fn scope(&self) -> &VoucherScope {
        &self.scope
    }

    /// The code hash this key was derived from.
    pub fn code_hash(&self) -> &CodeHash {
        &self.code_hash
    }
}

impl std::fmt::Display for VoucherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            VoucherScope::SpecificAccount(address) => {
                write!(f, "0x{}-{}", address.to_hex(), self.code_hash)
            }
            VoucherScope::AnyAccount => write!(f, "{ANY_ACCOUNT_PREFIX}{}", self.code_hash),
        }
    }
}

impl FromStr for VoucherKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VoucherKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VoucherKey> for String {
    fn from(value: VoucherKey) -> Self {
        value.to_string()
    }
}
