//! # Account Addresses
//!
//! Ledger accounts are identified by 8-byte addresses, rendered as 16
//! lowercase hex digits. The `0x`-prefixed rendering is the one that
//! appears in voucher keys and in event payloads.
//!
//! ## Validation
//!
//! [`AccountAddress::parse()`] accepts an optional `0x` prefix and between
//! 1 and 16 hex digits. Short inputs are left-padded with zeros, so `0x1`
//! and `0x0000000000000001` name the same account.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of hex digits in a rendered address.
pub const ADDRESS_HEX_LEN: usize = 16;

/// An 8-byte ledger account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress([u8; 8]);

impl AccountAddress {
    /// Build an address from its raw bytes.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Parse an address from hex, with or without the `0x` prefix.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.is_empty() {
            return Err(ValidationError::InvalidAddress {
                input: s.to_string(),
                reason: "no hex digits",
            });
        }
        if digits.len() > ADDRESS_HEX_LEN {
            return Err(ValidationError::InvalidAddress {
                input: s.to_string(),
                reason: "more than 16 hex digits",
            });
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress {
                input: s.to_string(),
                reason: "non-hex character",
            });
        }

        let padded = format!("{digits:0>16}");
        let mut bytes = [0u8; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&padded[i * 2..i * 2 + 2], 16).map_err(|_| {
                ValidationError::InvalidAddress {
                    input: s.to_string(),
                    reason: "non-hex character",
                }
            })?;
        }
        Ok(Self(bytes))
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The 16 lowercase hex digits, without prefix.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for AccountAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountAddress> for String {
    fn from(value: AccountAddress) -> Self {
        value.to_string()
    }
}
