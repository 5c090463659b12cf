//! # Code Hashes
//!
//! A voucher covers one exact contract source text, identified by the
//! SHA3-256 digest of its UTF-8 bytes rendered as 64 lowercase hex digits.
//!
//! Hashing is an external collaborator in a real ledger runtime, so it
//! sits behind the [`CodeHasher`] trait. [`Sha3CodeHasher`] is the
//! implementation the ledger uses; tests may substitute their own.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::error::ValidationError;

/// Hex digest of a contract's source text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodeHash(String);

impl CodeHash {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Accept an existing hex digest. Uppercase digits are normalized.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        if s.len() != Self::HEX_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidCodeHash {
                input: s.to_string(),
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The digest as lowercase hex.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CodeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CodeHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for CodeHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<CodeHash> for String {
    fn from(value: CodeHash) -> Self {
        value.0
    }
}

/// Deterministic one-way hash of contract source.
pub trait CodeHasher {
    /// Hash the exact source text.
    fn hash(&self, code: &str) -> CodeHash;
}

/// SHA3-256 over the UTF-8 bytes of the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha3CodeHasher;

impl CodeHasher for Sha3CodeHasher {
    fn hash(&self, code: &str) -> CodeHash {
        CodeHash(sha3_256_hex(code.as_bytes()))
    }
}

/// Compute a SHA3-256 digest as lowercase hex.
pub fn sha3_256_hex(data: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
