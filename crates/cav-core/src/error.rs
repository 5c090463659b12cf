//! # Validation Errors
//!
//! Errors raised when constructing the validated newtypes of this crate.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations and carry the rejected input verbatim.

use thiserror::Error;

/// A value failed format validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account address is not 1–16 hex digits (optionally `0x`-prefixed).
    #[error("invalid account address {input:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Code hash is not a 64-digit lowercase hex string.
    #[error("invalid code hash {input:?}: expected 64 lowercase hex digits")]
    InvalidCodeHash {
        /// The rejected input.
        input: String,
    },

    /// Voucher key does not match `0x<address>-<hash>` or `any-<hash>`.
    #[error("invalid voucher key {input:?}: {reason}")]
    InvalidVoucherKey {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}
