//! # cav-core — Foundational Types for Contract Audit Vouchers
//!
//! This crate defines the primitives shared by every other crate in the
//! workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `AccountAddress`,
//!    `BlockHeight`, `CodeHash`, `VoucherKey` — all newtypes with validated
//!    constructors. No bare strings for identifiers.
//!
//! 2. **Scope is a sum type.** `VoucherScope::SpecificAccount(address)` or
//!    `VoucherScope::AnyAccount`. No sentinel strings.
//!
//! 3. **Key derivation is bit-exact.** `VoucherKey::derive()` produces
//!    `0x<address>-<hash>` or `any-<hash>`. These strings appear verbatim in
//!    emitted events.
//!
//! 4. **Code hashing sits behind a trait.** `CodeHasher` is the seam for the
//!    ledger runtime; `Sha3CodeHasher` is the SHA3-256 implementation.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cav-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod address;
pub mod digest;
pub mod error;
pub mod height;
pub mod key;

// Re-export primary types for ergonomic imports.
pub use address::{AccountAddress, ADDRESS_HEX_LEN};
pub use digest::{sha3_256_hex, CodeHash, CodeHasher, Sha3CodeHasher};
pub use error::ValidationError;
pub use height::BlockHeight;
pub use key::{VoucherKey, VoucherScope, ANY_ACCOUNT_PREFIX};
