//! # Block Heights
//!
//! The only notion of time the voucher registry has. Heights are supplied
//! by the caller on every operation that needs one; nothing in this
//! workspace reads a clock.

use serde::{Deserialize, Serialize};

/// A ledger block height.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// Height `offset` blocks after this one, saturating at `u64::MAX`.
    pub fn saturating_add(self, offset: u64) -> Self {
        Self(self.0.saturating_add(offset))
    }

    /// The raw height.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for BlockHeight {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
