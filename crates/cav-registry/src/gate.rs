//! # Deployment Gate
//!
//! A deploy attempt hashes the submitted code and consumes a matching
//! voucher. Installing the contract is the ledger runtime's job; a returned
//! [`DeployAuthorization`] is its permission to do so.

use cav_core::{AccountAddress, BlockHeight, CodeHash, CodeHasher, Sha3CodeHasher};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::event::EventSink;
use crate::store::{Consumption, VoucherStore};

/// Permission to install `code_hash` on `consumption.account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployAuthorization {
    /// Hash of the authorized code.
    pub code_hash: CodeHash,
    /// The voucher use that granted it.
    pub consumption: Consumption,
}

/// Hashes code and consumes vouchers.
#[derive(Debug, Clone, Default)]
pub struct DeploymentGate<H = Sha3CodeHasher> {
    hasher: H,
}

impl DeploymentGate<Sha3CodeHasher> {
    /// Gate using SHA3-256 code hashes.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: CodeHasher> DeploymentGate<H> {
    /// Gate using a custom hasher.
    pub fn with_hasher(hasher: H) -> Self {
        Self { hasher }
    }

    /// The hasher used for submitted code.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Authorize deploying `code` to `account` at `height`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidVoucher`] when no usable voucher exists.
    pub fn deploy(
        &self,
        store: &mut VoucherStore,
        account: &AccountAddress,
        code: &str,
        height: BlockHeight,
        events: &mut impl EventSink,
    ) -> Result<DeployAuthorization, RegistryError> {
        let code_hash = self.hasher.hash(code);
        let consumption = store.consume(account, &code_hash, height, events)?;
        Ok(DeployAuthorization {
            code_hash,
            consumption,
        })
    }
}
