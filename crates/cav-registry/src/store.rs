//! # Voucher Store
//!
//! The mapping of [`VoucherKey`] → [`Voucher`]. At most one voucher exists
//! per key; writing to an occupied key replaces the entry.
//!
//! ## Operations
//!
//! | Operation           | Requires            | Emits                                   |
//! |---------------------|---------------------|-----------------------------------------|
//! | `create_or_replace` | `AuditorCapability` | `VoucherRemoved` (if occupied), `VoucherCreated` |
//! | `consume`           | —                   | `VoucherUsed`, `VoucherRemoved` (one-shot) |
//! | `delete`            | `AuditorCapability` | `VoucherRemoved`                        |
//! | `remove_expired`    | `AdminCapability`   | `VoucherRemoved` per removed entry      |
//!
//! A store is bound to one [`AuditorRegistry`](crate::AuditorRegistry) and
//! only accepts capabilities minted by it. Every operation validates before
//! it mutates, so a returned error leaves the store and the event sink
//! untouched.
//!
//! ## Lookup Order
//!
//! `consume` tries the account-specific key first, then the any-account key.
//! An expired entry at the first key does not block the second.

use std::collections::BTreeMap;

use cav_core::{AccountAddress, BlockHeight, CodeHash, VoucherKey, VoucherScope};
use serde::{Deserialize, Serialize};

use crate::auditor::{AdminCapability, AuditorCapability, RegistryId};
use crate::error::{Capability, RegistryError};
use crate::event::EventSink;
use crate::voucher::{Voucher, VoucherRequest};

/// Outcome of a successful consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumption {
    /// The account that deployed.
    pub account: AccountAddress,
    /// The voucher as it was when used.
    pub voucher: Voucher,
    /// Whether the voucher was removed (non-recurrent).
    pub removed: bool,
}

/// Key → voucher mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherStore {
    registry: RegistryId,
    entries: BTreeMap<VoucherKey, Voucher>,
}

impl VoucherStore {
    /// Empty store accepting capabilities minted by `registry`.
    pub fn new(registry: RegistryId) -> Self {
        Self {
            registry,
            entries: BTreeMap::new(),
        }
    }

    /// The registry whose capabilities this store accepts.
    pub fn registry(&self) -> RegistryId {
        self.registry
    }

    /// Insert a voucher, replacing any entry at the same key.
    ///
    /// The replaced entry's `VoucherRemoved` is emitted before the new
    /// entry's `VoucherCreated`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unauthorized`] if `auditor` was minted by another registry.
    pub fn create_or_replace(
        &mut self,
        auditor: &AuditorCapability,
        request: VoucherRequest,
        height: BlockHeight,
        events: &mut impl EventSink,
    ) -> Result<Voucher, RegistryError> {
        self.check_auditor(auditor)?;
        let voucher = Voucher::from_request(request, height);

        if let Some(previous) = self.entries.remove(&voucher.key) {
            tracing::info!(key = %previous.key, height = %height, "voucher replaced");
            events.emit(previous.removed_event());
        }

        tracing::info!(
            key = %voucher.key,
            auditor = %auditor.account(),
            height = %height,
            expiry = ?voucher.expiry_block_height.map(|h| h.value()),
            recurrent = voucher.recurrent,
            "voucher created"
        );
        events.emit(voucher.created_event());
        self.entries.insert(voucher.key.clone(), voucher.clone());
        Ok(voucher)
    }

    /// Use a voucher for `account` deploying `code_hash` at `height`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidVoucher`] if neither the account-specific nor
    /// the any-account key holds a usable voucher.
    pub fn consume(
        &mut self,
        account: &AccountAddress,
        code_hash: &CodeHash,
        height: BlockHeight,
        events: &mut impl EventSink,
    ) -> Result<Consumption, RegistryError> {
        let Some(voucher) = self.resolve(account, code_hash, height) else {
            tracing::debug!(
                account = %account,
                code_hash = %code_hash,
                height = %height,
                "no usable voucher"
            );
            return Err(RegistryError::InvalidVoucher {
                account: *account,
                code_hash: code_hash.clone(),
            });
        };

        let removed = !voucher.recurrent;
        if removed {
            self.entries.remove(&voucher.key);
        }

        tracing::info!(
            key = %voucher.key,
            account = %account,
            height = %height,
            removed,
            "voucher used"
        );
        events.emit(voucher.used_event(*account));
        if removed {
            events.emit(voucher.removed_event());
        }

        Ok(Consumption {
            account: *account,
            voucher,
            removed,
        })
    }

    /// Remove the voucher at `key`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unauthorized`] if `auditor` was minted by another
    /// registry, [`RegistryError::NotFound`] if the key has no entry.
    pub fn delete(
        &mut self,
        auditor: &AuditorCapability,
        key: &VoucherKey,
        events: &mut impl EventSink,
    ) -> Result<Voucher, RegistryError> {
        self.check_auditor(auditor)?;
        let voucher = self
            .entries
            .remove(key)
            .ok_or_else(|| RegistryError::NotFound { key: key.clone() })?;
        tracing::info!(key = %key, auditor = %auditor.account(), "voucher deleted");
        events.emit(voucher.removed_event());
        Ok(voucher)
    }

    /// Remove the voucher for `(scope, code_hash)`. Equivalent to
    /// [`delete`](Self::delete) with the derived key.
    pub fn delete_scoped(
        &mut self,
        auditor: &AuditorCapability,
        scope: VoucherScope,
        code_hash: CodeHash,
        events: &mut impl EventSink,
    ) -> Result<Voucher, RegistryError> {
        self.delete(auditor, &VoucherKey::derive(scope, code_hash), events)
    }

    /// Remove every voucher expired at `height`, in key order. Returns the count.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unauthorized`] if `admin` was minted by another registry.
    pub(crate) fn remove_expired(
        &mut self,
        admin: &AdminCapability,
        height: BlockHeight,
        events: &mut impl EventSink,
    ) -> Result<usize, RegistryError> {
        if admin.registry() != self.registry {
            return Err(self.foreign(admin.account(), Capability::Admin));
        }
        let expired: Vec<VoucherKey> = self
            .entries
            .values()
            .filter(|v| v.is_expired(height))
            .map(|v| v.key.clone())
            .collect();

        for key in &expired {
            if let Some(voucher) = self.entries.remove(key) {
                tracing::info!(key = %key, height = %height, "expired voucher removed");
                events.emit(voucher.removed_event());
            }
        }
        Ok(expired.len())
    }

    /// The voucher at `key`, if any.
    pub fn get(&self, key: &VoucherKey) -> Option<&Voucher> {
        self.entries.get(key)
    }

    /// Number of stored vouchers, including expired ones not yet swept.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All vouchers in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Voucher> {
        self.entries.values()
    }

    fn check_auditor(&self, auditor: &AuditorCapability) -> Result<(), RegistryError> {
        if auditor.registry() != self.registry {
            return Err(self.foreign(auditor.account(), Capability::Auditor));
        }
        Ok(())
    }

    fn foreign(&self, account: &AccountAddress, capability: Capability) -> RegistryError {
        tracing::debug!(
            account = %account,
            registry = %self.registry,
            "capability from foreign registry refused"
        );
        RegistryError::Unauthorized {
            account: *account,
            capability,
        }
    }

    fn resolve(
        &self,
        account: &AccountAddress,
        code_hash: &CodeHash,
        height: BlockHeight,
    ) -> Option<Voucher> {
        [
            VoucherScope::SpecificAccount(*account),
            VoucherScope::AnyAccount,
        ]
        .into_iter()
        .filter_map(|scope| self.get(&VoucherKey::derive(scope, code_hash.clone())))
        .find(|v| v.is_usable_by(account, code_hash, height))
        .cloned()
    }
}
