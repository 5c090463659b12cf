//! # Vouchers
//!
//! A voucher authorizes deploying one exact code hash, to one account or to
//! any account, optionally until an expiry height.
//!
//! ## Usability
//!
//! ```text
//! usable(v, account, hash, h)  ⇔  v.code_hash == hash
//!                               ∧  (v.expiry = ∅  ∨  h ≤ v.expiry)
//!                               ∧  v.scope admits account
//! ```

use cav_core::{AccountAddress, BlockHeight, CodeHash, VoucherKey, VoucherScope};
use serde::{Deserialize, Serialize};

use crate::event::VoucherEvent;

/// What an auditor asks the store to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherRequest {
    /// Which accounts may deploy.
    pub scope: VoucherScope,
    /// Hash of the audited code.
    pub code_hash: CodeHash,
    /// Whether the voucher survives consumption.
    pub recurrent: bool,
    /// Blocks of validity after the creating height. `None` or `0` means no expiry.
    pub expiry_offset: Option<u64>,
}

/// A stored authorization to deploy one code hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Derived from `scope` and `code_hash`.
    pub key: VoucherKey,
    /// Which accounts may deploy.
    pub scope: VoucherScope,
    /// Hash of the audited code.
    pub code_hash: CodeHash,
    /// Last height at which the voucher is usable; `None` never expires.
    pub expiry_block_height: Option<BlockHeight>,
    /// Whether the voucher survives consumption.
    pub recurrent: bool,
}

impl Voucher {
    /// Build a voucher, deriving its key.
    pub fn new(
        scope: VoucherScope,
        code_hash: CodeHash,
        recurrent: bool,
        expiry_block_height: Option<BlockHeight>,
    ) -> Self {
        Self {
            key: VoucherKey::derive(scope, code_hash.clone()),
            scope,
            code_hash,
            expiry_block_height,
            recurrent,
        }
    }

    /// Build a voucher from a request issued at `height`.
    pub fn from_request(request: VoucherRequest, height: BlockHeight) -> Self {
        let expiry = expiry_height(height, request.expiry_offset);
        Self::new(request.scope, request.code_hash, request.recurrent, expiry)
    }

    /// Expired once the height has moved strictly past the expiry.
    pub fn is_expired(&self, height: BlockHeight) -> bool {
        matches!(self.expiry_block_height, Some(expiry) if expiry < height)
    }

    /// Whether `account` may deploy `code_hash` with this voucher at `height`.
    pub fn is_usable_by(
        &self,
        account: &AccountAddress,
        code_hash: &CodeHash,
        height: BlockHeight,
    ) -> bool {
        self.code_hash == *code_hash && !self.is_expired(height) && self.scope.admits(account)
    }

    pub(crate) fn created_event(&self) -> VoucherEvent {
        VoucherEvent::VoucherCreated {
            address: self.scope.address().copied(),
            code_hash: self.code_hash.clone(),
            expiry_block_height: self.expiry_block_height,
            recurrent: self.recurrent,
        }
    }

    pub(crate) fn used_event(&self, account: AccountAddress) -> VoucherEvent {
        VoucherEvent::VoucherUsed {
            address: account,
            key: self.key.clone(),
            expiry_block_height: self.expiry_block_height,
            recurrent: self.recurrent,
        }
    }

    pub(crate) fn removed_event(&self) -> VoucherEvent {
        VoucherEvent::VoucherRemoved {
            key: self.key.clone(),
            expiry_block_height: self.expiry_block_height,
            recurrent: self.recurrent,
        }
    }
}

/// Expiry for a voucher created at `height` with `offset`.
///
/// `height + offset` when the offset is positive, otherwise no expiry.
pub fn expiry_height(height: BlockHeight, offset: Option<u64>) -> Option<BlockHeight> {
    offset
        .filter(|offset| *offset > 0)
        .map(|offset| height.saturating_add(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cav_core::{CodeHasher, Sha3CodeHasher};
    use proptest::prelude::*;

    fn hash() -> CodeHash {
        Sha3CodeHasher.hash("contract CodyCode {}")
    }

    fn developer() -> AccountAddress {
        AccountAddress::parse("01cf0e2f2f715450").unwrap()
    }

    #[test]
    fn zero_offset_never_expires() {
        assert_eq!(expiry_height(BlockHeight(8), Some(0)), None);
        assert_eq!(expiry_height(BlockHeight(8), None), None);
    }

    #[test]
    fn expiry_is_inclusive() {
        let v = Voucher::new(VoucherScope::AnyAccount, hash(), true, Some(BlockHeight(10)));
        assert!(!v.is_expired(BlockHeight(9)));
        assert!(!v.is_expired(BlockHeight(10)));
        assert!(v.is_expired(BlockHeight(11)));
    }

    #[test]
    fn no_expiry_is_never_expired() {
        let v = Voucher::new(VoucherScope::AnyAccount, hash(), true, None);
        assert!(!v.is_expired(BlockHeight(u64::MAX)));
    }

    #[test]
    fn usable_requires_matching_hash_and_scope() {
        let v = Voucher::new(
            VoucherScope::SpecificAccount(developer()),
            hash(),
            false,
            Some(BlockHeight(19)),
        );
        let other = AccountAddress::parse("179b6b1cb6755e31").unwrap();
        let other_hash = Sha3CodeHasher.hash("contract Other {}");

        assert!(v.is_usable_by(&developer(), &hash(), BlockHeight(12)));
        assert!(!v.is_usable_by(&other, &hash(), BlockHeight(12)));
        assert!(!v.is_usable_by(&developer(), &other_hash, BlockHeight(12)));
        assert!(!v.is_usable_by(&developer(), &hash(), BlockHeight(20)));
    }

    #[test]
    fn from_request_derives_key_and_expiry() {
        let v = Voucher::from_request(
            VoucherRequest {
                scope: VoucherScope::SpecificAccount(developer()),
                code_hash: hash(),
                recurrent: false,
                expiry_offset: Some(10),
            },
            BlockHeight(9),
        );
        assert_eq!(v.expiry_block_height, Some(BlockHeight(19)));
        assert_eq!(
            v.key,
            VoucherKey::derive(VoucherScope::SpecificAccount(developer()), hash())
        );
    }

    proptest! {
        #[test]
        fn positive_offset_adds_to_height(height in 0u64..1_000_000, offset in 1u64..1_000_000) {
            prop_assert_eq!(
                expiry_height(BlockHeight(height), Some(offset)),
                Some(BlockHeight(height + offset))
            );
        }

        #[test]
        fn fresh_voucher_is_usable_at_creation(height in 0u64..1_000_000, offset in 0u64..1_000) {
            let v = Voucher::from_request(
                VoucherRequest {
                    scope: VoucherScope::AnyAccount,
                    code_hash: hash(),
                    recurrent: false,
                    expiry_offset: Some(offset),
                },
                BlockHeight(height),
            );
            prop_assert!(v.is_usable_by(&developer(), &hash(), BlockHeight(height)));
        }
    }
}
