//! # Cleanup Sweeper
//!
//! Admin maintenance pass removing vouchers expired as of the height at call
//! time. One linear pass per call; a voucher still valid now is left for a
//! later sweep.

use cav_core::BlockHeight;

use crate::auditor::AdminCapability;
use crate::error::RegistryError;
use crate::event::EventSink;
use crate::store::VoucherStore;

/// Removes expired vouchers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupSweeper;

impl CleanupSweeper {
    /// Remove every voucher whose expiry is strictly below `height`.
    ///
    /// Emits one `VoucherRemoved` per removed entry and returns the count.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unauthorized`] if `admin` was not minted by the
    /// registry `store` is bound to.
    pub fn sweep(
        &self,
        admin: &AdminCapability,
        store: &mut VoucherStore,
        height: BlockHeight,
        events: &mut impl EventSink,
    ) -> Result<usize, RegistryError> {
        let before = store.count();
        let removed = store.remove_expired(admin, height, events)?;
        tracing::info!(
            admin = %admin.account(),
            height = %height,
            before,
            removed,
            "expired vouchers swept"
        );
        Ok(removed)
    }
}
