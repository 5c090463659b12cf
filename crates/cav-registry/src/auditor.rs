//! # Auditor Registry
//!
//! Tracks which accounts may issue vouchers and who administers them.
//!
//! ## Capabilities
//!
//! Write paths take a capability token instead of a bare account:
//!
//! - [`AdminCapability`] — minted by [`AuditorRegistry::admin_capability()`]
//!   for the configured admin account only.
//! - [`AuditorCapability`] — minted by [`AuditorRegistry::auditor_capability()`]
//!   for authorized auditors only.
//!
//! Neither token can be constructed outside this module. Each token carries
//! the [`RegistryId`] of the registry that minted it, and every write path
//! rejects tokens from any other registry.
//!
//! ## Proxies
//!
//! An account first initializes an auditor proxy, then the admin authorizes
//! it. When `require_auditor_proxy` is set, authorizing an account without a
//! proxy fails with [`RegistryError::MissingAuditorProxy`].
//!
//! Authorizations are never revoked.

use std::collections::{BTreeMap, BTreeSet};

use cav_core::{AccountAddress, BlockHeight};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ReauthorizationPolicy, RegistryConfig};
use crate::error::{Capability, RegistryError};
use crate::event::{EventSink, VoucherEvent};

/// Unique identifier of an [`AuditorRegistry`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryId(pub Uuid);

impl RegistryId {
    /// Generate a new random registry identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RegistryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RegistryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof that the holder is the registry admin.
#[derive(Debug)]
pub struct AdminCapability {
    account: AccountAddress,
    registry: RegistryId,
}

impl AdminCapability {
    /// The admin account.
    pub fn account(&self) -> &AccountAddress {
        &self.account
    }

    /// The registry that minted this capability.
    pub fn registry(&self) -> RegistryId {
        self.registry
    }
}

/// Proof that the holder is an authorized auditor.
#[derive(Debug)]
pub struct AuditorCapability {
    account: AccountAddress,
    registry: RegistryId,
}

impl AuditorCapability {
    /// The auditor account.
    pub fn account(&self) -> &AccountAddress {
        &self.account
    }

    /// The registry that minted this capability.
    pub fn registry(&self) -> RegistryId {
        self.registry
    }
}

/// Record of an account holding auditor capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorAuthorization {
    /// The auditor account.
    pub account: AccountAddress,
    /// Height of the authorizing transaction.
    pub authorized_at: BlockHeight,
}

/// The set of proxies and authorized auditors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorRegistry {
    id: RegistryId,
    admin: AccountAddress,
    reauthorization: ReauthorizationPolicy,
    require_proxy: bool,
    proxies: BTreeSet<AccountAddress>,
    auditors: BTreeMap<AccountAddress, AuditorAuthorization>,
}

impl AuditorRegistry {
    /// Empty registry administered per `config`.
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            id: RegistryId::new(),
            admin: config.admin,
            reauthorization: config.reauthorization,
            require_proxy: config.require_auditor_proxy,
            proxies: BTreeSet::new(),
            auditors: BTreeMap::new(),
        }
    }

    /// Identifier carried by every capability this registry mints.
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// The admin account.
    pub fn admin(&self) -> &AccountAddress {
        &self.admin
    }

    /// Mint an admin capability for `caller`, if it is the admin.
    pub fn admin_capability(
        &self,
        caller: &AccountAddress,
    ) -> Result<AdminCapability, RegistryError> {
        if *caller != self.admin {
            tracing::debug!(account = %caller, "admin capability refused");
            return Err(RegistryError::Unauthorized {
                account: *caller,
                capability: Capability::Admin,
            });
        }
        Ok(AdminCapability {
            account: *caller,
            registry: self.id,
        })
    }

    /// Mint an auditor capability for `caller`, if it is an authorized auditor.
    pub fn auditor_capability(
        &self,
        caller: &AccountAddress,
    ) -> Result<AuditorCapability, RegistryError> {
        if !self.is_auditor(caller) {
            tracing::debug!(account = %caller, "auditor capability refused");
            return Err(RegistryError::Unauthorized {
                account: *caller,
                capability: Capability::Auditor,
            });
        }
        Ok(AuditorCapability {
            account: *caller,
            registry: self.id,
        })
    }

    /// Register an auditor proxy for `account`. Returns `false` if one already existed.
    pub fn register_proxy(&mut self, account: AccountAddress) -> bool {
        let inserted = self.proxies.insert(account);
        if inserted {
            tracing::info!(account = %account, "auditor proxy initialized");
        }
        inserted
    }

    /// Whether `account` has initialized a proxy.
    pub fn has_proxy(&self, account: &AccountAddress) -> bool {
        self.proxies.contains(account)
    }

    /// Grant auditor capability to `account`.
    ///
    /// Emits `AuditorCreated`. Re-authorizing follows the configured
    /// [`ReauthorizationPolicy`]; under `Idempotent` the original
    /// authorization record is kept and returned.
    pub fn authorize(
        &mut self,
        admin: &AdminCapability,
        account: AccountAddress,
        height: BlockHeight,
        events: &mut impl EventSink,
    ) -> Result<AuditorAuthorization, RegistryError> {
        if admin.registry != self.id || admin.account != self.admin {
            return Err(RegistryError::Unauthorized {
                account: admin.account,
                capability: Capability::Admin,
            });
        }
        if self.require_proxy && !self.has_proxy(&account) {
            return Err(RegistryError::MissingAuditorProxy { account });
        }

        if let Some(existing) = self.auditors.get(&account) {
            return match self.reauthorization {
                ReauthorizationPolicy::Idempotent => {
                    tracing::debug!(account = %account, "auditor re-authorized");
                    events.emit(VoucherEvent::AuditorCreated { address: account });
                    Ok(existing.clone())
                }
                ReauthorizationPolicy::Reject => Err(RegistryError::AlreadyAuthorized { account }),
            };
        }

        let authorization = AuditorAuthorization {
            account,
            authorized_at: height,
        };
        self.auditors.insert(account, authorization.clone());
        tracing::info!(account = %account, height = %height, "auditor authorized");
        events.emit(VoucherEvent::AuditorCreated { address: account });
        Ok(authorization)
    }

    /// Whether `account` holds auditor capability.
    pub fn is_auditor(&self, account: &AccountAddress) -> bool {
        self.auditors.contains_key(account)
    }

    /// All authorizations, ordered by account.
    pub fn auditors(&self) -> impl Iterator<Item = &AuditorAuthorization> {
        self.auditors.values()
    }
}
