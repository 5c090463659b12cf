//! # cav-registry — Voucher Registry and Deployment Gate
//!
//! Deployment of a contract succeeds only if an auditor issued a matching,
//! non-expired voucher for the deploying account and the exact code.
//!
//! ## Components
//!
//! - **Auditors** (`auditor.rs`): admin-granted auditor capability, proxy
//!   initialization, and the unforgeable [`AdminCapability`] /
//!   [`AuditorCapability`] tokens the write paths demand.
//!
//! - **Store** (`store.rs`): key → voucher mapping with create/replace,
//!   consume (one-shot or recurrent), delete, and expiry removal.
//!
//! - **Gate** (`gate.rs`): hashes submitted code and consumes a voucher.
//!
//! - **Sweeper** (`sweep.rs`): admin pass removing vouchers expired at the
//!   current height.
//!
//! - **Ledger** (`ledger.rs`): one session object owning all of the above,
//!   executing each operation as a transaction at a block height.
//!
//! ## Design
//!
//! There is no global state. The current block height is an explicit input
//! to every operation that reads it, and events go to a caller-supplied
//! [`EventSink`]. A failed operation mutates nothing and emits nothing.

pub mod auditor;
pub mod config;
pub mod error;
pub mod event;
pub mod gate;
pub mod ledger;
pub mod store;
pub mod sweep;
pub mod voucher;

// ─── Auditor re-exports ─────────────────────────────────────────────

pub use auditor::{AdminCapability, AuditorAuthorization, AuditorCapability, AuditorRegistry};

// ─── Configuration and error re-exports ─────────────────────────────

pub use config::{ReauthorizationPolicy, RegistryConfig, SERVICE_ACCOUNT};
pub use error::{Capability, RegistryError};

// ─── Voucher re-exports ─────────────────────────────────────────────

pub use event::{EventSink, VoucherEvent, CONTRACT_NAME};
pub use gate::{DeployAuthorization, DeploymentGate};
pub use store::{Consumption, VoucherStore};
pub use sweep::CleanupSweeper;
pub use voucher::{expiry_height, Voucher, VoucherRequest};

// ─── Ledger re-exports ──────────────────────────────────────────────

pub use ledger::{AuditLedger, DeleteTarget, JournalEntry, NewAudit, Receipt};
