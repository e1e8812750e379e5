//! # fabricmgrd - OS10-FE fabric reconciliation agent
//!
//! Converges leaf/spine Dell OS10 switch pairs onto the fabric state a host
//! attachment requires: the tenant VLAN, a server-facing LAG or direct port
//! attachment, the physical Ethernet configuration, and VLAN tagging on the
//! static uplink LAGs.
//!
//! ## Reconciliation model
//! - One manager instance drives exactly one switch; requests naming any
//!   other switch address are silent no-ops
//! - Every operation starts from a single bulk interface snapshot and
//!   issues only the writes that close the observed gap
//! - A converged switch produces zero writes; post-commit callbacks (such
//!   as saving running config to startup) fire only after a mutation
//! - No internal retries; failed writes surface to the caller

pub mod allocator;
pub mod callback;
pub mod fabric_mgr;
pub mod snapshot;

pub use callback::{FabricCallback, WriteMemoryCallback};
pub use fabric_mgr::{
    AttachmentRequest, ConvergeReport, DeleteVlanRequest, DetachRequest, FabricManager,
};
pub use snapshot::SwitchSnapshot;
