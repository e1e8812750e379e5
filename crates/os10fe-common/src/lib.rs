//! Shared infrastructure for the OS10-FE fabric agent.
//!
//! This crate provides the pieces every other crate in the workspace needs:
//!
//! - [`error`]: the [`FabricError`] taxonomy and [`FabricResult`] alias
//! - [`config`]: the immutable [`FabricConfig`] loaded once at startup
//!
//! The configuration carries the managed switch address, its leaf/spine
//! category, the allocatable port-channel window, and the operator-supplied
//! static uplink mappings. It is constructed once and passed by reference
//! into the fabric manager; there is no ambient/global lookup anywhere in
//! reconciliation logic.

pub mod config;
pub mod error;

pub use config::{
    AllocationStrategy, FabricConfig, PortChannelRange, SwitchCategory,
};
pub use error::{FabricError, FabricResult};
