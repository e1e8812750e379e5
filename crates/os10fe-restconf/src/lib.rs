//! RESTCONF device gateway for Dell OS10 front-end switches.
//!
//! This crate is the serialization boundary between the fabric
//! reconciliation engine and the switch management protocol:
//!
//! - [`records`]: read-side interface records and name helpers
//! - [`requests`]: typed configuration writes, one serialization per kind
//! - [`client`]: the [`DeviceGateway`] trait and its [`RestconfClient`]
//!   implementation over HTTPS with basic auth
//!
//! The engine depends only on the logical shape exposed here; field names
//! and paths of the device model never leak into reconciliation logic.

pub mod client;
pub mod records;
pub mod requests;

pub use client::{DeviceGateway, RestconfClient};
pub use records::{InterfaceKind, InterfaceListing, InterfaceRecord};
pub use requests::{
    AttachMemberPort, ConfigureEthernet, CreatePortChannel, CreateVlan, InterfaceRequest,
    PortMode, TagVlanOnPort,
};
