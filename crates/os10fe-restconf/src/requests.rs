//! Typed configuration requests.
//!
//! Each logical write the reconciler can issue is a typed value with a
//! single serialization function producing the RESTCONF body. Keeping the
//! protocol shape here isolates it from reconciliation logic: the engine
//! decides *what* to write, this module decides how that looks on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::records::{ethernet_slot_path, port_channel_name, vlan_name};
use crate::records::{ETHERNET_IF_TYPE, PORT_CHANNEL_IF_TYPE, VLAN_IF_TYPE};

/// Switchport mode of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    /// The port carries exactly one untagged VLAN.
    Access,
    /// The port carries multiple tagged VLANs.
    Trunk,
}

impl PortMode {
    /// Returns the mode as used in RESTCONF payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            PortMode::Access => "access",
            PortMode::Trunk => "trunk",
        }
    }
}

/// Create a VLAN interface by numeric id.
#[derive(Debug, Clone)]
pub struct CreateVlan {
    pub vlan_id: u32,
    pub description: Option<String>,
    pub enabled: bool,
}

/// Tag a VLAN onto a port (Ethernet or port-channel).
///
/// Access mode writes the untagged member list, trunk mode the tagged one.
#[derive(Debug, Clone)]
pub struct TagVlanOnPort {
    pub vlan_id: u32,
    pub port: String,
    pub mode: PortMode,
}

/// Create a port-channel with its L2/LACP/spanning-tree attributes.
#[derive(Debug, Clone)]
pub struct CreatePortChannel {
    pub channel_id: u32,
    pub description: Option<String>,
    pub enabled: bool,
    pub mode: PortMode,
    pub mtu: Option<u32>,
    /// VLT pairing id, conventionally mirroring the channel id.
    pub vlt_port_channel_id: Option<u32>,
    pub lacp_fallback: bool,
    pub lacp_timeout: Option<u32>,
    pub lacp_preempt: Option<bool>,
    /// Spanning-tree edge port, set for host-facing LAGs.
    pub edge_port: bool,
    /// BPDU guard, set for host-facing LAGs.
    pub bpdu_guard: bool,
}

/// Bond an Ethernet interface into a port-channel (channel-group).
#[derive(Debug, Clone)]
pub struct AttachMemberPort {
    pub channel_id: u32,
    pub ethernet_port: String,
}

/// Configure a physical Ethernet interface's leaf attributes.
#[derive(Debug, Clone)]
pub struct ConfigureEthernet {
    pub port: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub mtu: u32,
    pub flow_control_receive: bool,
    pub flow_control_transmit: bool,
    /// A LAG member must not itself bridge; demote it to a non-switching
    /// member-only role.
    pub disable_switch_port: bool,
}

/// Any configuration write the gateway can carry.
#[derive(Debug, Clone)]
pub enum InterfaceRequest {
    CreateVlan(CreateVlan),
    TagVlan(TagVlanOnPort),
    CreatePortChannel(CreatePortChannel),
    AttachMember(AttachMemberPort),
    ConfigureEthernet(ConfigureEthernet),
}

fn envelope(interface: Value) -> Value {
    json!({
        "ietf-interfaces:interfaces": {
            "interface": [interface]
        }
    })
}

impl CreateVlan {
    fn body(&self) -> Value {
        let mut interface = Map::new();
        interface.insert("name".into(), json!(vlan_name(self.vlan_id)));
        interface.insert("type".into(), json!(VLAN_IF_TYPE));
        if let Some(description) = &self.description {
            interface.insert("description".into(), json!(description));
        }
        interface.insert("enabled".into(), json!(self.enabled));
        envelope(Value::Object(interface))
    }
}

impl TagVlanOnPort {
    fn body(&self) -> Value {
        let members = match self.mode {
            PortMode::Access => "dell-interface:untagged-ports",
            PortMode::Trunk => "dell-interface:tagged-ports",
        };
        envelope(json!({
            "name": vlan_name(self.vlan_id),
            members: [self.port],
        }))
    }
}

impl CreatePortChannel {
    fn body(&self) -> Value {
        let mut interface = Map::new();
        interface.insert("name".into(), json!(port_channel_name(self.channel_id)));
        interface.insert("type".into(), json!(PORT_CHANNEL_IF_TYPE));
        if let Some(description) = &self.description {
            interface.insert("description".into(), json!(description));
        }
        interface.insert("enabled".into(), json!(self.enabled));
        interface.insert("dell-interface:mode".into(), json!(self.mode.as_str()));
        if let Some(mtu) = self.mtu {
            interface.insert("dell-interface:mtu".into(), json!(mtu));
        }
        if let Some(vlt_id) = self.vlt_port_channel_id {
            interface.insert(
                "dell-vlt:vlt-port-channel".into(),
                json!({ "vlt-port-channel-id": vlt_id }),
            );
        }
        if self.lacp_fallback {
            interface.insert("dell-lacp:lacp-fallback".into(), json!(true));
        }
        if let Some(timeout) = self.lacp_timeout {
            interface.insert("dell-lacp:lacp-timeout".into(), json!(timeout));
        }
        if let Some(preempt) = self.lacp_preempt {
            interface.insert("dell-lacp:lacp-preempt".into(), json!(preempt));
        }
        if self.edge_port {
            interface.insert("dell-xstp:edge-port".into(), json!(true));
        }
        if self.bpdu_guard {
            interface.insert("dell-xstp:bpdu-guard".into(), json!(true));
        }
        envelope(Value::Object(interface))
    }
}

impl AttachMemberPort {
    fn body(&self) -> Value {
        envelope(json!({
            "name": port_channel_name(self.channel_id),
            "dell-interface:member-ports": [self.ethernet_port],
        }))
    }
}

impl ConfigureEthernet {
    fn body(&self) -> Value {
        let mut interface = Map::new();
        interface.insert("name".into(), json!(ethernet_slot_path(&self.port)));
        interface.insert("type".into(), json!(ETHERNET_IF_TYPE));
        if let Some(description) = &self.description {
            interface.insert("description".into(), json!(description));
        }
        interface.insert("enabled".into(), json!(self.enabled));
        interface.insert("dell-interface:mtu".into(), json!(self.mtu));
        interface.insert(
            "dell-interface:flow-control-receive".into(),
            json!(self.flow_control_receive),
        );
        interface.insert(
            "dell-interface:flow-control-transmit".into(),
            json!(self.flow_control_transmit),
        );
        if self.disable_switch_port {
            interface.insert("dell-interface:switchport".into(), json!(false));
        }
        envelope(Value::Object(interface))
    }
}

impl InterfaceRequest {
    /// Serializes the request into its RESTCONF body.
    pub fn body(&self) -> Value {
        match self {
            InterfaceRequest::CreateVlan(r) => r.body(),
            InterfaceRequest::TagVlan(r) => r.body(),
            InterfaceRequest::CreatePortChannel(r) => r.body(),
            InterfaceRequest::AttachMember(r) => r.body(),
            InterfaceRequest::ConfigureEthernet(r) => r.body(),
        }
    }

    /// Short operation label for logging and write capture.
    pub fn describe(&self) -> String {
        match self {
            InterfaceRequest::CreateVlan(r) => {
                format!("create-vlan {}", vlan_name(r.vlan_id))
            }
            InterfaceRequest::TagVlan(r) => format!(
                "tag-vlan {} {} {}",
                vlan_name(r.vlan_id),
                r.mode.as_str(),
                r.port
            ),
            InterfaceRequest::CreatePortChannel(r) => {
                format!("create-port-channel {}", port_channel_name(r.channel_id))
            }
            InterfaceRequest::AttachMember(r) => format!(
                "attach-member {} {}",
                port_channel_name(r.channel_id),
                r.ethernet_port
            ),
            InterfaceRequest::ConfigureEthernet(r) => {
                format!("configure-ethernet {}", r.port)
            }
        }
    }
}
