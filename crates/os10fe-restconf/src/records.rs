//! Interface records as returned by the bulk RESTCONF listing.
//!
//! A record is the read-side view of one configurable object on one switch.
//! The kind is carried by the `type` discriminator; the numeric suffix of
//! the name is the allocatable identity and the only portable correlation
//! key across a switch pair.

use serde::{Deserialize, Serialize};

/// IANA discriminator for VLAN interfaces.
pub const VLAN_IF_TYPE: &str = "iana-if-type:l2vlan";

/// IANA discriminator for port-channel (LAG) interfaces.
pub const PORT_CHANNEL_IF_TYPE: &str = "iana-if-type:ieee8023adLag";

/// IANA discriminator for physical Ethernet interfaces.
pub const ETHERNET_IF_TYPE: &str = "iana-if-type:ethernetCsmacd";

/// Name prefix of VLAN interfaces.
pub const VLAN_PREFIX: &str = "vlan";

/// Name prefix of port-channel interfaces.
pub const PORT_CHANNEL_PREFIX: &str = "port-channel";

/// Name prefix of Ethernet interfaces.
pub const ETHERNET_PREFIX: &str = "ethernet";

/// The implicit default VLAN every switch port falls back to.
pub const DEFAULT_VLAN_ID: u32 = 1;

/// Interface kind, one per name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    /// Logical Layer-2 broadcast-domain endpoint (`vlan<N>`).
    Vlan,
    /// Link aggregate (`port-channel<N>`).
    PortChannel,
    /// Physical port (`ethernet<chassis>/<slot>/<port>[:<subindex>]`).
    Ethernet,
}

impl InterfaceKind {
    /// Returns the IANA `type` discriminator for this kind.
    pub fn iana_type(&self) -> &'static str {
        match self {
            InterfaceKind::Vlan => VLAN_IF_TYPE,
            InterfaceKind::PortChannel => PORT_CHANNEL_IF_TYPE,
            InterfaceKind::Ethernet => ETHERNET_IF_TYPE,
        }
    }

    /// Maps an IANA `type` discriminator back to a kind.
    pub fn from_iana(if_type: &str) -> Option<Self> {
        match if_type {
            VLAN_IF_TYPE => Some(InterfaceKind::Vlan),
            PORT_CHANNEL_IF_TYPE => Some(InterfaceKind::PortChannel),
            ETHERNET_IF_TYPE => Some(InterfaceKind::Ethernet),
            _ => None,
        }
    }

    /// Returns the name prefix for this kind.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            InterfaceKind::Vlan => VLAN_PREFIX,
            InterfaceKind::PortChannel => PORT_CHANNEL_PREFIX,
            InterfaceKind::Ethernet => ETHERNET_PREFIX,
        }
    }
}

/// Builds a VLAN interface name from its numeric id.
pub fn vlan_name(vlan_id: u32) -> String {
    format!("{}{}", VLAN_PREFIX, vlan_id)
}

/// Builds a port-channel interface name from its channel id.
pub fn port_channel_name(channel_id: u32) -> String {
    format!("{}{}", PORT_CHANNEL_PREFIX, channel_id)
}

/// Extracts the numeric suffix of a kind-prefixed interface name.
///
/// Returns `None` for Ethernet names (their identity is the slot path, not
/// a single number) and for names that do not carry the kind's prefix.
pub fn numeric_id(name: &str, kind: InterfaceKind) -> Option<u32> {
    if kind == InterfaceKind::Ethernet {
        return None;
    }
    name.strip_prefix(kind.name_prefix())?.parse().ok()
}

/// Normalizes an Ethernet port name to carry the `ethernet` prefix.
///
/// Callers sometimes hand over the bare slot path (`1/1/3:1`).
pub fn normalize_ethernet(port: &str) -> String {
    if port.starts_with(ETHERNET_PREFIX) {
        port.to_string()
    } else {
        format!("{}{}", ETHERNET_PREFIX, port)
    }
}

/// Strips the `ethernet` prefix, yielding the bare slot path the RESTCONF
/// payloads expect.
pub fn ethernet_slot_path(port: &str) -> &str {
    port.strip_prefix(ETHERNET_PREFIX).unwrap_or(port)
}

/// Extracts the break-out index of an Ethernet port, the trailing
/// `:<subindex>` of names like `ethernet1/1/5:3`.
pub fn breakout_slot(port: &str) -> Option<u32> {
    let (_, suffix) = port.rsplit_once(':')?;
    suffix.parse().ok()
}

/// One interface object as read from the switch.
///
/// Only the fields reconciliation depends on are modeled; everything else
/// in the RESTCONF payload is ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// Kind-prefixed interface name.
    pub name: String,

    /// IANA `type` discriminator.
    #[serde(rename = "type", default)]
    pub if_type: String,

    /// Free-text tag; used as a secondary key to recognize ownership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Administrative state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Ports carrying this VLAN in trunk mode (VLAN records only).
    #[serde(
        rename = "dell-interface:tagged-ports",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tagged_ports: Vec<String>,

    /// Ports carrying this VLAN in access mode (VLAN records only).
    #[serde(
        rename = "dell-interface:untagged-ports",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub untagged_ports: Vec<String>,

    /// Ethernet interfaces bonded into this LAG (port-channel records only).
    #[serde(
        rename = "dell-interface:member-ports",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub member_ports: Vec<String>,

    /// Switchport mode (`access`/`trunk`) where applicable.
    #[serde(
        rename = "dell-interface:mode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mode: Option<String>,

    /// Configured MTU where applicable.
    #[serde(
        rename = "dell-interface:mtu",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mtu: Option<u32>,
}

impl InterfaceRecord {
    /// Returns the kind of this record, if its discriminator is known.
    pub fn kind(&self) -> Option<InterfaceKind> {
        InterfaceKind::from_iana(&self.if_type)
    }

    /// Returns the numeric suffix of the name for VLAN/port-channel records.
    pub fn numeric_id(&self) -> Option<u32> {
        numeric_id(&self.name, self.kind()?)
    }

    /// Returns true if the description matches the given tag.
    pub fn described_as(&self, description: &str) -> bool {
        self.description.as_deref() == Some(description)
    }
}

/// Bulk listing envelope: `GET /restconf/data/ietf-interfaces:interfaces`.
#[derive(Debug, Default, Deserialize)]
pub struct InterfaceListing {
    #[serde(rename = "ietf-interfaces:interfaces", default)]
    interfaces: InterfaceArray,
}

#[derive(Debug, Default, Deserialize)]
struct InterfaceArray {
    #[serde(rename = "interface", default)]
    interface: Vec<InterfaceRecord>,
}

impl InterfaceListing {
    /// Unwraps the listing into its records.
    pub fn into_records(self) -> Vec<InterfaceRecord> {
        self.interfaces.interface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            InterfaceKind::Vlan,
            InterfaceKind::PortChannel,
            InterfaceKind::Ethernet,
        ] {
            assert_eq!(InterfaceKind::from_iana(kind.iana_type()), Some(kind));
        }
        assert_eq!(InterfaceKind::from_iana("iana-if-type:tunnel"), None);
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(numeric_id("vlan90", InterfaceKind::Vlan), Some(90));
        assert_eq!(
            numeric_id("port-channel125", InterfaceKind::PortChannel),
            Some(125)
        );
        assert_eq!(numeric_id("vlan90", InterfaceKind::PortChannel), None);
        assert_eq!(numeric_id("ethernet1/1/1", InterfaceKind::Ethernet), None);
    }

    #[test]
    fn test_normalize_ethernet() {
        assert_eq!(normalize_ethernet("1/1/3"), "ethernet1/1/3");
        assert_eq!(normalize_ethernet("ethernet1/1/3"), "ethernet1/1/3");
        assert_eq!(ethernet_slot_path("ethernet1/1/3"), "1/1/3");
        assert_eq!(ethernet_slot_path("1/1/3"), "1/1/3");
    }

    #[test]
    fn test_breakout_slot() {
        assert_eq!(breakout_slot("ethernet1/1/5:3"), Some(3));
        assert_eq!(breakout_slot("ethernet1/1/5"), None);
        assert_eq!(breakout_slot("ethernet1/1/5:x"), None);
    }

    #[test]
    fn test_listing_deserialization() {
        let body = serde_json::json!({
            "ietf-interfaces:interfaces": {
                "interface": [
                    {
                        "name": "vlan90",
                        "type": VLAN_IF_TYPE,
                        "description": "cluster-a",
                        "enabled": true,
                        "dell-interface:tagged-ports": ["port-channel125"]
                    },
                    {
                        "name": "port-channel125",
                        "type": PORT_CHANNEL_IF_TYPE,
                        "dell-interface:member-ports": ["ethernet1/1/3"]
                    },
                    {
                        "name": "ethernet1/1/3",
                        "type": ETHERNET_IF_TYPE
                    }
                ]
            }
        });

        let listing: InterfaceListing = serde_json::from_value(body).unwrap();
        let records = listing.into_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind(), Some(InterfaceKind::Vlan));
        assert_eq!(records[0].numeric_id(), Some(90));
        assert!(records[0].described_as("cluster-a"));
        assert_eq!(records[1].member_ports, vec!["ethernet1/1/3"]);
        assert_eq!(records[2].numeric_id(), None);
    }

    #[test]
    fn test_empty_listing() {
        let listing: InterfaceListing = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(listing.into_records().is_empty());
    }
}
