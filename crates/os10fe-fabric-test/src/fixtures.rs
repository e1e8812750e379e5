//! Record builders for seeding fake switches.

use os10fe_restconf::records::{
    port_channel_name, vlan_name, ETHERNET_IF_TYPE, PORT_CHANNEL_IF_TYPE, VLAN_IF_TYPE,
};
use os10fe_restconf::InterfaceRecord;

/// A VLAN record with optional description.
pub fn vlan_record(vlan_id: u32, description: Option<&str>) -> InterfaceRecord {
    InterfaceRecord {
        name: vlan_name(vlan_id),
        if_type: VLAN_IF_TYPE.to_string(),
        description: description.map(str::to_string),
        enabled: Some(true),
        ..Default::default()
    }
}

/// A VLAN record with tagged and untagged member ports.
pub fn vlan_record_with_ports(
    vlan_id: u32,
    description: Option<&str>,
    tagged: &[&str],
    untagged: &[&str],
) -> InterfaceRecord {
    InterfaceRecord {
        tagged_ports: tagged.iter().map(|p| p.to_string()).collect(),
        untagged_ports: untagged.iter().map(|p| p.to_string()).collect(),
        ..vlan_record(vlan_id, description)
    }
}

/// A port-channel record with bonded members.
pub fn port_channel_record(
    channel_id: u32,
    description: Option<&str>,
    members: &[&str],
) -> InterfaceRecord {
    InterfaceRecord {
        name: port_channel_name(channel_id),
        if_type: PORT_CHANNEL_IF_TYPE.to_string(),
        description: description.map(str::to_string),
        enabled: Some(true),
        member_ports: members.iter().map(|p| p.to_string()).collect(),
        ..Default::default()
    }
}

/// An Ethernet record.
pub fn ethernet_record(name: &str, description: Option<&str>) -> InterfaceRecord {
    InterfaceRecord {
        name: name.to_string(),
        if_type: ETHERNET_IF_TYPE.to_string(),
        description: description.map(str::to_string),
        enabled: Some(true),
        ..Default::default()
    }
}
