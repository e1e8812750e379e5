//! Read-only per-switch interface state.
//!
//! A snapshot is built from exactly one bulk listing at the start of every
//! reconciliation call and discarded when the call completes. It is never
//! cached across calls; switch state changes out-of-band, and acting on
//! stale membership is worse than the extra read.

use std::collections::{BTreeMap, BTreeSet};

use os10fe_common::FabricResult;
use os10fe_restconf::records::{vlan_name, DEFAULT_VLAN_ID};
use os10fe_restconf::{DeviceGateway, InterfaceKind, InterfaceRecord, PortMode};

/// All interfaces of one switch, grouped by kind and sorted by name.
#[derive(Debug, Default)]
pub struct SwitchSnapshot {
    vlans: BTreeMap<String, InterfaceRecord>,
    port_channels: BTreeMap<String, InterfaceRecord>,
    ethernets: BTreeMap<String, InterfaceRecord>,
}

impl SwitchSnapshot {
    /// Issues the one bulk listing and partitions the result by kind.
    ///
    /// A transport failure here aborts the current reconciliation call; no
    /// partial-success merging happens across kinds.
    pub async fn fetch<G: DeviceGateway + ?Sized>(gateway: &G) -> FabricResult<Self> {
        Ok(Self::from_records(gateway.get_all_interfaces().await?))
    }

    /// Partitions records by their `type` discriminator. Records of
    /// unknown kinds are dropped; reconciliation never touches them.
    pub fn from_records(records: Vec<InterfaceRecord>) -> Self {
        let mut snapshot = Self::default();
        for record in records {
            let map = match record.kind() {
                Some(InterfaceKind::Vlan) => &mut snapshot.vlans,
                Some(InterfaceKind::PortChannel) => &mut snapshot.port_channels,
                Some(InterfaceKind::Ethernet) => &mut snapshot.ethernets,
                None => continue,
            };
            map.insert(record.name.clone(), record);
        }
        snapshot
    }

    fn kind_map(&self, kind: InterfaceKind) -> &BTreeMap<String, InterfaceRecord> {
        match kind {
            InterfaceKind::Vlan => &self.vlans,
            InterfaceKind::PortChannel => &self.port_channels,
            InterfaceKind::Ethernet => &self.ethernets,
        }
    }

    /// Looks up one interface by kind and exact name.
    pub fn get(&self, kind: InterfaceKind, name: &str) -> Option<&InterfaceRecord> {
        self.kind_map(kind).get(name)
    }

    /// Looks up an interface whose name *and* description both match.
    ///
    /// Used when the numeric id alone is ambiguous, e.g. names reused
    /// after deletion by an unrelated tenant.
    pub fn by_exact_name_and_description(
        &self,
        kind: InterfaceKind,
        name: &str,
        description: &str,
    ) -> Option<&InterfaceRecord> {
        self.kind_map(kind)
            .get(name)
            .filter(|record| record.described_as(description))
    }

    /// Looks up an interface by description only, for objects whose
    /// numeric id is not yet known. First match in name order wins; two
    /// unrelated interfaces sharing a tag are not detected.
    pub fn by_description(
        &self,
        kind: InterfaceKind,
        description: &str,
    ) -> Option<&InterfaceRecord> {
        self.kind_map(kind)
            .values()
            .find(|record| record.described_as(description))
    }

    /// Numeric ids currently in use for the given kind.
    pub fn ids_in_use(&self, kind: InterfaceKind) -> BTreeSet<u32> {
        self.kind_map(kind)
            .values()
            .filter_map(|record| record.numeric_id())
            .collect()
    }

    /// The VLAN record for a numeric id, if present.
    pub fn vlan(&self, vlan_id: u32) -> Option<&InterfaceRecord> {
        self.vlans.get(&vlan_name(vlan_id))
    }

    /// Returns true if the VLAN already carries `port` in the given mode.
    pub fn vlan_has_member(&self, vlan_id: u32, port: &str, mode: PortMode) -> bool {
        let Some(vlan) = self.vlan(vlan_id) else {
            return false;
        };
        let members = match mode {
            PortMode::Access => &vlan.untagged_ports,
            PortMode::Trunk => &vlan.tagged_ports,
        };
        members.iter().any(|member| member == port)
    }

    /// Returns true if the port is pinned to the implicit default VLAN.
    pub fn port_on_default_vlan(&self, port: &str) -> bool {
        self.vlan_has_member(DEFAULT_VLAN_ID, port, PortMode::Access)
    }

    /// The port-channel currently bonding the given Ethernet port, if any.
    pub fn port_channel_with_member(&self, port: &str) -> Option<&InterfaceRecord> {
        self.port_channels
            .values()
            .find(|record| record.member_ports.iter().any(|member| member == port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use os10fe_restconf::records::{
        ETHERNET_IF_TYPE, PORT_CHANNEL_IF_TYPE, VLAN_IF_TYPE,
    };

    fn record(name: &str, if_type: &str, description: Option<&str>) -> InterfaceRecord {
        InterfaceRecord {
            name: name.to_string(),
            if_type: if_type.to_string(),
            description: description.map(str::to_string),
            ..Default::default()
        }
    }

    fn sample() -> SwitchSnapshot {
        SwitchSnapshot::from_records(vec![
            record("vlan1", VLAN_IF_TYPE, Some("default")),
            InterfaceRecord {
                tagged_ports: vec!["port-channel125".to_string()],
                untagged_ports: vec!["ethernet1/1/9".to_string()],
                ..record("vlan90", VLAN_IF_TYPE, Some("cluster-a"))
            },
            InterfaceRecord {
                member_ports: vec!["ethernet1/1/3".to_string()],
                ..record("port-channel125", PORT_CHANNEL_IF_TYPE, Some("cluster-a"))
            },
            record("port-channel1", PORT_CHANNEL_IF_TYPE, None),
            record("ethernet1/1/3", ETHERNET_IF_TYPE, Some("cluster-a")),
            record("tunnel1", "iana-if-type:tunnel", None),
        ])
    }

    #[test]
    fn test_partitioning_drops_unknown_kinds() {
        let snapshot = sample();
        assert_eq!(snapshot.vlans.len(), 2);
        assert_eq!(snapshot.port_channels.len(), 2);
        assert_eq!(snapshot.ethernets.len(), 1);
    }

    #[test]
    fn test_by_exact_name_and_description() {
        let snapshot = sample();
        assert!(snapshot
            .by_exact_name_and_description(InterfaceKind::Vlan, "vlan90", "cluster-a")
            .is_some());
        // Same name, wrong tag: treated as absent.
        assert!(snapshot
            .by_exact_name_and_description(InterfaceKind::Vlan, "vlan90", "cluster-b")
            .is_none());
    }

    #[test]
    fn test_by_description_first_match_wins() {
        let snapshot = sample();
        let found = snapshot
            .by_description(InterfaceKind::PortChannel, "cluster-a")
            .unwrap();
        assert_eq!(found.name, "port-channel125");
        assert!(snapshot
            .by_description(InterfaceKind::PortChannel, "cluster-x")
            .is_none());
    }

    #[test]
    fn test_ids_in_use() {
        let snapshot = sample();
        let ids = snapshot.ids_in_use(InterfaceKind::PortChannel);
        assert_eq!(ids, [1, 125].into_iter().collect());
    }

    #[test]
    fn test_vlan_has_member_by_mode() {
        let snapshot = sample();
        assert!(snapshot.vlan_has_member(90, "port-channel125", PortMode::Trunk));
        assert!(!snapshot.vlan_has_member(90, "port-channel125", PortMode::Access));
        assert!(snapshot.vlan_has_member(90, "ethernet1/1/9", PortMode::Access));
        assert!(!snapshot.vlan_has_member(91, "port-channel125", PortMode::Trunk));
    }

    #[test]
    fn test_port_channel_with_member() {
        let snapshot = sample();
        let lag = snapshot.port_channel_with_member("ethernet1/1/3").unwrap();
        assert_eq!(lag.name, "port-channel125");
        assert!(snapshot.port_channel_with_member("ethernet1/1/4").is_none());
    }
}
