//! In-memory switch gateway.
//!
//! `FakeSwitch` applies every configuration request to a seeded interface
//! table the same way a real switch would, and records each write in a log.
//! Re-fetching interfaces after a write therefore observes the new state,
//! which lets convergence tests drive the reconciler to a fixed point.

use std::sync::Mutex;

use async_trait::async_trait;

use os10fe_common::FabricResult;
use os10fe_restconf::records::{normalize_ethernet, vlan_name, ETHERNET_IF_TYPE};
use os10fe_restconf::records::{port_channel_name, PORT_CHANNEL_IF_TYPE, VLAN_IF_TYPE};
use os10fe_restconf::{DeviceGateway, InterfaceRecord, InterfaceRequest, PortMode};

use std::collections::BTreeMap;

#[derive(Default)]
struct FakeState {
    records: BTreeMap<String, InterfaceRecord>,
    log: Vec<String>,
    saves: usize,
}

/// An in-memory stand-in for one physical switch.
pub struct FakeSwitch {
    address: String,
    state: Mutex<FakeState>,
}

impl FakeSwitch {
    /// Creates an empty switch at the given management address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Seeds one pre-existing interface record.
    pub fn seed(&self, record: InterfaceRecord) {
        let mut state = self.state.lock().unwrap();
        state.records.insert(record.name.clone(), record);
    }

    /// Seeds several pre-existing interface records.
    pub fn seed_all(&self, records: impl IntoIterator<Item = InterfaceRecord>) {
        for record in records {
            self.seed(record);
        }
    }

    /// Returns a copy of the write log.
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Clears and returns the write log.
    pub fn take_writes(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().unwrap().log)
    }

    /// Returns a copy of one interface record, if present.
    pub fn record(&self, name: &str) -> Option<InterfaceRecord> {
        self.state.lock().unwrap().records.get(name).cloned()
    }

    /// Number of copy-config (running -> startup) invocations.
    pub fn saved_count(&self) -> usize {
        self.state.lock().unwrap().saves
    }

    fn apply(state: &mut FakeState, request: &InterfaceRequest) {
        match request {
            InterfaceRequest::CreateVlan(r) => {
                let name = vlan_name(r.vlan_id);
                let record = state.records.entry(name.clone()).or_insert_with(|| {
                    InterfaceRecord {
                        name,
                        if_type: VLAN_IF_TYPE.to_string(),
                        ..Default::default()
                    }
                });
                if r.description.is_some() {
                    record.description = r.description.clone();
                }
                record.enabled = Some(r.enabled);
            }
            InterfaceRequest::TagVlan(r) => {
                let name = vlan_name(r.vlan_id);
                let record = state.records.entry(name.clone()).or_insert_with(|| {
                    InterfaceRecord {
                        name,
                        if_type: VLAN_IF_TYPE.to_string(),
                        ..Default::default()
                    }
                });
                let members = match r.mode {
                    PortMode::Access => &mut record.untagged_ports,
                    PortMode::Trunk => &mut record.tagged_ports,
                };
                if !members.contains(&r.port) {
                    members.push(r.port.clone());
                }
            }
            InterfaceRequest::CreatePortChannel(r) => {
                let name = port_channel_name(r.channel_id);
                let record = state.records.entry(name.clone()).or_insert_with(|| {
                    InterfaceRecord {
                        name,
                        if_type: PORT_CHANNEL_IF_TYPE.to_string(),
                        ..Default::default()
                    }
                });
                if r.description.is_some() {
                    record.description = r.description.clone();
                }
                record.enabled = Some(r.enabled);
                record.mode = Some(r.mode.as_str().to_string());
                record.mtu = r.mtu;
            }
            InterfaceRequest::AttachMember(r) => {
                let name = port_channel_name(r.channel_id);
                let record = state.records.entry(name.clone()).or_insert_with(|| {
                    InterfaceRecord {
                        name,
                        if_type: PORT_CHANNEL_IF_TYPE.to_string(),
                        ..Default::default()
                    }
                });
                if !record.member_ports.contains(&r.ethernet_port) {
                    record.member_ports.push(r.ethernet_port.clone());
                }
            }
            InterfaceRequest::ConfigureEthernet(r) => {
                let name = normalize_ethernet(&r.port);
                let record = state.records.entry(name.clone()).or_insert_with(|| {
                    InterfaceRecord {
                        name,
                        if_type: ETHERNET_IF_TYPE.to_string(),
                        ..Default::default()
                    }
                });
                if r.description.is_some() {
                    record.description = r.description.clone();
                }
                record.enabled = Some(r.enabled);
                record.mtu = Some(r.mtu);
            }
        }
    }
}

#[async_trait]
impl DeviceGateway for FakeSwitch {
    fn address(&self) -> &str {
        &self.address
    }

    async fn get_all_interfaces(&self) -> FabricResult<Vec<InterfaceRecord>> {
        Ok(self.state.lock().unwrap().records.values().cloned().collect())
    }

    async fn create_or_update(&self, request: &InterfaceRequest) -> FabricResult<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(request.describe());
        Self::apply(&mut state, request);
        Ok(())
    }

    async fn delete_interface(&self, name: &str) -> FabricResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("delete-interface {}", name));
        Ok(state.records.remove(name).is_some())
    }

    async fn remove_trunk_member(&self, vlan_id: u32, port: &str) -> FabricResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .log
            .push(format!("untag-vlan {} {}", vlan_name(vlan_id), port));
        if let Some(record) = state.records.get_mut(&vlan_name(vlan_id)) {
            record.tagged_ports.retain(|p| p != port);
        }
        Ok(())
    }

    async fn copy_running_to_startup(&self) -> FabricResult<()> {
        let mut state = self.state.lock().unwrap();
        state.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use os10fe_restconf::{CreateVlan, TagVlanOnPort};

    #[tokio::test]
    async fn test_create_then_refetch() {
        let switch = FakeSwitch::new("100.127.0.125");
        switch
            .create_or_update(&InterfaceRequest::CreateVlan(CreateVlan {
                vlan_id: 90,
                description: Some("cluster-a".to_string()),
                enabled: true,
            }))
            .await
            .unwrap();

        let records = switch.get_all_interfaces().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "vlan90");
        assert_eq!(switch.writes(), vec!["create-vlan vlan90"]);
    }

    #[tokio::test]
    async fn test_tagging_is_additive() {
        let switch = FakeSwitch::new("100.127.0.125");
        for vlan_id in [90, 91] {
            switch
                .create_or_update(&InterfaceRequest::TagVlan(TagVlanOnPort {
                    vlan_id,
                    port: "port-channel125".to_string(),
                    mode: PortMode::Trunk,
                }))
                .await
                .unwrap();
        }

        assert_eq!(
            switch.record("vlan90").unwrap().tagged_ports,
            vec!["port-channel125"]
        );
        assert_eq!(
            switch.record("vlan91").unwrap().tagged_ports,
            vec!["port-channel125"]
        );
    }

    #[tokio::test]
    async fn test_delete_interface_reports_presence() {
        let switch = FakeSwitch::new("100.127.0.125");
        switch.seed(InterfaceRecord {
            name: "vlan90".to_string(),
            if_type: VLAN_IF_TYPE.to_string(),
            ..Default::default()
        });

        assert!(switch.delete_interface("vlan90").await.unwrap());
        assert!(!switch.delete_interface("vlan90").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_trunk_member() {
        let switch = FakeSwitch::new("100.127.0.125");
        switch.seed(InterfaceRecord {
            name: "vlan90".to_string(),
            if_type: VLAN_IF_TYPE.to_string(),
            tagged_ports: vec!["port-channel1".to_string(), "port-channel2".to_string()],
            ..Default::default()
        });

        switch
            .remove_trunk_member(90, "port-channel1")
            .await
            .unwrap();
        assert_eq!(
            switch.record("vlan90").unwrap().tagged_ports,
            vec!["port-channel2"]
        );
    }
}
