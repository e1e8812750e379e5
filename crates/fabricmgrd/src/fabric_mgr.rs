//! Fabric reconciliation engine.
//!
//! Each operation follows the same shape: guard on the managed switch
//! address, take one snapshot, compare desired against observed, and issue
//! only the writes that close the gap. A converged switch produces zero
//! writes, and post-commit callbacks fire only when something was written.
//!
//! There are no internal retries. A failed write surfaces to the caller,
//! and the next reconciliation run starts from a fresh snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use os10fe_common::{AllocationStrategy, FabricConfig, FabricError, FabricResult, SwitchCategory};
use os10fe_restconf::records::{
    normalize_ethernet, numeric_id, port_channel_name, vlan_name, DEFAULT_VLAN_ID,
};
use os10fe_restconf::{
    AttachMemberPort, ConfigureEthernet, CreatePortChannel, CreateVlan, DeviceGateway,
    InterfaceKind, InterfaceRequest, PortMode, TagVlanOnPort,
};

use crate::allocator::{find_hole, slot_for_port, RangeAllocator};
use crate::callback::FabricCallback;
use crate::snapshot::SwitchSnapshot;

/// MTU of server-facing and uplink port-channels.
const PORT_CHANNEL_MTU: u32 = 9216;

/// MTU of host-facing Ethernet interfaces.
const ETHERNET_MTU: u32 = 1554;

/// LACP timeout (seconds) on server-facing LAGs.
const LACP_TIMEOUT: u32 = 10;

/// Request to converge one host attachment onto the fabric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRequest {
    /// Management address of the switch the attachment lands on.
    pub switch_address: String,
    /// Physical host-facing port, with or without the `ethernet` prefix.
    pub ethernet_port: String,
    /// Tenant VLAN id.
    pub vlan_id: u32,
    /// Ownership tag written as the description of every created object.
    pub cluster_name: String,
    /// Switchport mode of the attachment point.
    pub access_mode: PortMode,
    /// Bond the port into a server-facing LAG instead of attaching it
    /// directly to the VLAN.
    pub enable_port_channel: bool,
    /// LACP preemption override for the server-facing LAG.
    #[serde(default)]
    pub lacp_preemption: Option<bool>,
}

/// Request to detach one host port from its VLAN or LAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetachRequest {
    pub switch_address: String,
    pub ethernet_port: String,
    pub vlan_id: u32,
    pub access_mode: PortMode,
    pub enable_port_channel: bool,
}

/// Request to remove a tenant VLAN and its dependent server LAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteVlanRequest {
    pub switch_address: String,
    pub ethernet_port: String,
    pub vlan_id: u32,
    pub enable_port_channel: bool,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConvergeReport {
    /// Number of configuration writes issued.
    pub writes: usize,
}

impl ConvergeReport {
    /// Returns true if the run mutated switch state.
    pub fn changed(&self) -> bool {
        self.writes > 0
    }
}

/// Drives one switch toward the requested fabric state.
pub struct FabricManager<G: DeviceGateway> {
    config: Arc<FabricConfig>,
    gateway: Arc<G>,
    callbacks: Vec<Box<dyn FabricCallback>>,
}

impl<G: DeviceGateway> FabricManager<G> {
    /// Creates a manager for the switch the configuration names.
    pub fn new(config: Arc<FabricConfig>, gateway: Arc<G>) -> Self {
        Self {
            config,
            gateway,
            callbacks: Vec::new(),
        }
    }

    /// Registers a post-commit callback.
    pub fn with_callback(mut self, callback: impl FabricCallback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    fn manages(&self, switch_address: &str) -> bool {
        let ours = switch_address == self.config.switch_address;
        if !ours {
            debug!(
                requested = switch_address,
                managed = %self.config.switch_address,
                "request addressed to another switch, ignoring"
            );
        }
        ours
    }

    async fn write(
        &self,
        report: &mut ConvergeReport,
        request: InterfaceRequest,
    ) -> FabricResult<()> {
        info!(op = %request.describe(), switch = %self.config.switch_address, "applying");
        self.gateway.create_or_update(&request).await?;
        report.writes += 1;
        Ok(())
    }

    /// Converges VLAN, attachment port, and uplinks for one host attachment.
    ///
    /// Leaf switches build the full chain: tenant VLAN, server-facing LAG or
    /// direct port attachment, Ethernet configuration, and uplink tagging.
    /// Spine switches only carry the VLAN on their uplinks.
    #[instrument(skip(self, request), fields(switch = %request.switch_address, vlan = request.vlan_id))]
    pub async fn ensure_configuration(
        &self,
        request: &AttachmentRequest,
    ) -> FabricResult<ConvergeReport> {
        let mut report = ConvergeReport::default();
        if !self.manages(&request.switch_address) {
            return Ok(report);
        }

        let snapshot = SwitchSnapshot::fetch(self.gateway.as_ref()).await?;
        self.ensure_vlan(&snapshot, request, &mut report).await?;

        if self.config.category == SwitchCategory::Leaf {
            let port = normalize_ethernet(&request.ethernet_port);
            let channel_id = if request.enable_port_channel {
                Some(
                    self.ensure_server_port_channel(&snapshot, request, &port, &mut report)
                        .await?,
                )
            } else {
                None
            };
            self.ensure_ethernet(&snapshot, request, &port, channel_id, &mut report)
                .await?;
        }

        self.ensure_uplinks(&snapshot, request.vlan_id, &mut report)
            .await?;

        if report.changed() {
            for callback in &self.callbacks {
                callback.post_ensure_configuration().await?;
            }
        }
        Ok(report)
    }

    async fn ensure_vlan(
        &self,
        snapshot: &SwitchSnapshot,
        request: &AttachmentRequest,
        report: &mut ConvergeReport,
    ) -> FabricResult<()> {
        let name = vlan_name(request.vlan_id);
        if snapshot
            .by_exact_name_and_description(InterfaceKind::Vlan, &name, &request.cluster_name)
            .is_some()
        {
            return Ok(());
        }
        self.write(
            report,
            InterfaceRequest::CreateVlan(CreateVlan {
                vlan_id: request.vlan_id,
                description: Some(request.cluster_name.clone()),
                enabled: true,
            }),
        )
        .await
    }

    /// Finds or creates the server-facing LAG for this attachment and makes
    /// sure it carries the tenant VLAN. Returns the channel id.
    async fn ensure_server_port_channel(
        &self,
        snapshot: &SwitchSnapshot,
        request: &AttachmentRequest,
        port: &str,
        report: &mut ConvergeReport,
    ) -> FabricResult<u32> {
        if let Some(existing) =
            snapshot.by_description(InterfaceKind::PortChannel, &request.cluster_name)
        {
            let channel_id = existing
                .numeric_id()
                .ok_or_else(|| FabricError::invalid_interface_name(&existing.name))?;
            if !snapshot.vlan_has_member(request.vlan_id, &existing.name, request.access_mode) {
                self.write(
                    report,
                    InterfaceRequest::TagVlan(TagVlanOnPort {
                        vlan_id: request.vlan_id,
                        port: existing.name.clone(),
                        mode: request.access_mode,
                    }),
                )
                .await?;
            }
            return Ok(channel_id);
        }

        let channel_id = match self.config.allocation {
            AllocationStrategy::FirstGap => {
                find_hole(&snapshot.ids_in_use(InterfaceKind::PortChannel))
            }
            AllocationStrategy::FixedRange => {
                let slot = slot_for_port(port)?;
                RangeAllocator::new(&self.config.port_channel_range).allocate(slot)?
            }
        };

        self.write(
            report,
            InterfaceRequest::CreatePortChannel(CreatePortChannel {
                channel_id,
                description: Some(request.cluster_name.clone()),
                enabled: true,
                mode: request.access_mode,
                mtu: Some(PORT_CHANNEL_MTU),
                vlt_port_channel_id: Some(channel_id),
                lacp_fallback: true,
                lacp_timeout: Some(LACP_TIMEOUT),
                lacp_preempt: request.lacp_preemption,
                edge_port: true,
                bpdu_guard: true,
            }),
        )
        .await?;
        self.write(
            report,
            InterfaceRequest::TagVlan(TagVlanOnPort {
                vlan_id: request.vlan_id,
                port: port_channel_name(channel_id),
                mode: request.access_mode,
            }),
        )
        .await?;
        Ok(channel_id)
    }

    /// Configures the physical port and attaches it to its LAG or VLAN.
    async fn ensure_ethernet(
        &self,
        snapshot: &SwitchSnapshot,
        request: &AttachmentRequest,
        port: &str,
        channel_id: Option<u32>,
        report: &mut ConvergeReport,
    ) -> FabricResult<()> {
        let described = snapshot
            .get(InterfaceKind::Ethernet, port)
            .is_some_and(|record| record.described_as(&request.cluster_name));
        if !described {
            self.write(
                report,
                InterfaceRequest::ConfigureEthernet(ConfigureEthernet {
                    port: port.to_string(),
                    description: Some(request.cluster_name.clone()),
                    enabled: true,
                    mtu: ETHERNET_MTU,
                    flow_control_receive: true,
                    flow_control_transmit: false,
                    disable_switch_port: channel_id.is_some(),
                }),
            )
            .await?;
        }

        match channel_id {
            Some(channel_id) => {
                let bonded = snapshot
                    .get(InterfaceKind::PortChannel, &port_channel_name(channel_id))
                    .is_some_and(|record| record.member_ports.iter().any(|m| m == port));
                if !bonded {
                    self.write(
                        report,
                        InterfaceRequest::AttachMember(AttachMemberPort {
                            channel_id,
                            ethernet_port: port.to_string(),
                        }),
                    )
                    .await?;
                }
            }
            None => {
                if !snapshot.vlan_has_member(request.vlan_id, port, request.access_mode) {
                    self.write(
                        report,
                        InterfaceRequest::TagVlan(TagVlanOnPort {
                            vlan_id: request.vlan_id,
                            port: port.to_string(),
                            mode: request.access_mode,
                        }),
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }

    /// Converges the static uplink LAGs: creates missing ones, bonds missing
    /// members (never detaching extras), and tags the tenant VLAN onto every
    /// uplink the link mapping says this switch reaches.
    async fn ensure_uplinks(
        &self,
        snapshot: &SwitchSnapshot,
        vlan_id: u32,
        report: &mut ConvergeReport,
    ) -> FabricResult<()> {
        for (name, members) in self.config.uplink_port_channels() {
            let channel_id = numeric_id(&name, InterfaceKind::PortChannel).ok_or_else(|| {
                FabricError::invalid_config(
                    "port_channel_ethernet_mapping",
                    format!("{} is not a port-channel name", name),
                )
            })?;

            let existing = snapshot.get(InterfaceKind::PortChannel, &name);
            if existing.is_none() {
                self.write(
                    report,
                    InterfaceRequest::CreatePortChannel(CreatePortChannel {
                        channel_id,
                        description: None,
                        enabled: true,
                        mode: PortMode::Trunk,
                        mtu: Some(PORT_CHANNEL_MTU),
                        vlt_port_channel_id: Some(channel_id),
                        lacp_fallback: false,
                        lacp_timeout: None,
                        lacp_preempt: None,
                        edge_port: false,
                        bpdu_guard: false,
                    }),
                )
                .await?;
            }

            let bonded = existing.map(|r| r.member_ports.as_slice()).unwrap_or(&[]);
            for member in &members {
                if !bonded.iter().any(|m| m == member) {
                    self.write(
                        report,
                        InterfaceRequest::AttachMember(AttachMemberPort {
                            channel_id,
                            ethernet_port: member.clone(),
                        }),
                    )
                    .await?;
                }
            }

            if self.config.uplink_is_relevant(&name)
                && !snapshot.vlan_has_member(vlan_id, &name, PortMode::Trunk)
            {
                self.write(
                    report,
                    InterfaceRequest::TagVlan(TagVlanOnPort {
                        vlan_id,
                        port: name.clone(),
                        mode: PortMode::Trunk,
                    }),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Detaches one host port: deletes its server LAG, or re-pins an access
    /// port to the default VLAN, or removes a trunk tag.
    #[instrument(skip(self, request), fields(switch = %request.switch_address, vlan = request.vlan_id))]
    pub async fn detach_port(&self, request: &DetachRequest) -> FabricResult<ConvergeReport> {
        let mut report = ConvergeReport::default();
        if !self.manages(&request.switch_address) {
            return Ok(report);
        }

        let snapshot = SwitchSnapshot::fetch(self.gateway.as_ref()).await?;
        let port = normalize_ethernet(&request.ethernet_port);

        if request.enable_port_channel {
            if let Some(lag) = snapshot.port_channel_with_member(&port) {
                info!(port_channel = %lag.name, switch = %self.config.switch_address, "deleting server LAG");
                if self.gateway.delete_interface(&lag.name).await? {
                    report.writes += 1;
                }
            }
        } else {
            match request.access_mode {
                PortMode::Access => {
                    if !snapshot.port_on_default_vlan(&port) {
                        self.write(
                            &mut report,
                            InterfaceRequest::TagVlan(TagVlanOnPort {
                                vlan_id: DEFAULT_VLAN_ID,
                                port: port.clone(),
                                mode: PortMode::Access,
                            }),
                        )
                        .await?;
                    }
                }
                PortMode::Trunk => {
                    if snapshot.vlan_has_member(request.vlan_id, &port, PortMode::Trunk) {
                        self.gateway
                            .remove_trunk_member(request.vlan_id, &port)
                            .await?;
                        report.writes += 1;
                    }
                }
            }
        }

        if report.changed() {
            for callback in &self.callbacks {
                callback.post_detach_port().await?;
            }
        }
        Ok(report)
    }

    /// Removes a tenant VLAN, deleting its dependent server LAG first so the
    /// VLAN never disappears while a LAG still references it.
    #[instrument(skip(self, request), fields(switch = %request.switch_address, vlan = request.vlan_id))]
    pub async fn delete_vlan(&self, request: &DeleteVlanRequest) -> FabricResult<ConvergeReport> {
        let mut report = ConvergeReport::default();
        if !self.manages(&request.switch_address) {
            return Ok(report);
        }

        let snapshot = SwitchSnapshot::fetch(self.gateway.as_ref()).await?;
        let port = normalize_ethernet(&request.ethernet_port);

        if request.enable_port_channel {
            if let Some(lag) = snapshot.port_channel_with_member(&port) {
                if self.gateway.delete_interface(&lag.name).await? {
                    report.writes += 1;
                }
            }
        }

        if snapshot.vlan(request.vlan_id).is_some() {
            let name = vlan_name(request.vlan_id);
            if self.gateway.delete_interface(&name).await? {
                report.writes += 1;
            }
        }

        if report.changed() {
            for callback in &self.callbacks {
                callback.post_delete_vlan().await?;
            }
        }
        Ok(report)
    }
}
