//! Agent configuration.
//!
//! The configuration is read once at startup, validated, and passed by
//! reference into the fabric manager. Nothing reconfigures at runtime; the
//! static uplink mappings and the allocatable range are read-only for the
//! process lifetime.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FabricError, FabricResult};

/// Topology role of the managed switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchCategory {
    /// Host-facing tier terminating server Ethernet ports.
    Leaf,
    /// Aggregation tier terminating only uplinks from leaves.
    Spine,
}

impl SwitchCategory {
    /// Returns the category name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchCategory::Leaf => "leaf",
            SwitchCategory::Spine => "spine",
        }
    }
}

/// How server-facing port-channel ids are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Gap search over the channel ids currently present on the switch.
    #[default]
    FirstGap,
    /// Deterministic `begin + slot` inside the configured range, where the
    /// slot is the break-out index of the physical port. Needs no read of
    /// current switch state, so concurrent reconciliations cannot race.
    FixedRange,
}

/// Allocatable port-channel id window for the fixed-range strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortChannelRange {
    /// First allocatable channel id.
    pub begin: u32,
    /// Last allocatable channel id (inclusive).
    pub end: u32,
}

impl Default for PortChannelRange {
    fn default() -> Self {
        Self {
            begin: 125,
            end: 128,
        }
    }
}

fn default_username() -> String {
    "admin".to_string()
}

/// Immutable agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricConfig {
    /// Management address of the switch this instance manages. Requests
    /// addressed to any other switch are silent no-ops.
    pub switch_address: String,

    /// RESTCONF username.
    #[serde(default = "default_username")]
    pub username: String,

    /// RESTCONF password.
    #[serde(default)]
    pub password: String,

    /// Leaf or spine behavior.
    pub category: SwitchCategory,

    /// Allocatable window for server-facing port-channels.
    #[serde(default)]
    pub port_channel_range: PortChannelRange,

    /// Port-channel id selection strategy.
    #[serde(default)]
    pub allocation: AllocationStrategy,

    /// Static uplink membership: Ethernet port -> uplink port-channel name.
    /// Defines which physical ports bond into which fixed uplink LAG.
    #[serde(default)]
    pub port_channel_ethernet_mapping: HashMap<String, String>,

    /// Static uplink reachability: uplink port-channel name -> switch
    /// addresses that link reaches. Used to decide whether this switch
    /// should tag a VLAN onto that uplink.
    #[serde(default)]
    pub link_port_channel_mapping: HashMap<String, Vec<String>>,
}

impl FabricConfig {
    /// Loads and validates a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> FabricResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FabricError::invalid_config("config", format!("{}: {}", path.display(), e))
        })?;
        let config: FabricConfig = serde_yaml::from_str(&text)
            .map_err(|e| FabricError::invalid_config("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> FabricResult<()> {
        if self.switch_address.is_empty() {
            return Err(FabricError::invalid_config(
                "switch_address",
                "must not be empty",
            ));
        }
        if self.port_channel_range.begin > self.port_channel_range.end {
            return Err(FabricError::invalid_config(
                "port_channel_range",
                format!(
                    "begin {} is past end {}",
                    self.port_channel_range.begin, self.port_channel_range.end
                ),
            ));
        }
        Ok(())
    }

    /// Inverts the Ethernet->port-channel mapping into port-channel ->
    /// sorted member list, the shape the uplink reconciliation walks.
    pub fn uplink_port_channels(&self) -> BTreeMap<String, Vec<String>> {
        let mut uplinks: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (ethernet, port_channel) in &self.port_channel_ethernet_mapping {
            uplinks
                .entry(port_channel.clone())
                .or_default()
                .push(ethernet.clone());
        }
        for members in uplinks.values_mut() {
            members.sort();
        }
        uplinks
    }

    /// Returns true if the given uplink port-channel concerns this switch:
    /// either the static link mapping lists our address for it, or there is
    /// no link entry at all (a local uplink of the managed switch itself).
    pub fn uplink_is_relevant(&self, port_channel: &str) -> bool {
        match self.link_port_channel_mapping.get(port_channel) {
            Some(addresses) => addresses.iter().any(|a| a == &self.switch_address),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> FabricConfig {
        FabricConfig {
            switch_address: "100.127.0.125".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            category: SwitchCategory::Leaf,
            port_channel_range: PortChannelRange::default(),
            allocation: AllocationStrategy::FirstGap,
            port_channel_ethernet_mapping: HashMap::from([
                ("ethernet1/1/1".to_string(), "port-channel1".to_string()),
                ("ethernet1/1/2".to_string(), "port-channel1".to_string()),
            ]),
            link_port_channel_mapping: HashMap::new(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_address() {
        let mut config = sample_config();
        config.switch_address = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_inverted_range() {
        let mut config = sample_config();
        config.port_channel_range = PortChannelRange { begin: 9, end: 1 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_range() {
        let range = PortChannelRange::default();
        assert_eq!(range.begin, 125);
        assert_eq!(range.end, 128);
    }

    #[test]
    fn test_uplink_port_channels_inverts_and_sorts() {
        let uplinks = sample_config().uplink_port_channels();
        assert_eq!(
            uplinks.get("port-channel1"),
            Some(&vec![
                "ethernet1/1/1".to_string(),
                "ethernet1/1/2".to_string()
            ])
        );
    }

    #[test]
    fn test_uplink_is_relevant() {
        let mut config = sample_config();
        // No link entry: local uplink, always relevant.
        assert!(config.uplink_is_relevant("port-channel1"));

        config.link_port_channel_mapping.insert(
            "port-channel1".to_string(),
            vec!["100.127.0.126".to_string()],
        );
        assert!(!config.uplink_is_relevant("port-channel1"));

        config
            .link_port_channel_mapping
            .get_mut("port-channel1")
            .unwrap()
            .push("100.127.0.125".to_string());
        assert!(config.uplink_is_relevant("port-channel1"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
switch_address: 100.127.0.125
category: leaf
allocation: fixed_range
port_channel_range:
  begin: 125
  end: 128
port_channel_ethernet_mapping:
  ethernet1/1/1: port-channel1
"#;
        let config: FabricConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.category, SwitchCategory::Leaf);
        assert_eq!(config.allocation, AllocationStrategy::FixedRange);
        assert_eq!(config.username, "admin");
        assert!(config.validate().is_ok());
    }
}
