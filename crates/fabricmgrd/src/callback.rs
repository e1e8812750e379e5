//! Post-commit hooks around fabric operations.
//!
//! Hooks fire after an operation has issued at least one write; a run that
//! found the switch already converged triggers nothing. The stock
//! [`WriteMemoryCallback`] persists the running configuration so a reload
//! does not lose what reconciliation just applied.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use os10fe_common::FabricResult;
use os10fe_restconf::DeviceGateway;

/// Observer of fabric mutations. All hooks default to no-ops.
#[async_trait]
pub trait FabricCallback: Send + Sync {
    /// Called after `ensure_configuration` committed at least one write.
    async fn post_ensure_configuration(&self) -> FabricResult<()> {
        Ok(())
    }

    /// Called after `detach_port` committed at least one write.
    async fn post_detach_port(&self) -> FabricResult<()> {
        Ok(())
    }

    /// Called after `delete_vlan` committed at least one write.
    async fn post_delete_vlan(&self) -> FabricResult<()> {
        Ok(())
    }
}

/// Saves running config to startup after every mutating operation.
pub struct WriteMemoryCallback<G: DeviceGateway> {
    gateway: Arc<G>,
}

impl<G: DeviceGateway> WriteMemoryCallback<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    async fn save(&self) -> FabricResult<()> {
        self.gateway.copy_running_to_startup().await?;
        info!(switch = %self.gateway.address(), "saved running config to startup");
        Ok(())
    }
}

#[async_trait]
impl<G: DeviceGateway> FabricCallback for WriteMemoryCallback<G> {
    async fn post_ensure_configuration(&self) -> FabricResult<()> {
        self.save().await
    }

    async fn post_detach_port(&self) -> FabricResult<()> {
        self.save().await
    }

    async fn post_delete_vlan(&self) -> FabricResult<()> {
        self.save().await
    }
}
