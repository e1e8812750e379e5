//! Device gateway trait and its RESTCONF implementation.
//!
//! Every configuration write goes through the update-if-exists, else create
//! pattern: attempt a PATCH; when the switch reports that the referenced
//! object does not exist ("require-instance test failed"), fall back to a
//! POST of the same payload. This keeps every write idempotent without
//! changing error semantics for genuine failures.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use os10fe_common::{FabricError, FabricResult};

use crate::records::{vlan_name, InterfaceListing, InterfaceRecord};
use crate::requests::InterfaceRequest;

/// Bulk interface collection path.
pub const INTERFACES_PATH: &str = "/restconf/data/ietf-interfaces:interfaces";

/// RPC path persisting running config to startup config.
pub const COPY_CONFIG_PATH: &str = "/restconf/operations/copy-config";

/// RESTCONF error message distinguishing "object missing" from real errors.
const REQUIRE_INSTANCE_FAILED: &str = "require-instance test failed";

/// Gateway to one physical switch, keyed by its management address.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Management address of the switch behind this gateway.
    fn address(&self) -> &str;

    /// One bulk listing of every interface on the switch.
    async fn get_all_interfaces(&self) -> FabricResult<Vec<InterfaceRecord>>;

    /// Update-if-exists, else create.
    async fn create_or_update(&self, request: &InterfaceRequest) -> FabricResult<()>;

    /// Deletes an interface outright. Returns true iff the switch
    /// confirmed the removal.
    async fn delete_interface(&self, name: &str) -> FabricResult<bool>;

    /// Removes one port from a VLAN's tagged member list.
    async fn remove_trunk_member(&self, vlan_id: u32, port: &str) -> FabricResult<()>;

    /// Persists running config to startup config.
    async fn copy_running_to_startup(&self) -> FabricResult<()>;
}

/// Percent-encodes an interface name for use inside a RESTCONF path.
fn encode_name(name: &str) -> String {
    name.replace('/', "%2F").replace(':', "%3A")
}

fn interface_path(name: &str) -> String {
    format!("{}/interface/{}", INTERFACES_PATH, encode_name(name))
}

fn trunk_member_path(vlan_id: u32, port: &str) -> String {
    format!(
        "{}/interface/{}/dell-interface:tagged-ports={}",
        INTERFACES_PATH,
        encode_name(&vlan_name(vlan_id)),
        encode_name(port)
    )
}

/// RESTCONF client for one Dell OS10 switch.
pub struct RestconfClient {
    address: String,
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl RestconfClient {
    /// Builds a client for the switch at `address`.
    ///
    /// Front-end switches present self-signed certificates; verification is
    /// disabled, matching operational reality on the management network.
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> FabricResult<Self> {
        let address = address.into();
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| FabricError::transport(&address, e.to_string()))?;
        Ok(Self {
            base_url: format!("https://{}", address),
            address,
            username: username.into(),
            password: password.into(),
            http,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> FabricResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| FabricError::transport(&self.address, e.to_string()))
    }

    /// Extracts the first error message from an `ietf-restconf:errors` body.
    fn error_message(body: &Value) -> Option<&str> {
        body.get("ietf-restconf:errors")?
            .get("error")?
            .get(0)?
            .get("error-message")?
            .as_str()
    }

    async fn patch_then_post(&self, operation: &str, body: &Value) -> FabricResult<()> {
        let resp = self.send(Method::PATCH, INTERFACES_PATH, Some(body)).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        if status == StatusCode::NOT_FOUND {
            let error_body: Value = resp.json().await.unwrap_or(Value::Null);
            if Self::error_message(&error_body) == Some(REQUIRE_INSTANCE_FAILED) {
                // Object doesn't exist yet; fall back to create.
                debug!(operation, "patch target missing, falling back to post");
                let resp = self.send(Method::POST, INTERFACES_PATH, Some(body)).await?;
                let status = resp.status();
                if status.is_success() {
                    return Ok(());
                }
                let message = Self::response_error(resp).await;
                return Err(FabricError::remote(
                    &self.address,
                    operation,
                    status.as_u16(),
                    message,
                ));
            }
            let message = Self::error_message(&error_body).unwrap_or_default().to_string();
            return Err(FabricError::remote(
                &self.address,
                operation,
                status.as_u16(),
                message,
            ));
        }

        let message = Self::response_error(resp).await;
        Err(FabricError::remote(
            &self.address,
            operation,
            status.as_u16(),
            message,
        ))
    }

    async fn response_error(resp: reqwest::Response) -> String {
        match resp.json::<Value>().await {
            Ok(body) => Self::error_message(&body).unwrap_or_default().to_string(),
            Err(_) => String::new(),
        }
    }
}

#[async_trait]
impl DeviceGateway for RestconfClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn get_all_interfaces(&self) -> FabricResult<Vec<InterfaceRecord>> {
        let resp = self.send(Method::GET, INTERFACES_PATH, None).await?;
        let status = resp.status();
        if !status.is_success() {
            let message = Self::response_error(resp).await;
            return Err(FabricError::remote(
                &self.address,
                "get-all-interfaces",
                status.as_u16(),
                message,
            ));
        }
        let listing: InterfaceListing = resp
            .json()
            .await
            .map_err(|e| FabricError::transport(&self.address, e.to_string()))?;
        Ok(listing.into_records())
    }

    async fn create_or_update(&self, request: &InterfaceRequest) -> FabricResult<()> {
        let operation = request.describe();
        debug!(switch = %self.address, %operation, "configuration write");
        self.patch_then_post(&operation, &request.body()).await
    }

    async fn delete_interface(&self, name: &str) -> FabricResult<bool> {
        let resp = self
            .send(Method::DELETE, &interface_path(name), None)
            .await?;
        let confirmed = resp.status().is_success();
        if !confirmed {
            warn!(switch = %self.address, name, status = %resp.status(), "delete not confirmed");
        }
        Ok(confirmed)
    }

    async fn remove_trunk_member(&self, vlan_id: u32, port: &str) -> FabricResult<()> {
        let resp = self
            .send(Method::DELETE, &trunk_member_path(vlan_id, port), None)
            .await?;
        let status = resp.status();
        // An already-absent member is a benign retry of the same request.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let message = Self::response_error(resp).await;
        Err(FabricError::remote(
            &self.address,
            "remove-trunk-member",
            status.as_u16(),
            message,
        ))
    }

    async fn copy_running_to_startup(&self) -> FabricResult<()> {
        let body = serde_json::json!({
            "yuma-netconf:input": {
                "source": { "running": [] },
                "target": { "startup": [] }
            }
        });
        let resp = self.send(Method::POST, COPY_CONFIG_PATH, Some(&body)).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = Self::response_error(resp).await;
        Err(FabricError::remote(
            &self.address,
            "copy-config",
            status.as_u16(),
            message,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_name() {
        assert_eq!(encode_name("ethernet1/1/3:1"), "ethernet1%2F1%2F3%3A1");
        assert_eq!(encode_name("vlan90"), "vlan90");
    }

    #[test]
    fn test_interface_path() {
        assert_eq!(
            interface_path("ethernet1/1/3"),
            "/restconf/data/ietf-interfaces:interfaces/interface/ethernet1%2F1%2F3"
        );
    }

    #[test]
    fn test_trunk_member_path() {
        assert_eq!(
            trunk_member_path(90, "port-channel125"),
            "/restconf/data/ietf-interfaces:interfaces/interface/vlan90/dell-interface:tagged-ports=port-channel125"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        let body = serde_json::json!({
            "ietf-restconf:errors": {
                "error": [
                    { "error-message": "require-instance test failed" }
                ]
            }
        });
        assert_eq!(
            RestconfClient::error_message(&body),
            Some("require-instance test failed")
        );
        assert_eq!(RestconfClient::error_message(&Value::Null), None);
    }

    #[test]
    fn test_client_construction() {
        let client = RestconfClient::new("100.127.0.125", "admin", "secret").unwrap();
        assert_eq!(client.address(), "100.127.0.125");
        assert_eq!(client.base_url, "https://100.127.0.125");
    }
}
