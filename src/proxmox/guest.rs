use super::client::ProxmoxClient;
use super::error::Result;
use super::models::{ContainerConfigData, GuestListItem, VmConfigData, VmId};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// The two guest flavours; selects the `qemu` or `lxc` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    Qemu,
    Lxc,
}

impl GuestKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            GuestKind::Qemu => "qemu",
            GuestKind::Lxc => "lxc",
        }
    }
}

impl fmt::Display for GuestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl ProxmoxClient {
    pub async fn list_guests(&self, node: &str, kind: GuestKind) -> Result<Vec<GuestListItem>> {
        let path = format!("nodes/{}/{}", node, kind);
        self.request(Method::GET, &path, None).await
    }

    /// Posts `status/{action}`; returns the task UPID.
    pub async fn guest_action(
        &self,
        node: &str,
        vmid: VmId,
        kind: GuestKind,
        action: &str,
    ) -> Result<String> {
        let path = format!("nodes/{}/{}/{}/status/{}", node, kind, vmid, action);
        self.request(Method::POST, &path, None).await
    }

    pub async fn create_guest(
        &self,
        node: &str,
        kind: GuestKind,
        params: &Map<String, Value>,
    ) -> Result<String> {
        let path = format!("nodes/{}/{}", node, kind);
        let body = Value::Object(params.clone());
        self.request(Method::POST, &path, Some(&body)).await
    }

    pub async fn delete_guest(&self, node: &str, vmid: VmId, kind: GuestKind) -> Result<String> {
        let path = format!("nodes/{}/{}/{}", node, kind, vmid);
        self.request(Method::DELETE, &path, None).await
    }

    pub async fn get_vm_config(&self, node: &str, vmid: VmId) -> Result<VmConfigData> {
        let path = format!("nodes/{}/qemu/{}/config", node, vmid);
        self.request(Method::GET, &path, None).await
    }

    pub async fn get_container_config(&self, node: &str, vmid: VmId) -> Result<ContainerConfigData> {
        let path = format!("nodes/{}/lxc/{}/config", node, vmid);
        self.request(Method::GET, &path, None).await
    }

    pub async fn update_config(
        &self,
        node: &str,
        vmid: VmId,
        kind: GuestKind,
        params: &Map<String, Value>,
    ) -> Result<()> {
        let path = format!("nodes/{}/{}/{}/config", node, kind, vmid);
        let body = Value::Object(params.clone());
        let _: Value = self.request(Method::PUT, &path, Some(&body)).await?;
        Ok(())
    }

    pub async fn clone_guest(
        &self,
        node: &str,
        vmid: VmId,
        kind: GuestKind,
        params: &Map<String, Value>,
    ) -> Result<String> {
        let path = format!("nodes/{}/{}/{}/clone", node, kind, vmid);
        let body = Value::Object(params.clone());
        self.request(Method::POST, &path, Some(&body)).await
    }
}
