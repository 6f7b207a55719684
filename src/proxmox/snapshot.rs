use super::client::ProxmoxClient;
use super::error::Result;
use super::guest::GuestKind;
use super::models::{SnapshotItem, VmId};
use reqwest::Method;
use serde_json::{json, Value};

impl ProxmoxClient {
    pub async fn get_snapshots(
        &self,
        node: &str,
        vmid: VmId,
        kind: GuestKind,
    ) -> Result<Vec<SnapshotItem>> {
        let path = format!("nodes/{}/{}/{}/snapshot", node, kind, vmid);
        self.request(Method::GET, &path, None).await
    }

    pub async fn create_snapshot(
        &self,
        node: &str,
        vmid: VmId,
        kind: GuestKind,
        snapname: &str,
        description: Option<&str>,
    ) -> Result<String> {
        let path = format!("nodes/{}/{}/{}/snapshot", node, kind, vmid);
        let mut params = json!({ "snapname": snapname });
        if let (Some(desc), Some(obj)) = (description, params.as_object_mut()) {
            obj.insert("description".to_string(), Value::from(desc));
        }
        self.request(Method::POST, &path, Some(&params)).await
    }

    pub async fn rollback_snapshot(
        &self,
        node: &str,
        vmid: VmId,
        kind: GuestKind,
        snapname: &str,
    ) -> Result<String> {
        let path = format!(
            "nodes/{}/{}/{}/snapshot/{}/rollback",
            node, kind, vmid, snapname
        );
        self.request(Method::POST, &path, None).await
    }

    pub async fn delete_snapshot(
        &self,
        node: &str,
        vmid: VmId,
        kind: GuestKind,
        snapname: &str,
    ) -> Result<String> {
        let path = format!("nodes/{}/{}/{}/snapshot/{}", node, kind, vmid, snapname);
        self.request(Method::DELETE, &path, None).await
    }
}
