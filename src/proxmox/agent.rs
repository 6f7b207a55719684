use super::client::ProxmoxClient;
use super::error::Result;
use super::models::{AgentExecStarted, AgentExecStatus, VmId};
use reqwest::Method;
use serde_json::json;

impl ProxmoxClient {
    pub async fn agent_exec(
        &self,
        node: &str,
        vmid: VmId,
        command: &[String],
    ) -> Result<AgentExecStarted> {
        let path = format!("nodes/{}/qemu/{}/agent/exec", node, vmid);
        let params = json!({ "command": command });
        self.request(Method::POST, &path, Some(&params)).await
    }

    pub async fn agent_exec_status(
        &self,
        node: &str,
        vmid: VmId,
        pid: i64,
    ) -> Result<AgentExecStatus> {
        let path = format!("nodes/{}/qemu/{}/agent/exec-status?pid={}", node, vmid, pid);
        self.request(Method::GET, &path, None).await
    }
}
