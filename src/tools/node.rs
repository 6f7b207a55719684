use super::output::{NodeStatusView, NodeSummary, ToolOutput, Usage};
use super::{NoArgs, NodeName, ToolError, ToolResult};
use crate::proxmox::ProxmoxClient;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct NodeStatusRequest {
    pub node: NodeName,
}

pub async fn get_nodes(client: &ProxmoxClient, _req: NoArgs) -> ToolResult {
    let nodes = client
        .get_nodes()
        .await
        .map_err(|e| ToolError::upstream("get nodes", e))?;

    let mut summaries: Vec<NodeSummary> = nodes
        .into_iter()
        .map(|n| NodeSummary {
            status: n.status.unwrap_or_else(|| "unknown".to_string()),
            uptime: n.uptime.unwrap_or(0),
            cpus: n.maxcpu,
            memory: Usage::new(n.mem, n.maxmem),
            disk: n.maxdisk.map(|total| Usage::new(n.disk, Some(total))),
            node: n.node,
        })
        .collect();
    summaries.sort_by(|a, b| a.node.cmp(&b.node));

    Ok(ToolOutput::NodeList(summaries))
}

pub async fn get_node_status(client: &ProxmoxClient, req: NodeStatusRequest) -> ToolResult {
    info!(node = %req.node, "Getting node status");
    let status = client
        .get_node_status(req.node.as_str())
        .await
        .map_err(|e| ToolError::upstream(format!("get status for node {}", req.node), e))?;

    let memory = status.memory.unwrap_or_default();
    let cpuinfo = status.cpuinfo.unwrap_or_default();
    Ok(ToolOutput::NodeStatus(NodeStatusView {
        node: req.node.to_string(),
        uptime: status.uptime.unwrap_or(0),
        cpus: cpuinfo.cpus,
        cpu_model: cpuinfo.model,
        cpu_usage: status.cpu,
        memory: Usage::new(Some(memory.used), Some(memory.total)),
        rootfs: status
            .rootfs
            .map(|fs| Usage::new(Some(fs.used), Some(fs.total))),
        version: status.pveversion,
    }))
}
