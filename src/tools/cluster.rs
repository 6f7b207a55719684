use super::output::{ClusterNode, ClusterSummary, ToolOutput};
use super::{NoArgs, ToolError, ToolResult};
use crate::proxmox::ProxmoxClient;

pub async fn get_cluster_status(client: &ProxmoxClient, _req: NoArgs) -> ToolResult {
    let items = client
        .get_cluster_status()
        .await
        .map_err(|e| ToolError::upstream("get cluster status", e))?;

    let mut summary = ClusterSummary {
        name: None,
        // A standalone node has no cluster record and is trivially quorate.
        quorate: true,
        nodes: Vec::new(),
    };

    for item in items {
        match item.item_type.as_str() {
            "cluster" => {
                summary.name = item.name;
                summary.quorate = item.quorate.unwrap_or(false);
            }
            "node" => summary.nodes.push(ClusterNode {
                name: item.name.unwrap_or_else(|| "unknown".to_string()),
                online: item.online.unwrap_or(false),
                ip: item.ip,
            }),
            _ => {}
        }
    }
    summary.nodes.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ToolOutput::ClusterStatus(summary))
}
