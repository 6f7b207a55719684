use super::output::{StorageSummary, ToolOutput, Usage};
use super::{NoArgs, ToolError, ToolResult};
use crate::proxmox::ProxmoxClient;

pub async fn get_storage(client: &ProxmoxClient, _req: NoArgs) -> ToolResult {
    let nodes = client
        .get_nodes()
        .await
        .map_err(|e| ToolError::upstream("get storage", e))?;

    let mut result = Vec::new();
    for node in nodes {
        let pools = client
            .get_storage_list(&node.node)
            .await
            .map_err(|e| ToolError::upstream(format!("get storage on node {}", node.node), e))?;
        result.extend(pools.into_iter().map(|s| StorageSummary {
            storage: s.storage,
            node: node.node.clone(),
            storage_type: s.storage_type.unwrap_or_else(|| "unknown".to_string()),
            content: s.content,
            active: s.active.unwrap_or(false),
            shared: s.shared.unwrap_or(false),
            usage: Usage::new(s.used, s.total),
        }));
    }
    result.sort_by(|a, b| a.storage.cmp(&b.storage).then_with(|| a.node.cmp(&b.node)));

    Ok(ToolOutput::StorageList(result))
}
