//! Operations shared by the VM and container tools.

use super::output::{ConfigUpdate, GuestSummary, PowerAction, PowerResult, Usage};
use super::{GuestRef, NodeName, ToolError};
use crate::proxmox::{GuestKind, ProxmoxClient, VmId};
use serde_json::{Map, Value};
use tracing::info;

pub(crate) fn noun(kind: GuestKind) -> &'static str {
    match kind {
        GuestKind::Qemu => "VM",
        GuestKind::Lxc => "container",
    }
}

/// Walks every node in turn and collects its guests of one kind.
pub(crate) async fn list_all(
    client: &ProxmoxClient,
    kind: GuestKind,
) -> Result<Vec<GuestSummary>, ToolError> {
    let action = format!("get {}s", noun(kind));
    let nodes = client
        .get_nodes()
        .await
        .map_err(|e| ToolError::upstream(&action, e))?;

    let mut result = Vec::new();
    for node in nodes {
        let guests = client
            .list_guests(&node.node, kind)
            .await
            .map_err(|e| ToolError::upstream(format!("{} on node {}", action, node.node), e))?;
        result.extend(guests.into_iter().map(|g| GuestSummary {
            vmid: g.vmid,
            name: g.name.unwrap_or_else(|| format!("{}-{}", noun(kind), g.vmid)),
            status: g.status.unwrap_or_else(|| "unknown".to_string()),
            node: node.node.clone(),
            cpus: g.cpus,
            memory: Usage::new(g.mem, g.maxmem),
        }));
    }
    result.sort_by_key(|g| g.vmid);
    Ok(result)
}

/// Fails with `Conflict` when `vmid` is already present in the node's listing.
pub(crate) async fn ensure_id_free(
    client: &ProxmoxClient,
    node: &NodeName,
    vmid: VmId,
    kind: GuestKind,
) -> Result<(), ToolError> {
    let existing = client
        .list_guests(node.as_str(), kind)
        .await
        .map_err(|e| ToolError::upstream(format!("list {}s on node {}", noun(kind), node), e))?;

    if existing.iter().any(|g| g.vmid == vmid) {
        let label = match kind {
            GuestKind::Qemu => "VM",
            GuestKind::Lxc => "Container",
        };
        return Err(ToolError::conflict(format!(
            "{} ID {} already exists on node {}",
            label, vmid, node
        )));
    }
    Ok(())
}

pub(crate) async fn power(
    client: &ProxmoxClient,
    kind: GuestKind,
    req: GuestRef,
    action: PowerAction,
) -> Result<PowerResult, ToolError> {
    let what = format!("{} {} {} on node {}", action.as_str(), noun(kind), req.vmid, req.node);
    info!(node = %req.node, vmid = %req.vmid, action = action.as_str(), "{} power operation", noun(kind));

    let task = match action.status_endpoint(kind) {
        Some(endpoint) => client
            .guest_action(req.node.as_str(), req.vmid, kind, endpoint)
            .await,
        None => client.delete_guest(req.node.as_str(), req.vmid, kind).await,
    }
    .map_err(|e| ToolError::upstream(&what, e))?;

    Ok(PowerResult {
        kind,
        action,
        vmid: req.vmid,
        node: req.node.to_string(),
        task,
    })
}

pub(crate) async fn update_config(
    client: &ProxmoxClient,
    kind: GuestKind,
    req: GuestRef,
    params: Map<String, Value>,
) -> Result<ConfigUpdate, ToolError> {
    if params.is_empty() {
        return Err(ToolError::invalid_argument(
            "No configuration changes requested",
        ));
    }
    info!(node = %req.node, vmid = %req.vmid, "Updating {} configuration", noun(kind));

    client
        .update_config(req.node.as_str(), req.vmid, kind, &params)
        .await
        .map_err(|e| {
            ToolError::upstream(
                format!(
                    "update configuration for {} {} on node {}",
                    noun(kind),
                    req.vmid,
                    req.node
                ),
                e,
            )
        })?;

    Ok(ConfigUpdate {
        kind,
        vmid: req.vmid,
        node: req.node.to_string(),
        changed: params.keys().cloned().collect(),
    })
}
