use super::output::{
    ContainerConfigView, CreationResult, PowerAction, SnapshotAction, SnapshotEntry,
    SnapshotListView, SnapshotOperation, ToolOutput,
};
use super::{
    flexible_opt_u64, flexible_u64, guest, GuestRef, NoArgs, NodeName, SnapshotName, ToolError,
    ToolResult,
};
use crate::proxmox::{GuestKind, ProxmoxClient, VmId};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

const DEFAULT_CT_NET: &str = "name=eth0,bridge=vmbr0,ip=dhcp";

/// Proxmox lists the live state as a pseudo-snapshot with this name.
const CURRENT_SNAPSHOT: &str = "current";

#[derive(Debug, Deserialize)]
pub struct CreateContainerRequest {
    pub node: NodeName,
    pub vmid: VmId,
    pub hostname: String,
    pub template: String,
    pub storage: String,
    #[serde(deserialize_with = "flexible_u64")]
    pub cores: u64,
    #[serde(deserialize_with = "flexible_u64")]
    pub memory: u64,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContainerConfigRequest {
    #[serde(flatten)]
    pub target: GuestRef,
    #[serde(default, deserialize_with = "flexible_opt_u64")]
    pub cores: Option<u64>,
    #[serde(default, deserialize_with = "flexible_opt_u64")]
    pub memory: Option<u64>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloneContainerRequest {
    pub node: NodeName,
    pub vmid: VmId,
    pub newid: VmId,
    pub name: String,
    pub storage: String,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    #[serde(flatten)]
    pub target: GuestRef,
    pub snapname: SnapshotName,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn get_containers(client: &ProxmoxClient, _req: NoArgs) -> ToolResult {
    let containers = guest::list_all(client, GuestKind::Lxc).await?;
    Ok(ToolOutput::ContainerList(containers))
}

pub async fn create_container(client: &ProxmoxClient, req: CreateContainerRequest) -> ToolResult {
    if req.hostname.trim().is_empty() || req.template.trim().is_empty() {
        return Err(ToolError::invalid_argument(
            "hostname and template must not be empty",
        ));
    }
    if req.cores == 0 || req.memory == 0 {
        return Err(ToolError::invalid_argument(
            "cores and memory must be greater than zero",
        ));
    }

    guest::ensure_id_free(client, &req.node, req.vmid, GuestKind::Lxc).await?;

    let mut params = Map::new();
    params.insert("vmid".to_string(), json!(req.vmid.get()));
    params.insert("hostname".to_string(), json!(req.hostname));
    params.insert("ostemplate".to_string(), json!(req.template));
    params.insert("storage".to_string(), json!(req.storage));
    params.insert("cores".to_string(), json!(req.cores));
    params.insert("memory".to_string(), json!(req.memory));
    params.insert("password".to_string(), json!(req.password));
    params.insert("net0".to_string(), json!(DEFAULT_CT_NET));

    info!(node = %req.node, vmid = %req.vmid, hostname = %req.hostname, "Creating container");
    let task = client
        .create_guest(req.node.as_str(), GuestKind::Lxc, &params)
        .await
        .map_err(|e| {
            ToolError::upstream(
                format!("create container {} on node {}", req.hostname, req.node),
                e,
            )
        })?;

    Ok(ToolOutput::ContainerCreation(CreationResult {
        vmid: req.vmid,
        node: req.node.to_string(),
        name: req.hostname,
        origin: req.template,
        cores: u32::try_from(req.cores).ok(),
        memory_mb: Some(req.memory),
        storage: req.storage,
        task,
    }))
}

pub async fn start_container(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Start).await
}

pub async fn stop_container(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Stop).await
}

pub async fn shutdown_container(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Shutdown).await
}

pub async fn reboot_container(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Reboot).await
}

pub async fn suspend_container(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Suspend).await
}

pub async fn resume_container(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Resume).await
}

pub async fn destroy_container(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Destroy).await
}

async fn power(client: &ProxmoxClient, req: GuestRef, action: PowerAction) -> ToolResult {
    let result = guest::power(client, GuestKind::Lxc, req, action).await?;
    Ok(ToolOutput::ContainerPower(result))
}

pub async fn get_container_config(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    info!(node = %req.node, vmid = %req.vmid, "Getting container configuration");
    let config = client
        .get_container_config(req.node.as_str(), req.vmid)
        .await
        .map_err(|e| {
            ToolError::upstream(
                format!(
                    "get configuration for container {} on node {}",
                    req.vmid, req.node
                ),
                e,
            )
        })?;

    Ok(ToolOutput::ContainerConfig(ContainerConfigView {
        vmid: req.vmid,
        node: req.node.to_string(),
        hostname: config.hostname,
        cores: config.cores,
        memory: config.memory,
        swap: config.swap,
        ostype: config.ostype,
        arch: config.arch,
        rootfs: config.rootfs,
        description: config.description,
    }))
}

pub async fn update_container_config(
    client: &ProxmoxClient,
    req: UpdateContainerConfigRequest,
) -> ToolResult {
    let mut params = Map::new();
    if let Some(cores) = req.cores {
        params.insert("cores".to_string(), Value::from(cores));
    }
    if let Some(memory) = req.memory {
        params.insert("memory".to_string(), Value::from(memory));
    }
    if let Some(hostname) = req.hostname {
        params.insert("hostname".to_string(), Value::from(hostname));
    }
    if let Some(description) = req.description {
        params.insert("description".to_string(), Value::from(description));
    }

    let update = guest::update_config(client, GuestKind::Lxc, req.target, params).await?;
    Ok(ToolOutput::ConfigUpdated(update))
}

pub async fn clone_container(client: &ProxmoxClient, req: CloneContainerRequest) -> ToolResult {
    if req.vmid == req.newid {
        return Err(ToolError::invalid_argument(
            "newid must differ from the source container id",
        ));
    }
    info!(node = %req.node, vmid = %req.vmid, newid = %req.newid, "Cloning container");

    let mut params = Map::new();
    params.insert("newid".to_string(), json!(req.newid.get()));
    params.insert("hostname".to_string(), json!(req.name));
    params.insert("storage".to_string(), json!(req.storage));

    let task = client
        .clone_guest(req.node.as_str(), req.vmid, GuestKind::Lxc, &params)
        .await
        .map_err(|e| {
            ToolError::upstream(
                format!(
                    "clone container {} to {} on node {}",
                    req.vmid, req.newid, req.node
                ),
                e,
            )
        })?;

    Ok(ToolOutput::ContainerCreation(CreationResult {
        vmid: req.newid,
        node: req.node.to_string(),
        name: req.name,
        origin: format!("clone of {}", req.vmid),
        cores: None,
        memory_mb: None,
        storage: req.storage,
        task,
    }))
}

pub async fn get_container_snapshots(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    info!(node = %req.node, vmid = %req.vmid, "Getting container snapshots");
    let snapshots = client
        .get_snapshots(req.node.as_str(), req.vmid, GuestKind::Lxc)
        .await
        .map_err(|e| {
            ToolError::upstream(
                format!(
                    "get snapshots for container {} on node {}",
                    req.vmid, req.node
                ),
                e,
            )
        })?;

    let mut entries: Vec<SnapshotEntry> = snapshots
        .into_iter()
        .filter(|s| s.name != CURRENT_SNAPSHOT)
        .map(|s| SnapshotEntry {
            name: s.name,
            description: s.description.filter(|d| !d.trim().is_empty()),
            snaptime: s.snaptime,
            parent: s.parent,
        })
        .collect();
    entries.sort_by(|a, b| a.snaptime.cmp(&b.snaptime).then_with(|| a.name.cmp(&b.name)));

    Ok(ToolOutput::SnapshotList(SnapshotListView {
        vmid: req.vmid,
        node: req.node.to_string(),
        snapshots: entries,
    }))
}

pub async fn create_container_snapshot(client: &ProxmoxClient, req: SnapshotRequest) -> ToolResult {
    snapshot(client, req, SnapshotAction::Create).await
}

pub async fn delete_container_snapshot(client: &ProxmoxClient, req: SnapshotRequest) -> ToolResult {
    snapshot(client, req, SnapshotAction::Delete).await
}

pub async fn rollback_container_snapshot(
    client: &ProxmoxClient,
    req: SnapshotRequest,
) -> ToolResult {
    snapshot(client, req, SnapshotAction::Rollback).await
}

async fn snapshot(client: &ProxmoxClient, req: SnapshotRequest, action: SnapshotAction) -> ToolResult {
    let GuestRef { node, vmid } = req.target;
    let snapname = req.snapname.as_str();
    info!(node = %node, vmid = %vmid, snapname, action = action.as_str(), "Container snapshot operation");

    let task = match action {
        SnapshotAction::Create => {
            let description = req.description.as_deref().filter(|d| !d.is_empty());
            client
                .create_snapshot(node.as_str(), vmid, GuestKind::Lxc, snapname, description)
                .await
        }
        SnapshotAction::Delete => {
            client
                .delete_snapshot(node.as_str(), vmid, GuestKind::Lxc, snapname)
                .await
        }
        SnapshotAction::Rollback => {
            client
                .rollback_snapshot(node.as_str(), vmid, GuestKind::Lxc, snapname)
                .await
        }
    }
    .map_err(|e| {
        ToolError::upstream(
            format!(
                "{} snapshot {} for container {} on node {}",
                action.as_str(),
                snapname,
                vmid,
                node
            ),
            e,
        )
    })?;

    Ok(ToolOutput::SnapshotResult(SnapshotOperation {
        action,
        vmid,
        node: node.to_string(),
        snapname: snapname.to_string(),
        task,
    }))
}
