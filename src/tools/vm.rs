use super::output::{CreationResult, PowerAction, ToolOutput, VmConfigView};
use super::{flexible_opt_u64, flexible_u64, guest, GuestRef, NodeName, NoArgs, ToolError, ToolResult};
use crate::proxmox::{GuestKind, ProxmoxClient, VmId};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

/// Size of the system disk attached to new VMs, in GiB.
const DEFAULT_DISK_GB: u32 = 32;
const DEFAULT_VM_NET: &str = "virtio,bridge=vmbr0";

#[derive(Debug, Deserialize)]
pub struct CreateVmRequest {
    pub node: NodeName,
    pub vmid: VmId,
    pub name: String,
    #[serde(deserialize_with = "flexible_u64")]
    pub cores: u64,
    #[serde(deserialize_with = "flexible_u64")]
    pub memory: u64,
    pub storage: String,
    pub ostype: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVmConfigRequest {
    #[serde(flatten)]
    pub target: GuestRef,
    #[serde(default, deserialize_with = "flexible_opt_u64")]
    pub cores: Option<u64>,
    #[serde(default, deserialize_with = "flexible_opt_u64")]
    pub memory: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn get_vms(client: &ProxmoxClient, _req: NoArgs) -> ToolResult {
    let vms = guest::list_all(client, GuestKind::Qemu).await?;
    Ok(ToolOutput::VmList(vms))
}

pub async fn create_vm(client: &ProxmoxClient, req: CreateVmRequest) -> ToolResult {
    if req.name.trim().is_empty() {
        return Err(ToolError::invalid_argument("VM name must not be empty"));
    }
    if req.cores == 0 || req.memory == 0 {
        return Err(ToolError::invalid_argument(
            "cores and memory must be greater than zero",
        ));
    }

    guest::ensure_id_free(client, &req.node, req.vmid, GuestKind::Qemu).await?;

    let mut params = Map::new();
    params.insert("vmid".to_string(), json!(req.vmid.get()));
    params.insert("name".to_string(), json!(req.name));
    params.insert("cores".to_string(), json!(req.cores));
    params.insert("memory".to_string(), json!(req.memory));
    params.insert("ostype".to_string(), json!(req.ostype));
    params.insert(
        "sata0".to_string(),
        json!(format!("{}:{}", req.storage, DEFAULT_DISK_GB)),
    );
    params.insert("net0".to_string(), json!(DEFAULT_VM_NET));

    info!(node = %req.node, vmid = %req.vmid, name = %req.name, "Creating VM");
    let task = client
        .create_guest(req.node.as_str(), GuestKind::Qemu, &params)
        .await
        .map_err(|e| ToolError::upstream(format!("create VM {} on node {}", req.name, req.node), e))?;

    Ok(ToolOutput::VmCreation(CreationResult {
        vmid: req.vmid,
        node: req.node.to_string(),
        name: req.name,
        origin: req.ostype,
        cores: u32::try_from(req.cores).ok(),
        memory_mb: Some(req.memory),
        storage: req.storage,
        task,
    }))
}

pub async fn start_vm(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Start).await
}

pub async fn stop_vm(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Stop).await
}

pub async fn shutdown_vm(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Shutdown).await
}

pub async fn reboot_vm(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    power(client, req, PowerAction::Reboot).await
}

async fn power(client: &ProxmoxClient, req: GuestRef, action: PowerAction) -> ToolResult {
    let result = guest::power(client, GuestKind::Qemu, req, action).await?;
    Ok(ToolOutput::VmPower(result))
}

pub async fn get_vm_config(client: &ProxmoxClient, req: GuestRef) -> ToolResult {
    info!(node = %req.node, vmid = %req.vmid, "Getting VM configuration");
    let config = client
        .get_vm_config(req.node.as_str(), req.vmid)
        .await
        .map_err(|e| {
            ToolError::upstream(
                format!("get configuration for VM {} on node {}", req.vmid, req.node),
                e,
            )
        })?;

    Ok(ToolOutput::VmConfig(VmConfigView {
        vmid: req.vmid,
        node: req.node.to_string(),
        name: config.name,
        cores: config.cores,
        sockets: config.sockets,
        memory: config.memory,
        ostype: config.ostype,
        description: config.description,
        bootdisk: config.bootdisk.or(config.boot),
    }))
}

pub async fn update_vm_config(client: &ProxmoxClient, req: UpdateVmConfigRequest) -> ToolResult {
    let mut params = Map::new();
    if let Some(cores) = req.cores {
        params.insert("cores".to_string(), Value::from(cores));
    }
    if let Some(memory) = req.memory {
        params.insert("memory".to_string(), Value::from(memory));
    }
    if let Some(name) = req.name {
        params.insert("name".to_string(), Value::from(name));
    }
    if let Some(description) = req.description {
        params.insert("description".to_string(), Value::from(description));
    }

    let update = guest::update_config(client, GuestKind::Qemu, req.target, params).await?;
    Ok(ToolOutput::ConfigUpdated(update))
}
