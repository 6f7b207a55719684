//! Normalized success payloads, one variant per output template.

use crate::proxmox::{GuestKind, VmId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "template", content = "data", rename_all = "snake_case")]
pub enum ToolOutput {
    NodeList(Vec<NodeSummary>),
    NodeStatus(NodeStatusView),
    VmList(Vec<GuestSummary>),
    VmPower(PowerResult),
    VmConfig(VmConfigView),
    VmCreation(CreationResult),
    ContainerList(Vec<GuestSummary>),
    ContainerPower(PowerResult),
    ContainerConfig(ContainerConfigView),
    ContainerCreation(CreationResult),
    ConfigUpdated(ConfigUpdate),
    SnapshotList(SnapshotListView),
    SnapshotResult(SnapshotOperation),
    StorageList(Vec<StorageSummary>),
    ClusterStatus(ClusterSummary),
    CommandResult(CommandOutput),
}

impl ToolOutput {
    pub fn template(&self) -> &'static str {
        match self {
            ToolOutput::NodeList(_) => "node_list",
            ToolOutput::NodeStatus(_) => "node_status",
            ToolOutput::VmList(_) => "vm_list",
            ToolOutput::VmPower(_) => "vm_power",
            ToolOutput::VmConfig(_) => "vm_config",
            ToolOutput::VmCreation(_) => "vm_creation",
            ToolOutput::ContainerList(_) => "container_list",
            ToolOutput::ContainerPower(_) => "container_power",
            ToolOutput::ContainerConfig(_) => "container_config",
            ToolOutput::ContainerCreation(_) => "container_creation",
            ToolOutput::ConfigUpdated(_) => "config_updated",
            ToolOutput::SnapshotList(_) => "snapshot_list",
            ToolOutput::SnapshotResult(_) => "snapshot_result",
            ToolOutput::StorageList(_) => "storage_list",
            ToolOutput::ClusterStatus(_) => "cluster_status",
            ToolOutput::CommandResult(_) => "command_result",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub used: u64,
    pub total: u64,
}

impl Usage {
    pub fn new(used: Option<u64>, total: Option<u64>) -> Self {
        Self {
            used: used.unwrap_or(0),
            total: total.unwrap_or(0),
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub node: String,
    pub status: String,
    pub uptime: u64,
    pub cpus: Option<u32>,
    pub memory: Usage,
    pub disk: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStatusView {
    pub node: String,
    pub uptime: u64,
    pub cpus: Option<u32>,
    pub cpu_model: Option<String>,
    pub cpu_usage: Option<f64>,
    pub memory: Usage,
    pub rootfs: Option<Usage>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestSummary {
    pub vmid: VmId,
    pub name: String,
    pub status: String,
    pub node: String,
    pub cpus: Option<f64>,
    pub memory: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Start,
    Stop,
    Shutdown,
    Reboot,
    Suspend,
    Resume,
    Destroy,
}

impl PowerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerAction::Start => "start",
            PowerAction::Stop => "stop",
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reboot => "reboot",
            PowerAction::Suspend => "suspend",
            PowerAction::Resume => "resume",
            PowerAction::Destroy => "destroy",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PowerAction::Start => "Start",
            PowerAction::Stop => "Stop",
            PowerAction::Shutdown => "Shutdown",
            PowerAction::Reboot => "Reboot",
            PowerAction::Suspend => "Suspend",
            PowerAction::Resume => "Resume",
            PowerAction::Destroy => "Destroy",
        }
    }

    /// The `status/{endpoint}` segment. QEMU reboots go through a hard reset.
    pub fn status_endpoint(self, kind: GuestKind) -> Option<&'static str> {
        match (self, kind) {
            (PowerAction::Reboot, GuestKind::Qemu) => Some("reset"),
            (PowerAction::Destroy, _) => None,
            (action, _) => Some(action.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerResult {
    pub kind: GuestKind,
    pub action: PowerAction,
    pub vmid: VmId,
    pub node: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmConfigView {
    pub vmid: VmId,
    pub node: String,
    pub name: Option<String>,
    pub cores: Option<String>,
    pub sockets: Option<String>,
    pub memory: Option<String>,
    pub ostype: Option<String>,
    pub description: Option<String>,
    pub bootdisk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerConfigView {
    pub vmid: VmId,
    pub node: String,
    pub hostname: Option<String>,
    pub cores: Option<String>,
    pub memory: Option<String>,
    pub swap: Option<String>,
    pub ostype: Option<String>,
    pub arch: Option<String>,
    pub rootfs: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreationResult {
    pub vmid: VmId,
    pub node: String,
    pub name: String,
    /// OS type for VMs, template for containers, source id for clones.
    pub origin: String,
    pub cores: Option<u32>,
    pub memory_mb: Option<u64>,
    pub storage: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigUpdate {
    pub kind: GuestKind,
    pub vmid: VmId,
    pub node: String,
    pub changed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub description: Option<String>,
    pub snaptime: Option<i64>,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotListView {
    pub vmid: VmId,
    pub node: String,
    pub snapshots: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotAction {
    Create,
    Delete,
    Rollback,
}

impl SnapshotAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotAction::Create => "create",
            SnapshotAction::Delete => "delete",
            SnapshotAction::Rollback => "rollback",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SnapshotAction::Create => "Create",
            SnapshotAction::Delete => "Delete",
            SnapshotAction::Rollback => "Rollback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotOperation {
    pub action: SnapshotAction,
    pub vmid: VmId,
    pub node: String,
    pub snapname: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageSummary {
    pub storage: String,
    pub node: String,
    pub storage_type: String,
    pub content: Option<String>,
    pub active: bool,
    pub shared: bool,
    pub usage: Usage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterNode {
    pub name: String,
    pub online: bool,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    /// `None` for a standalone node that is not part of a cluster.
    pub name: Option<String>,
    pub quorate: bool,
    pub nodes: Vec<ClusterNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    pub vmid: VmId,
    pub node: String,
    pub command: String,
    pub pid: i64,
    pub exited: bool,
    pub exit_code: Option<i64>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}
