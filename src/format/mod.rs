//! Renders tool outcomes as themed text for the agent.
//!
//! Rendering is pure: the same [`ToolOutput`] and [`Theme`] always produce
//! the same text, and nothing here touches the network or global state.

mod theme;
mod units;

pub use theme::Theme;

use theme::Glyphs;
use units::{format_bytes, format_percent, format_uptime};

use crate::proxmox::GuestKind;
use crate::tools::output::{
    ClusterSummary, CommandOutput, ConfigUpdate, ContainerConfigView, CreationResult,
    GuestSummary, NodeStatusView, NodeSummary, PowerAction, PowerResult, SnapshotAction,
    SnapshotListView, SnapshotOperation, StorageSummary, Usage, VmConfigView,
};
use crate::tools::{ToolError, ToolOutput};

const NOT_AVAILABLE: &str = "N/A";

struct Block {
    glyphs: &'static Glyphs,
    lines: Vec<String>,
}

impl Block {
    fn new(theme: Theme) -> Self {
        Self {
            glyphs: theme.glyphs(),
            lines: Vec::new(),
        }
    }

    fn line(&mut self, glyph: &str, text: impl AsRef<str>) -> &mut Self {
        self.lines.push(format!("{} {}", glyph, text.as_ref()));
        self
    }

    fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    fn item(&mut self, label: &str, value: impl std::fmt::Display) -> &mut Self {
        self.lines
            .push(format!("  {} {}: {}", self.glyphs.bullet, label, value));
        self
    }

    fn item_opt(&mut self, label: &str, value: Option<impl std::fmt::Display>) -> &mut Self {
        match value {
            Some(v) => self.item(label, v),
            None => self.item(label, NOT_AVAILABLE),
        }
    }

    fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    fn finish(&self) -> String {
        self.lines.join("\n")
    }
}

fn usage(u: &Usage) -> String {
    format!(
        "{} / {} ({})",
        format_bytes(u.used),
        format_bytes(u.total),
        format_percent(u.percent())
    )
}

fn kind_title(kind: GuestKind) -> &'static str {
    match kind {
        GuestKind::Qemu => "VM",
        GuestKind::Lxc => "Container",
    }
}

fn kind_glyph(g: &Glyphs, kind: GuestKind) -> &'static str {
    match kind {
        GuestKind::Qemu => g.vm,
        GuestKind::Lxc => g.container,
    }
}

pub fn render(output: &ToolOutput, theme: Theme) -> String {
    match output {
        ToolOutput::NodeList(nodes) => node_list(nodes, theme),
        ToolOutput::NodeStatus(status) => node_status(status, theme),
        ToolOutput::VmList(vms) => guest_list(vms, GuestKind::Qemu, theme),
        ToolOutput::ContainerList(cts) => guest_list(cts, GuestKind::Lxc, theme),
        ToolOutput::VmPower(result) | ToolOutput::ContainerPower(result) => power(result, theme),
        ToolOutput::VmConfig(config) => vm_config(config, theme),
        ToolOutput::ContainerConfig(config) => container_config(config, theme),
        ToolOutput::VmCreation(result) => creation(result, GuestKind::Qemu, theme),
        ToolOutput::ContainerCreation(result) => creation(result, GuestKind::Lxc, theme),
        ToolOutput::ConfigUpdated(update) => config_updated(update, theme),
        ToolOutput::SnapshotList(list) => snapshot_list(list, theme),
        ToolOutput::SnapshotResult(op) => snapshot_result(op, theme),
        ToolOutput::StorageList(pools) => storage_list(pools, theme),
        ToolOutput::ClusterStatus(summary) => cluster_status(summary, theme),
        ToolOutput::CommandResult(output) => command_result(output, theme),
    }
}

/// One line: glyph, kind, message.
pub fn render_error(err: &ToolError, theme: Theme) -> String {
    format!("{} {}: {}", theme.glyphs().error, err.kind, err.message)
}

fn node_list(nodes: &[NodeSummary], theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    if nodes.is_empty() {
        return b.line(g.node, "No nodes found").finish();
    }
    b.line(g.node, "Proxmox Nodes");
    for node in nodes {
        b.blank()
            .line(g.node, &node.node)
            .item("Status", node.status.to_uppercase())
            .item("Uptime", format_uptime(node.uptime))
            .item_opt("CPU Cores", node.cpus)
            .item("Memory", usage(&node.memory));
        if let Some(disk) = &node.disk {
            b.item("Disk", usage(disk));
        }
    }
    b.finish()
}

fn node_status(status: &NodeStatusView, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    b.line(g.node, format!("Node: {}", status.node))
        .item("Uptime", format_uptime(status.uptime))
        .item_opt("CPU Cores", status.cpus)
        .item_opt("CPU Model", status.cpu_model.as_deref())
        .item_opt("CPU Usage", status.cpu_usage.map(|c| format_percent(c * 100.0)))
        .item("Memory", usage(&status.memory));
    if let Some(rootfs) = &status.rootfs {
        b.item("Root FS", usage(rootfs));
    }
    if let Some(version) = &status.version {
        b.item("Version", version);
    }
    b.finish()
}

fn guest_list(guests: &[GuestSummary], kind: GuestKind, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let glyph = kind_glyph(b.glyphs, kind);
    let (title, empty) = match kind {
        GuestKind::Qemu => ("Virtual Machines", "No virtual machines found"),
        GuestKind::Lxc => ("Containers", "No containers found"),
    };
    if guests.is_empty() {
        return b.line(glyph, empty).finish();
    }
    b.line(glyph, title);
    for guest in guests {
        b.blank()
            .line(glyph, format!("{} (ID: {})", guest.name, guest.vmid))
            .item("Status", guest.status.to_uppercase())
            .item("Node", &guest.node)
            .item_opt("CPU Cores", guest.cpus)
            .item("Memory", usage(&guest.memory));
    }
    b.finish()
}

fn power(result: &PowerResult, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    let noun = kind_title(result.kind);
    let action_glyph = match result.action {
        PowerAction::Start => g.start,
        PowerAction::Stop | PowerAction::Shutdown => g.stop,
        PowerAction::Reboot => g.restart,
        PowerAction::Suspend => g.suspend,
        PowerAction::Resume => g.resume,
        PowerAction::Destroy => g.delete,
    };
    b.line(
        g.success,
        format!("{} {} Successful", noun, result.action.title()),
    )
    .blank()
    .line(kind_glyph(g, result.kind), format!("{} {}", noun, result.vmid))
    .item("Node", &result.node)
    .item("Operation", result.action.title())
    .item("Task", &result.task)
    .blank()
    .line(
        action_glyph,
        format!("{} {} requested", noun, result.action.as_str()),
    );
    b.finish()
}

fn vm_config(config: &VmConfigView, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    b.line(g.success, "VM Configuration Retrieved")
        .blank()
        .line(g.vm, format!("VM {}", config.vmid))
        .item("Node", &config.node)
        .item_opt("Name", config.name.as_deref())
        .item_opt("CPU Cores", config.cores.as_deref())
        .item_opt("Sockets", config.sockets.as_deref())
        .item_opt("Memory", config.memory.as_ref().map(|m| format!("{} MB", m)))
        .item_opt("OS Type", config.ostype.as_deref());
    if let Some(description) = &config.description {
        b.item("Description", description.trim());
    }
    if let Some(bootdisk) = &config.bootdisk {
        b.item("Boot Disk", bootdisk);
    }
    b.finish()
}

fn container_config(config: &ContainerConfigView, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    b.line(g.success, "Container Configuration Retrieved")
        .blank()
        .line(g.container, format!("Container {}", config.vmid))
        .item("Node", &config.node)
        .item_opt("Hostname", config.hostname.as_deref())
        .item_opt("CPU Cores", config.cores.as_deref())
        .item_opt("Memory", config.memory.as_ref().map(|m| format!("{} MB", m)))
        .item_opt("Swap", config.swap.as_ref().map(|m| format!("{} MB", m)))
        .item_opt("OS Type", config.ostype.as_deref());
    if let Some(rootfs) = &config.rootfs {
        b.item("Root FS", rootfs);
    }
    if let Some(arch) = &config.arch {
        b.item("Architecture", arch);
    }
    if let Some(description) = &config.description {
        b.item("Description", description.trim());
    }
    b.finish()
}

fn creation(result: &CreationResult, kind: GuestKind, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    let noun = kind_title(kind);
    b.line(g.success, format!("{} Created Successfully", noun))
        .blank()
        .line(
            kind_glyph(g, kind),
            format!("{} (ID: {})", result.name, result.vmid),
        )
        .item("Node", &result.node);
    match kind {
        GuestKind::Qemu => b.item("OS Type", &result.origin),
        GuestKind::Lxc => b.item("Source", &result.origin),
    };
    if let Some(cores) = result.cores {
        b.item("CPU Cores", cores);
    }
    if let Some(memory) = result.memory_mb {
        b.item("Memory", format!("{} MB", memory));
    }
    b.item("Storage", &result.storage)
        .item("Task", &result.task)
        .blank()
        .line(
            g.info,
            match kind {
                GuestKind::Qemu => "VM is ready for configuration and startup",
                GuestKind::Lxc => "Container is ready for startup",
            },
        );
    b.finish()
}

fn config_updated(update: &ConfigUpdate, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    let noun = kind_title(update.kind);
    b.line(g.success, format!("{} Configuration Updated", noun))
        .blank()
        .line(kind_glyph(g, update.kind), format!("{} {}", noun, update.vmid))
        .item("Node", &update.node)
        .item("Changed", update.changed.join(", "));
    b.finish()
}

fn snapshot_list(list: &SnapshotListView, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    if list.snapshots.is_empty() {
        return b
            .line(
                g.snapshot,
                format!("No snapshots found for container {}", list.vmid),
            )
            .finish();
    }
    b.line(
        g.snapshot,
        format!("Snapshots of Container {} on {}", list.vmid, list.node),
    );
    for snap in &list.snapshots {
        b.blank().line(g.snapshot, &snap.name);
        if let Some(description) = &snap.description {
            b.item("Description", description.trim());
        }
        if let Some(snaptime) = snap.snaptime {
            b.item("Created (unix time)", snaptime);
        }
        if let Some(parent) = &snap.parent {
            b.item("Parent", parent);
        }
    }
    b.finish()
}

fn snapshot_result(op: &SnapshotOperation, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    let action_glyph = match op.action {
        SnapshotAction::Create => g.create,
        SnapshotAction::Delete => g.delete,
        SnapshotAction::Rollback => g.restart,
    };
    b.line(
        g.success,
        format!("Container Snapshot {} Successful", op.action.title()),
    )
    .blank()
    .line(g.snapshot, format!("Snapshot: {}", op.snapname))
    .item("Container ID", op.vmid)
    .item("Node", &op.node)
    .item("Operation", op.action.title())
    .item("Task", &op.task)
    .blank()
    .line(action_glyph, format!("Snapshot {} requested", op.action.as_str()));
    b.finish()
}

fn storage_list(pools: &[StorageSummary], theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    if pools.is_empty() {
        return b.line(g.storage, "No storage pools found").finish();
    }
    b.line(g.storage, "Storage Pools");
    for pool in pools {
        b.blank()
            .line(g.storage, format!("{} ({})", pool.storage, pool.node))
            .item("Status", if pool.active { "ACTIVE" } else { "INACTIVE" })
            .item("Type", &pool.storage_type);
        if let Some(content) = &pool.content {
            b.item("Content", content);
        }
        b.item("Shared", if pool.shared { "yes" } else { "no" })
            .item("Usage", usage(&pool.usage));
    }
    b.finish()
}

fn cluster_status(summary: &ClusterSummary, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    let online = summary.nodes.iter().filter(|n| n.online).count();
    b.line(g.cluster, "Proxmox Cluster")
        .blank()
        .item("Name", summary.name.as_deref().unwrap_or("standalone"))
        .item("Quorum", if summary.quorate { "OK" } else { "NOT OK" })
        .item(
            "Nodes",
            format!("{} ({} online)", summary.nodes.len(), online),
        );
    for node in &summary.nodes {
        let state = if node.online { "online" } else { "offline" };
        match &node.ip {
            Some(ip) => b.text(format!("    {} {}: {} ({})", g.bullet, node.name, state, ip)),
            None => b.text(format!("    {} {}: {}", g.bullet, node.name, state)),
        };
    }
    b.finish()
}

fn command_result(output: &CommandOutput, theme: Theme) -> String {
    let mut b = Block::new(theme);
    let g = b.glyphs;
    if output.exited {
        b.line(g.success, "Command Executed");
    } else {
        b.line(g.running, "Command Still Running");
    }
    b.blank()
        .line(g.command, format!("VM {}", output.vmid))
        .item("Node", &output.node)
        .item("Command", &output.command)
        .item("PID", output.pid);
    if output.exited {
        b.item_opt("Exit Code", output.exit_code);
    }
    if let Some(stdout) = output.stdout.as_deref().filter(|s| !s.is_empty()) {
        b.blank().text("Output:").text(stdout.trim_end());
    }
    if let Some(stderr) = output.stderr.as_deref().filter(|s| !s.is_empty()) {
        b.blank().text("Errors:").text(stderr.trim_end());
    }
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxmox::VmId;
    use crate::tools::output::{ClusterNode, SnapshotEntry};
    use crate::tools::ErrorKind;

    fn vmid(id: u32) -> VmId {
        VmId::new(id).unwrap()
    }

    fn sample_vm_list() -> ToolOutput {
        ToolOutput::VmList(vec![GuestSummary {
            vmid: vmid(100),
            name: "ubuntu".to_string(),
            status: "running".to_string(),
            node: "pve1".to_string(),
            cpus: Some(2.0),
            memory: Usage {
                used: 1024 * 1024 * 1024,
                total: 4 * 1024 * 1024 * 1024,
            },
        }])
    }

    #[test]
    fn test_render_is_deterministic() {
        let output = sample_vm_list();
        for theme in [Theme::Emoji, Theme::Plain] {
            assert_eq!(render(&output, theme), render(&output, theme));
        }
    }

    #[test]
    fn test_vm_list_emoji() {
        let text = render(&sample_vm_list(), Theme::Emoji);
        assert!(text.starts_with("🗃️ Virtual Machines"));
        assert!(text.contains("🗃️ ubuntu (ID: 100)"));
        assert!(text.contains("  • Status: RUNNING"));
        assert!(text.contains("  • CPU Cores: 2"));
        assert!(text.contains("  • Memory: 1.00 GiB / 4.00 GiB (25.0%)"));
    }

    #[test]
    fn test_plain_theme_is_ascii() {
        let text = render(&sample_vm_list(), Theme::Plain);
        assert!(text.is_ascii(), "{}", text);
        assert!(text.contains("[VM] ubuntu (ID: 100)"));
        assert!(text.contains("  - Node: pve1"));
    }

    #[test]
    fn test_empty_container_list() {
        let text = render(&ToolOutput::ContainerList(vec![]), Theme::Emoji);
        assert_eq!(text, "📦 No containers found");
    }

    #[test]
    fn test_power_result() {
        let output = ToolOutput::VmPower(PowerResult {
            kind: GuestKind::Qemu,
            action: PowerAction::Start,
            vmid: vmid(100),
            node: "pve1".to_string(),
            task: "UPID:pve1:0001:qmstart:100:root@pam:".to_string(),
        });
        let text = render(&output, Theme::Plain);
        assert!(text.starts_with("[OK] VM Start Successful"));
        assert!(text.contains("  - Operation: Start"));
        assert!(text.contains("UPID:pve1:0001"));
    }

    #[test]
    fn test_zero_total_usage_does_not_divide_by_zero() {
        let output = ToolOutput::StorageList(vec![StorageSummary {
            storage: "local".to_string(),
            node: "pve1".to_string(),
            storage_type: "dir".to_string(),
            content: None,
            active: false,
            shared: false,
            usage: Usage::default(),
        }]);
        let text = render(&output, Theme::Plain);
        assert!(text.contains("Usage: 0 B / 0 B (0.0%)"));
        assert!(text.contains("Status: INACTIVE"));
    }

    #[test]
    fn test_cluster_status_standalone() {
        let output = ToolOutput::ClusterStatus(ClusterSummary {
            name: None,
            quorate: true,
            nodes: vec![ClusterNode {
                name: "pve1".to_string(),
                online: true,
                ip: Some("10.0.0.5".to_string()),
            }],
        });
        let text = render(&output, Theme::Plain);
        assert!(text.contains("Name: standalone"));
        assert!(text.contains("Quorum: OK"));
        assert!(text.contains("pve1: online (10.0.0.5)"));
    }

    #[test]
    fn test_command_output_sections() {
        let output = ToolOutput::CommandResult(CommandOutput {
            vmid: vmid(100),
            node: "pve1".to_string(),
            command: "uname -a".to_string(),
            pid: 42,
            exited: true,
            exit_code: Some(0),
            stdout: Some("Linux vm1 6.1.0\n".to_string()),
            stderr: None,
        });
        let text = render(&output, Theme::Plain);
        assert!(text.contains("Exit Code: 0"));
        assert!(text.ends_with("Output:\nLinux vm1 6.1.0"));
        assert!(!text.contains("Errors:"));
    }

    #[test]
    fn test_snapshot_list_entries() {
        let output = ToolOutput::SnapshotList(SnapshotListView {
            vmid: vmid(200),
            node: "pve1".to_string(),
            snapshots: vec![SnapshotEntry {
                name: "pre-upgrade".to_string(),
                description: Some("before apt upgrade".to_string()),
                snaptime: Some(1_700_000_000),
                parent: None,
            }],
        });
        let text = render(&output, Theme::Emoji);
        assert!(text.contains("📸 pre-upgrade"));
        assert!(text.contains("Description: before apt upgrade"));
    }

    #[test]
    fn test_render_error_is_one_line() {
        let err = ToolError::new(ErrorKind::NotFound, "VM 999 does not exist");
        let text = render_error(&err, Theme::Plain);
        assert_eq!(text, "[ERROR] not_found: VM 999 does not exist");
        assert!(!text.contains('\n'));
    }
}
