//! Tool registry and dispatch.
//!
//! Binds each tool name to its schema and to the function in `tools` that
//! implements it. Arguments are decoded into the tool's typed request at this
//! boundary, and any panic inside a tool is caught here and reported as an
//! internal error so the protocol loop never sees it.

use crate::format::Theme;
use crate::proxmox::ProxmoxClient;
use crate::tools::{
    cluster, console, container, node, parse_args, storage, vm, ErrorKind, ToolError, ToolResult,
};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn node_prop() -> Value {
    json!({ "type": "string", "description": "Node name (e.g. 'pve1')" })
}

fn vmid_prop(description: &str) -> Value {
    json!({ "type": ["integer", "string"], "description": description })
}

fn guest_schema(noun: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "node": node_prop(),
            "vmid": vmid_prop(&format!("{} ID (e.g. '100')", noun)),
        },
        "required": ["node", "vmid"]
    })
}

fn snapshot_schema(with_description: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "node": node_prop(),
            "vmid": vmid_prop("Container ID (e.g. '200')"),
            "snapname": { "type": "string", "description": "Snapshot name (e.g. 'pre-upgrade')" },
        },
        "required": ["node", "vmid", "snapname"]
    });
    if with_description {
        schema["properties"]["description"] =
            json!({ "type": "string", "description": "Optional snapshot description" });
    }
    schema
}

/// Every tool this server exposes, in catalogue order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let no_args = json!({ "type": "object", "properties": {}, "required": [] });
    let vm = guest_schema("VM");
    let ct = guest_schema("Container");

    vec![
        // Nodes
        tool(
            "get_nodes",
            "List all nodes in the Proxmox cluster with their status, uptime, CPU, memory and disk usage.",
            no_args.clone(),
        ),
        tool(
            "get_node_status",
            "Get detailed status information for a specific Proxmox node.",
            json!({
                "type": "object",
                "properties": { "node": node_prop() },
                "required": ["node"]
            }),
        ),
        // Virtual machines
        tool(
            "get_vms",
            "List all virtual machines across the cluster with their status and resource usage.",
            no_args.clone(),
        ),
        tool(
            "create_vm",
            "Create a new virtual machine on a Proxmox node. Fails if the VM ID is already in use.",
            json!({
                "type": "object",
                "properties": {
                    "node": node_prop(),
                    "vmid": vmid_prop("VM ID number (e.g. '100')"),
                    "name": { "type": "string", "description": "VM name (e.g. 'ubuntu-server')" },
                    "cores": { "type": ["integer", "string"], "description": "CPU cores (e.g. 2)" },
                    "memory": { "type": ["integer", "string"], "description": "Memory in MB (e.g. 2048)" },
                    "storage": { "type": "string", "description": "Storage pool (e.g. 'local-lvm')" },
                    "ostype": { "type": "string", "description": "OS type (e.g. 'l26', 'win10', 'other')" }
                },
                "required": ["node", "vmid", "name", "cores", "memory", "storage", "ostype"]
            }),
        ),
        tool("start_vm", "Start a virtual machine.", vm.clone()),
        tool("stop_vm", "Stop (power off) a virtual machine.", vm.clone()),
        tool("shutdown_vm", "Shut down a virtual machine gracefully via ACPI.", vm.clone()),
        tool("reboot_vm", "Reboot (reset) a virtual machine.", vm.clone()),
        tool("get_vm_config", "Get the configuration of a virtual machine.", vm),
        tool(
            "update_vm_config",
            "Update virtual machine configuration. At least one of cores, memory, name or description is required.",
            json!({
                "type": "object",
                "properties": {
                    "node": node_prop(),
                    "vmid": vmid_prop("VM ID number (e.g. '100')"),
                    "cores": { "type": ["integer", "string"], "description": "CPU cores (e.g. 4)" },
                    "memory": { "type": ["integer", "string"], "description": "Memory in MB (e.g. 4096)" },
                    "name": { "type": "string", "description": "VM name (e.g. 'new-name')" },
                    "description": { "type": "string", "description": "VM description" }
                },
                "required": ["node", "vmid"]
            }),
        ),
        // Containers
        tool(
            "get_containers",
            "List all LXC containers across the cluster with their status and resource usage.",
            no_args.clone(),
        ),
        tool(
            "create_container",
            "Create a new LXC container from a template. Fails if the container ID is already in use.",
            json!({
                "type": "object",
                "properties": {
                    "node": node_prop(),
                    "vmid": vmid_prop("Container ID (e.g. '200')"),
                    "hostname": { "type": "string", "description": "Container hostname" },
                    "template": {
                        "type": "string",
                        "description": "OS template volume (e.g. 'local:vztmpl/debian-12-standard_12.2-1_amd64.tar.zst')"
                    },
                    "storage": { "type": "string", "description": "Storage pool for the root filesystem" },
                    "cores": { "type": ["integer", "string"], "description": "CPU cores" },
                    "memory": { "type": ["integer", "string"], "description": "Memory in MB" },
                    "password": { "type": "string", "description": "Root password" }
                },
                "required": ["node", "vmid", "hostname", "template", "storage", "cores", "memory", "password"]
            }),
        ),
        tool("start_container", "Start an LXC container.", ct.clone()),
        tool("stop_container", "Stop (power off) an LXC container.", ct.clone()),
        tool("shutdown_container", "Shut down an LXC container gracefully.", ct.clone()),
        tool("reboot_container", "Reboot an LXC container.", ct.clone()),
        tool("suspend_container", "Suspend (freeze) an LXC container.", ct.clone()),
        tool("resume_container", "Resume a suspended LXC container.", ct.clone()),
        tool(
            "destroy_container",
            "Destroy an LXC container and its volumes. The container must be stopped.",
            ct.clone(),
        ),
        tool("get_container_config", "Get the configuration of an LXC container.", ct.clone()),
        tool(
            "update_container_config",
            "Update LXC container configuration. At least one of cores, memory, hostname or description is required.",
            json!({
                "type": "object",
                "properties": {
                    "node": node_prop(),
                    "vmid": vmid_prop("Container ID (e.g. '200')"),
                    "cores": { "type": ["integer", "string"], "description": "CPU cores" },
                    "memory": { "type": ["integer", "string"], "description": "Memory in MB" },
                    "hostname": { "type": "string", "description": "Container hostname" },
                    "description": { "type": "string", "description": "Container description" }
                },
                "required": ["node", "vmid"]
            }),
        ),
        tool(
            "clone_container",
            "Clone an LXC container to a new ID.",
            json!({
                "type": "object",
                "properties": {
                    "node": node_prop(),
                    "vmid": vmid_prop("Source container ID"),
                    "newid": vmid_prop("ID for the clone"),
                    "name": { "type": "string", "description": "Hostname for the clone" },
                    "storage": { "type": "string", "description": "Target storage pool" }
                },
                "required": ["node", "vmid", "newid", "name", "storage"]
            }),
        ),
        tool(
            "get_container_snapshots",
            "List the snapshots of an LXC container.",
            ct,
        ),
        tool(
            "create_container_snapshot",
            "Create a snapshot of an LXC container.",
            snapshot_schema(true),
        ),
        tool(
            "delete_container_snapshot",
            "Delete a snapshot of an LXC container.",
            snapshot_schema(false),
        ),
        tool(
            "rollback_container_snapshot",
            "Roll an LXC container back to a snapshot.",
            snapshot_schema(false),
        ),
        // Storage, cluster, console
        tool(
            "get_storage",
            "List storage pools across the cluster with their type, status and usage.",
            no_args.clone(),
        ),
        tool(
            "get_cluster_status",
            "Get overall Proxmox cluster health: name, quorum and node membership.",
            no_args,
        ),
        tool(
            "execute_vm_command",
            "Execute a command inside a VM through the QEMU guest agent and return its output.",
            json!({
                "type": "object",
                "properties": {
                    "node": node_prop(),
                    "vmid": vmid_prop("VM ID number (e.g. '100')"),
                    "command": { "type": "string", "description": "Command to run (e.g. 'uname -a')" }
                },
                "required": ["node", "vmid", "command"]
            }),
        ),
    ]
}

/// Routes tool calls to their implementations over one shared client.
pub struct Dispatcher {
    client: ProxmoxClient,
    theme: Theme,
}

impl Dispatcher {
    pub fn new(client: ProxmoxClient, theme: Theme) -> Self {
        Self { client, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Runs one tool call to completion. Never panics and never returns
    /// anything but a [`ToolResult`].
    pub async fn call(&self, name: &str, args: &Value) -> ToolResult {
        let call_id = Uuid::new_v4();
        let span = info_span!("tool_call", tool = %name, call_id = %call_id);
        let started = Instant::now();

        let result = catch_fault(self.route(name, args))
            .instrument(span.clone())
            .await;

        span.in_scope(|| {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(output) => debug!(template = output.template(), elapsed_ms, "Tool call completed"),
                Err(e) => match e.kind {
                    ErrorKind::Transport | ErrorKind::Unknown | ErrorKind::Internal => {
                        error!(kind = %e.kind, error = %e.message, elapsed_ms, "Tool call failed")
                    }
                    _ => warn!(kind = %e.kind, error = %e.message, elapsed_ms, "Tool call failed"),
                },
            }
            result
        })
    }

    async fn route(&self, name: &str, args: &Value) -> ToolResult {
        let c = &self.client;
        match name {
            "get_nodes" => node::get_nodes(c, parse_args(args)?).await,
            "get_node_status" => node::get_node_status(c, parse_args(args)?).await,

            "get_vms" => vm::get_vms(c, parse_args(args)?).await,
            "create_vm" => vm::create_vm(c, parse_args(args)?).await,
            "start_vm" => vm::start_vm(c, parse_args(args)?).await,
            "stop_vm" => vm::stop_vm(c, parse_args(args)?).await,
            "shutdown_vm" => vm::shutdown_vm(c, parse_args(args)?).await,
            "reboot_vm" => vm::reboot_vm(c, parse_args(args)?).await,
            "get_vm_config" => vm::get_vm_config(c, parse_args(args)?).await,
            "update_vm_config" => vm::update_vm_config(c, parse_args(args)?).await,

            "get_containers" => container::get_containers(c, parse_args(args)?).await,
            "create_container" => container::create_container(c, parse_args(args)?).await,
            "start_container" => container::start_container(c, parse_args(args)?).await,
            "stop_container" => container::stop_container(c, parse_args(args)?).await,
            "shutdown_container" => container::shutdown_container(c, parse_args(args)?).await,
            "reboot_container" => container::reboot_container(c, parse_args(args)?).await,
            "suspend_container" => container::suspend_container(c, parse_args(args)?).await,
            "resume_container" => container::resume_container(c, parse_args(args)?).await,
            "destroy_container" => container::destroy_container(c, parse_args(args)?).await,
            "get_container_config" => container::get_container_config(c, parse_args(args)?).await,
            "update_container_config" => {
                container::update_container_config(c, parse_args(args)?).await
            }
            "clone_container" => container::clone_container(c, parse_args(args)?).await,
            "get_container_snapshots" => {
                container::get_container_snapshots(c, parse_args(args)?).await
            }
            "create_container_snapshot" => {
                container::create_container_snapshot(c, parse_args(args)?).await
            }
            "delete_container_snapshot" => {
                container::delete_container_snapshot(c, parse_args(args)?).await
            }
            "rollback_container_snapshot" => {
                container::rollback_container_snapshot(c, parse_args(args)?).await
            }

            "get_storage" => storage::get_storage(c, parse_args(args)?).await,
            "get_cluster_status" => cluster::get_cluster_status(c, parse_args(args)?).await,
            "execute_vm_command" => console::execute_vm_command(c, parse_args(args)?).await,

            _ => Err(ToolError::invalid_argument(format!("Unknown tool: {}", name))),
        }
    }
}

/// Turns a panic inside `fut` into a generic internal error.
async fn catch_fault<F>(fut: F) -> ToolResult
where
    F: Future<Output = ToolResult>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            error!(panic = %panic_message(payload.as_ref()), "Tool panicked");
            Err(ToolError::internal("internal error"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxmox::Ticket;
    use std::collections::HashSet;
    use std::time::Duration;

    fn offline_dispatcher() -> Dispatcher {
        // Nothing listens on port 1; any request fails fast with a transport error.
        let client = ProxmoxClient::new(
            "http://127.0.0.1:1",
            8006,
            false,
            Duration::from_secs(2),
            Ticket::new("root@pam", "t", "v"),
        )
        .unwrap();
        Dispatcher::new(client, Theme::Plain)
    }

    #[test]
    fn test_tool_names_are_unique() {
        let defs = tool_definitions();
        let names: HashSet<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
        assert_eq!(defs.len(), 29);
    }

    #[test]
    fn test_schemas_are_objects_with_required_list() {
        for def in tool_definitions() {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            let required = def.input_schema["required"].as_array().unwrap();
            for field in required {
                let field = field.as_str().unwrap();
                assert!(
                    def.input_schema["properties"].get(field).is_some(),
                    "{} requires undeclared {}",
                    def.name,
                    field
                );
            }
        }
    }

    #[test]
    fn test_definition_serializes_with_camel_case_schema() {
        let value = serde_json::to_value(&tool_definitions()[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = offline_dispatcher()
            .call("format_disk", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(err.message, "Unknown tool: format_disk");
    }

    #[tokio::test]
    async fn test_container_exec_is_not_offered() {
        assert!(tool_definitions()
            .iter()
            .all(|d| d.name != "execute_container_command"));

        let err = offline_dispatcher()
            .call(
                "execute_container_command",
                &json!({ "node": "pve1", "vmid": 200, "command": "uname -a" }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(err.message, "Unknown tool: execute_container_command");
    }

    #[tokio::test]
    async fn test_invalid_vmid_rejected_before_any_request() {
        let err = offline_dispatcher()
            .call("start_vm", &json!({ "node": "pve1", "vmid": "abc" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_every_defined_tool_is_routed() {
        let dispatcher = offline_dispatcher();
        for def in tool_definitions() {
            let result = dispatcher.call(&def.name, &json!({})).await;
            if let Err(e) = result {
                assert!(!e.message.starts_with("Unknown tool"), "{} is not routed", def.name);
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let err = offline_dispatcher()
            .call("get_nodes", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }

    async fn exploding_tool() -> ToolResult {
        panic!("index out of bounds in tool body")
    }

    #[tokio::test]
    async fn test_panicking_tool_becomes_internal_error() {
        let err = catch_fault(exploding_tool()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "internal error");
    }

    #[tokio::test]
    async fn test_fault_guard_passes_results_through() {
        let ok = catch_fault(async { Ok(crate::tools::ToolOutput::NodeList(Vec::new())) }).await;
        assert!(ok.is_ok());

        let err = catch_fault(async { Err(ToolError::conflict("taken")) }).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }
}
