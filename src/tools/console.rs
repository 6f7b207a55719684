use super::output::{CommandOutput, ToolOutput};
use super::{NodeName, ToolError, ToolResult};
use crate::proxmox::{ProxmoxClient, VmId};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ExecuteCommandRequest {
    pub node: NodeName,
    pub vmid: VmId,
    pub command: String,
}

/// Runs a command through the QEMU guest agent and reads its status once.
pub async fn execute_vm_command(client: &ProxmoxClient, req: ExecuteCommandRequest) -> ToolResult {
    // The agent takes argv, not a shell line.
    let argv: Vec<String> = req.command.split_whitespace().map(String::from).collect();
    if argv.is_empty() {
        return Err(ToolError::invalid_argument("command must not be empty"));
    }

    let what = format!("execute command on VM {} on node {}", req.vmid, req.node);
    info!(node = %req.node, vmid = %req.vmid, command = %req.command, "Executing guest agent command");

    let started = client
        .agent_exec(req.node.as_str(), req.vmid, &argv)
        .await
        .map_err(|e| ToolError::upstream(&what, e))?;
    let status = client
        .agent_exec_status(req.node.as_str(), req.vmid, started.pid)
        .await
        .map_err(|e| ToolError::upstream(&what, e))?;

    Ok(ToolOutput::CommandResult(CommandOutput {
        vmid: req.vmid,
        node: req.node.to_string(),
        command: req.command,
        pid: started.pid,
        exited: status.exited.unwrap_or(false),
        exit_code: status.exitcode,
        stdout: status.out_data,
        stderr: status.err_data,
    }))
}
