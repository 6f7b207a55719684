use crate::proxmox::ProxmoxError;
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure categories reported back to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Arguments failed validation before any request was made.
    InvalidArgument,
    NotFound,
    Conflict,
    Unauthorized,
    /// Network failure or timeout talking to the API.
    Transport,
    /// The API answered with something we could not interpret.
    Unknown,
    /// A fault inside this server, caught at the dispatcher.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Transport => "transport_error",
            ErrorKind::Unknown => "unknown_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Wraps an API failure as `Failed to <action>: <detail>`.
    pub fn upstream(action: impl fmt::Display, err: ProxmoxError) -> Self {
        Self::new(classify(&err), format!("Failed to {}: {}", action, detail(&err)))
    }
}

impl From<ProxmoxError> for ToolError {
    fn from(err: ProxmoxError) -> Self {
        Self::new(classify(&err), detail(&err))
    }
}

pub fn classify(err: &ProxmoxError) -> ErrorKind {
    match err {
        ProxmoxError::Api(status, body) => classify_status(*status, body),
        ProxmoxError::Auth(_) => ErrorKind::Unauthorized,
        ProxmoxError::Request(e) if e.is_decode() => ErrorKind::Unknown,
        ProxmoxError::Request(_) => ErrorKind::Transport,
        ProxmoxError::Json(_) | ProxmoxError::Url(_) => ErrorKind::Unknown,
    }
}

fn classify_status(status: StatusCode, body: &str) -> ErrorKind {
    match status.as_u16() {
        404 => return ErrorKind::NotFound,
        401 | 403 => return ErrorKind::Unauthorized,
        409 => return ErrorKind::Conflict,
        // pveproxy uses 595/596 when it cannot reach the target node.
        595 | 596 => return ErrorKind::Transport,
        _ => {}
    }

    let body = body.to_lowercase();
    if body.contains("does not exist") || body.contains("no such") || body.contains("not found") {
        ErrorKind::NotFound
    } else if body.contains("already exists") {
        ErrorKind::Conflict
    } else {
        ErrorKind::Unknown
    }
}

/// One-line description; prefers the `message` field Proxmox puts in error bodies.
fn detail(err: &ProxmoxError) -> String {
    match err {
        ProxmoxError::Api(status, body) => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .and_then(|m| m.as_str())
                        .map(|m| m.trim().to_string())
                })
                .filter(|m| !m.is_empty());
            match message {
                Some(m) => format!("{} ({})", m, status),
                None if body.trim().is_empty() => status.to_string(),
                None => format!("{} - {}", status, body.trim()),
            }
        }
        other => other.to_string(),
    }
}
