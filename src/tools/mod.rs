//! Tool implementations. Each takes the shared client plus a typed request,
//! issues its API call(s) and returns a normalized [`ToolOutput`].

pub mod cluster;
pub mod console;
pub mod container;
pub mod error;
mod guest;
pub mod node;
pub mod output;
pub mod storage;
pub mod vm;

pub use error::{ErrorKind, ToolError};
pub use output::ToolOutput;

use crate::proxmox::VmId;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

pub type ToolResult = Result<ToolOutput, ToolError>;

/// Decodes tool arguments into a request struct. A missing argument object
/// is treated as empty so zero-argument tools accept `null`.
pub fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(args)
        .map_err(|e| ToolError::invalid_argument(format!("Invalid arguments: {}", e)))
}

/// Request struct for tools that take no arguments.
#[derive(Debug, Deserialize)]
pub struct NoArgs {}

fn is_safe_identifier(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// A node name, checked to be safe as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeName(String);

impl NodeName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.trim().to_string();
        if is_safe_identifier(&s) {
            Ok(NodeName(s))
        } else {
            Err(de::Error::custom(format!("invalid node name '{}'", s)))
        }
    }
}

/// A snapshot name: starts with a letter, then letters, digits, `-` or `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotName(String);

impl SnapshotName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SnapshotName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let valid = s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(SnapshotName(s))
        } else {
            Err(de::Error::custom(format!("invalid snapshot name '{}'", s)))
        }
    }
}

/// `(node, vmid)` pair addressing one guest.
#[derive(Debug, Clone, Deserialize)]
pub struct GuestRef {
    pub node: NodeName,
    pub vmid: VmId,
}

/// Accepts `4` or `"4"` for numeric tool arguments.
pub(crate) fn flexible_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Str(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(n) => Ok(n),
        Repr::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("'{}' is not a non-negative integer", s))),
    }
}

pub(crate) fn flexible_opt_u64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "flexible_u64")] u64);

    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|Wrap(n)| n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sizing {
        #[serde(deserialize_with = "flexible_u64")]
        memory: u64,
        #[serde(default, deserialize_with = "flexible_opt_u64")]
        cores: Option<u64>,
    }

    #[test]
    fn test_guest_ref_parses_string_vmid() {
        let r: GuestRef = parse_args(&json!({ "node": "pve1", "vmid": "100" })).unwrap();
        assert_eq!(r.node.as_str(), "pve1");
        assert_eq!(r.vmid.get(), 100);
    }

    #[test]
    fn test_guest_ref_rejects_bad_input() {
        for args in [
            json!({ "node": "pve1" }),
            json!({ "node": "pve1", "vmid": "abc" }),
            json!({ "node": "pve1", "vmid": 0 }),
            json!({ "node": "../etc", "vmid": 100 }),
            json!({ "node": "", "vmid": 100 }),
            json!({ "node": "..", "vmid": 100 }),
            json!(null),
        ] {
            let err = parse_args::<GuestRef>(&args).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidArgument, "{}", args);
        }
    }

    #[test]
    fn test_no_args_accepts_null_and_extra_fields() {
        assert!(parse_args::<NoArgs>(&Value::Null).is_ok());
        assert!(parse_args::<NoArgs>(&json!({ "verbose": true })).is_ok());
    }

    #[test]
    fn test_snapshot_name_rules() {
        assert!(serde_json::from_value::<SnapshotName>(json!("pre-upgrade_1")).is_ok());
        assert!(serde_json::from_value::<SnapshotName>(json!("1st")).is_err());
        assert!(serde_json::from_value::<SnapshotName>(json!("a/b")).is_err());
    }

    #[test]
    fn test_flexible_numbers() {
        let s: Sizing = serde_json::from_value(json!({ "memory": "2048", "cores": 2 })).unwrap();
        assert_eq!(s.memory, 2048);
        assert_eq!(s.cores, Some(2));
        let s: Sizing = serde_json::from_value(json!({ "memory": 512 })).unwrap();
        assert_eq!(s.cores, None);
        assert!(serde_json::from_value::<Sizing>(json!({ "memory": -1 })).is_err());
    }
}
