//! Typed views of the Proxmox endpoints this server consumes.
//!
//! Every field the API may omit is an `Option` with `#[serde(default)]`, so a
//! sparse payload decodes cleanly. A payload of the wrong shape fails to decode
//! and surfaces as an unknown upstream error instead of a panic.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A guest id. Proxmox reports it as a number for QEMU and as a string for
/// LXC listings; callers may send either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VmId(u32);

impl VmId {
    pub fn new(id: u32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VmId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let id: u32 = trimmed
            .parse()
            .map_err(|_| format!("'{}' is not a valid numeric id", s))?;
        VmId::new(id).ok_or_else(|| format!("'{}' is not a positive id", s))
    }
}

impl<'de> Deserialize<'de> for VmId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(i64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Num(n) => u32::try_from(n)
                .ok()
                .and_then(VmId::new)
                .ok_or_else(|| de::Error::custom(format!("{} is not a positive id", n))),
            Repr::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// Accepts `4096` or `"4096"`; Proxmox is inconsistent across versions.
fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Repr>::deserialize(deserializer)?.map(|r| match r {
        Repr::Str(s) => s,
        Repr::Int(i) => i.to_string(),
        Repr::Float(f) => f.to_string(),
    }))
}

/// Proxmox booleans arrive as `0`/`1`, occasionally as JSON booleans.
fn opt_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Repr>::deserialize(deserializer)?.map(|r| match r {
        Repr::Bool(b) => b,
        Repr::Int(i) => i != 0,
    }))
}

/// Entry of `GET /nodes`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeListItem {
    pub node: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub maxcpu: Option<u32>,
    #[serde(default)]
    pub mem: Option<u64>,
    #[serde(default)]
    pub maxmem: Option<u64>,
    #[serde(default)]
    pub disk: Option<u64>,
    #[serde(default)]
    pub maxdisk: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageCounter {
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuInfo {
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Payload of `GET /nodes/{node}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatusData {
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub cpuinfo: Option<CpuInfo>,
    #[serde(default)]
    pub memory: Option<UsageCounter>,
    #[serde(default)]
    pub rootfs: Option<UsageCounter>,
    #[serde(default)]
    pub pveversion: Option<String>,
}

/// Entry of `GET /nodes/{node}/qemu` or `GET /nodes/{node}/lxc`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuestListItem {
    pub vmid: VmId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cpus: Option<f64>,
    #[serde(default)]
    pub mem: Option<u64>,
    #[serde(default)]
    pub maxmem: Option<u64>,
}

/// Payload of `GET /nodes/{node}/qemu/{vmid}/config`.
#[derive(Debug, Clone, Deserialize)]
pub struct VmConfigData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub cores: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub sockets: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub memory: Option<String>,
    #[serde(default)]
    pub ostype: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bootdisk: Option<String>,
    #[serde(default)]
    pub boot: Option<String>,
}

/// Payload of `GET /nodes/{node}/lxc/{vmid}/config`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerConfigData {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub cores: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub memory: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub swap: Option<String>,
    #[serde(default)]
    pub ostype: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub rootfs: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Entry of `GET /nodes/{node}/lxc/{vmid}/snapshot`.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub snaptime: Option<i64>,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Entry of `GET /nodes/{node}/storage`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageItem {
    pub storage: String,
    #[serde(rename = "type", default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "opt_flag")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "opt_flag")]
    pub shared: Option<bool>,
    #[serde(default)]
    pub used: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Entry of `GET /cluster/status`; one `cluster` record plus one per node.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterStatusItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_flag")]
    pub quorate: Option<bool>,
    #[serde(default, deserialize_with = "opt_flag")]
    pub online: Option<bool>,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Response of `POST /nodes/{node}/qemu/{vmid}/agent/exec`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentExecStarted {
    pub pid: i64,
}

/// Response of `GET /nodes/{node}/qemu/{vmid}/agent/exec-status`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentExecStatus {
    #[serde(default, deserialize_with = "opt_flag")]
    pub exited: Option<bool>,
    #[serde(default)]
    pub exitcode: Option<i64>,
    #[serde(rename = "out-data", default)]
    pub out_data: Option<String>,
    #[serde(rename = "err-data", default)]
    pub err_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vmid_accepts_number_and_string() {
        let a: VmId = serde_json::from_value(json!(100)).unwrap();
        let b: VmId = serde_json::from_value(json!("100")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "100");
    }

    #[test]
    fn test_vmid_rejects_non_positive_and_garbage() {
        assert!(serde_json::from_value::<VmId>(json!(0)).is_err());
        assert!(serde_json::from_value::<VmId>(json!(-5)).is_err());
        assert!(serde_json::from_value::<VmId>(json!("abc")).is_err());
        assert!(serde_json::from_value::<VmId>(json!("")).is_err());
        assert!(serde_json::from_value::<VmId>(json!(true)).is_err());
    }

    #[test]
    fn test_lxc_listing_with_string_vmid() {
        let item: GuestListItem = serde_json::from_value(json!({
            "vmid": "200", "name": "web", "status": "running", "cpus": 2, "maxmem": 2147483648u64
        }))
        .unwrap();
        assert_eq!(item.vmid.get(), 200);
        assert_eq!(item.cpus, Some(2.0));
    }

    #[test]
    fn test_config_memory_as_string_or_number() {
        let a: VmConfigData = serde_json::from_value(json!({ "memory": 2048, "cores": 2 })).unwrap();
        let b: VmConfigData = serde_json::from_value(json!({ "memory": "2048" })).unwrap();
        assert_eq!(a.memory.as_deref(), Some("2048"));
        assert_eq!(b.memory.as_deref(), Some("2048"));
        assert_eq!(a.cores.as_deref(), Some("2"));
    }

    #[test]
    fn test_agent_status_passthrough_fields() {
        let s: AgentExecStatus = serde_json::from_value(json!({
            "exited": 1, "exitcode": 0, "out-data": "Linux\n"
        }))
        .unwrap();
        assert_eq!(s.out_data.as_deref(), Some("Linux\n"));
        assert!(s.err_data.is_none());
        assert_eq!(s.exited, Some(true));

        let s: AgentExecStatus = serde_json::from_value(json!({ "exited": false })).unwrap();
        assert_eq!(s.exited, Some(false));
    }
}
