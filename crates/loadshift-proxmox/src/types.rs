//! Payload types for the Proxmox REST API.
//!
//! Every response is wrapped in a `{"data": …}` envelope. Fields the
//! balancer does not read are simply not modeled.

use serde::Deserialize;

/// The `{"data": …}` wrapper around every API response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// One entry of `GET /api2/json/nodes`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatus {
    /// Node name, e.g. "pve1".
    pub node: String,
    /// Total CPU core count.
    #[serde(default)]
    pub maxcpu: u32,
    /// Total memory in bytes.
    #[serde(default)]
    pub maxmem: u64,
}

/// One entry of `GET /api2/json/nodes/{node}/qemu`.
#[derive(Debug, Clone, Deserialize)]
pub struct QemuStatus {
    pub vmid: u32,
    /// Guest name; unnamed guests are skipped during inventory.
    #[serde(default)]
    pub name: Option<String>,
    /// "running" or "stopped".
    pub status: String,
    /// Instantaneous CPU usage in cores (fractional).
    #[serde(default)]
    pub cpu: f64,
    /// Configured vCPU count.
    #[serde(default)]
    pub cpus: u32,
    /// Resident memory in bytes.
    #[serde(default)]
    pub mem: u64,
    /// Configured maximum memory in bytes.
    #[serde(default)]
    pub maxmem: u64,
}

impl QemuStatus {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

/// `GET /api2/json/nodes/{node}/tasks/{upid}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    /// "running" while in progress, "stopped" once finished.
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_listing_deserializes() {
        let body = r#"{"data":[
            {"node":"pve1","status":"online","maxcpu":16,"maxmem":68719476736,"uptime":123456},
            {"node":"pve2","status":"online","maxcpu":8,"maxmem":34359738368,"uptime":654321}
        ]}"#;

        let envelope: Envelope<Vec<NodeStatus>> = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.data[0].node, "pve1");
        assert_eq!(envelope.data[0].maxcpu, 16);
        assert_eq!(envelope.data[1].maxmem, 34359738368);
    }

    #[test]
    fn qemu_listing_deserializes() {
        let body = r#"{"data":[
            {"vmid":101,"name":"web-1","status":"running","cpu":0.42,"cpus":4,
             "mem":2147483648,"maxmem":8589934592,"disk":0,"uptime":999},
            {"vmid":102,"name":"db-1","status":"stopped","cpus":2,"maxmem":4294967296}
        ]}"#;

        let envelope: Envelope<Vec<QemuStatus>> = serde_json::from_str(body).unwrap();

        let web = &envelope.data[0];
        assert!(web.is_running());
        assert_eq!(web.cpu, 0.42);

        // Stopped guests omit usage fields; defaults kick in.
        let db = &envelope.data[1];
        assert!(!db.is_running());
        assert_eq!(db.cpu, 0.0);
        assert_eq!(db.mem, 0);
    }

    #[test]
    fn unnamed_guest_has_no_name() {
        let body = r#"{"data":{"vmid":103,"status":"stopped"}}"#;
        let envelope: Envelope<QemuStatus> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.name, None);
    }

    #[test]
    fn task_status_deserializes() {
        let body = r#"{"data":{"upid":"UPID:pve1:0001:...","status":"running"}}"#;
        let envelope: Envelope<TaskStatus> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.status.as_deref(), Some("running"));
    }
}
