//! Proxmox VE REST client.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tracing::debug;

use loadshift_cluster::{
    host_capacity_points, vm_points, Cluster, Host, ScoreMethod, Vm, VmResources,
};
use loadshift_engine::{Inventory, Migrator};

use crate::error::{ProxmoxError, ProxmoxResult};
use crate::types::{Envelope, NodeStatus, QemuStatus, TaskStatus};

/// Connection settings for a Proxmox VE cluster.
#[derive(Debug, Clone)]
pub struct ProxmoxConfig {
    /// API hostname or address.
    pub host: String,
    /// API port, 8006 unless fronted by a proxy.
    pub port: u16,
    /// API user, e.g. "balancer@pam".
    pub user: String,
    /// API token name and secret.
    pub token_name: String,
    pub token_secret: String,
    /// Verify the API TLS certificate. Off by default: self-signed
    /// certificates are the norm on Proxmox clusters.
    pub verify_tls: bool,
    /// Scoring method applied when building the inventory.
    pub method: ScoreMethod,
}

/// Client for the Proxmox REST API, doubling as the engine's inventory
/// provider and migration executor.
#[derive(Debug, Clone)]
pub struct ProxmoxClient {
    http: reqwest::Client,
    base: String,
    auth: String,
    method: ScoreMethod,
}

impl ProxmoxClient {
    pub fn new(config: &ProxmoxConfig) -> ProxmoxResult<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;
        Ok(Self {
            http,
            base: format!("https://{}:{}/api2/json", config.host, config.port),
            auth: format!(
                "PVEAPIToken={}!{}={}",
                config.user, config.token_name, config.token_secret
            ),
            method: config.method,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ProxmoxResult<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .header(AUTHORIZATION, &self.auth)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProxmoxError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }
        Ok(response.json::<Envelope<T>>().await?.data)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> ProxmoxResult<T> {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .header(AUTHORIZATION, &self.auth)
            .form(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProxmoxError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }
        Ok(response.json::<Envelope<T>>().await?.data)
    }

    /// All cluster nodes.
    pub async fn nodes(&self) -> ProxmoxResult<Vec<NodeStatus>> {
        self.get("/nodes").await
    }

    /// All QEMU guests on one node.
    pub async fn qemu(&self, node: &str) -> ProxmoxResult<Vec<QemuStatus>> {
        self.get(&format!("/nodes/{node}/qemu")).await
    }

    /// Build the scored cluster model from a fresh API snapshot.
    ///
    /// Running guests carry demand points under the configured method;
    /// stopped guests are kept in the model with zero demand but are
    /// never migrated by the planners. Host capacity always counts.
    pub async fn inventory(&self) -> ProxmoxResult<Cluster> {
        let mut cluster = Cluster::new();
        for node in self.nodes().await? {
            let mut host = Host::new(
                &node.node,
                host_capacity_points(node.maxcpu, node.maxmem),
            );
            for guest in self.qemu(&node.node).await? {
                let Some(name) = guest.name.clone() else {
                    debug!(vmid = guest.vmid, node = %node.node, "skipping unnamed guest");
                    continue;
                };
                let running = guest.is_running();
                let points = if running {
                    vm_points(
                        &VmResources {
                            cpu_usage: guest.cpu,
                            max_cpus: guest.cpus,
                            mem_bytes: guest.mem,
                            max_mem_bytes: guest.maxmem,
                        },
                        self.method,
                    )
                } else {
                    0.0
                };
                host.add_vm(Vm {
                    name,
                    vmid: guest.vmid,
                    running,
                    points,
                });
            }
            debug!(
                node = %node.node,
                capacity_points = host.capacity_points,
                used_points = host.used_points,
                vms = host.vms.len(),
                "inventoried node"
            );
            cluster.add_host(host);
        }
        Ok(cluster)
    }
}

#[async_trait]
impl Inventory for ProxmoxClient {
    async fn fetch(&self) -> anyhow::Result<Cluster> {
        Ok(self.inventory().await?)
    }
}

#[async_trait]
impl Migrator for ProxmoxClient {
    async fn migrate(&self, source_host: &str, vmid: u32, target: &str) -> anyhow::Result<String> {
        let upid: String = self
            .post(
                &format!("/nodes/{source_host}/qemu/{vmid}/migrate"),
                &[("target", target), ("online", "1")],
            )
            .await?;
        Ok(upid)
    }

    async fn task_status(&self, host: &str, task: &str) -> anyhow::Result<String> {
        let status: TaskStatus = self.get(&format!("/nodes/{host}/tasks/{task}/status")).await?;
        Ok(status.status.unwrap_or_else(|| "unknown".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> ProxmoxConfig {
        ProxmoxConfig {
            host: "pve.example.net".to_string(),
            port: 8006,
            user: "balancer@pam".to_string(),
            token_name: "loadshift".to_string(),
            token_secret: "secret".to_string(),
            verify_tls: false,
            method: ScoreMethod::Current,
        }
    }

    #[test]
    fn builds_api_base_and_token_header() {
        let client = ProxmoxClient::new(&make_config()).unwrap();

        assert_eq!(client.base, "https://pve.example.net:8006/api2/json");
        assert_eq!(client.auth, "PVEAPIToken=balancer@pam!loadshift=secret");
    }
}
