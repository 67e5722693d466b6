//! Collaborator seams for the engine.
//!
//! The engine never performs network I/O itself; it talks to the
//! virtualization layer through these traits. Production code plugs in
//! the Proxmox client, tests plug in in-memory fakes.

use async_trait::async_trait;

use loadshift_cluster::Cluster;

/// Task status value that means "still in progress". Anything else is
/// terminal from the engine's perspective.
pub const TASK_RUNNING: &str = "running";

/// Supplies point-in-time snapshots of the cluster inventory.
///
/// The engine re-fetches explicitly whenever it needs fresh state: once
/// before the violation pass and again before imbalance evaluation.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<Cluster>;
}

/// Issues live migrations and reports task status.
#[async_trait]
pub trait Migrator: Send + Sync {
    /// Start migrating a VM off `source_host`. Returns an opaque task id.
    async fn migrate(&self, source_host: &str, vmid: u32, target: &str) -> anyhow::Result<String>;

    /// Current status of a migration task. Only [`TASK_RUNNING`] is
    /// contractually significant.
    async fn task_status(&self, host: &str, task: &str) -> anyhow::Result<String>;
}
