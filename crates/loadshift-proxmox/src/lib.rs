//! loadshift-proxmox — Proxmox VE backend for the rebalancing engine.
//!
//! Implements the engine's `Inventory` and `Migrator` seams over the
//! Proxmox REST API: node and guest listings become the scored cluster
//! model, migrations go through the `qemu/{vmid}/migrate` endpoint, and
//! task completion is read from the UPID status endpoint.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ProxmoxClient, ProxmoxConfig};
pub use error::{ProxmoxError, ProxmoxResult};
