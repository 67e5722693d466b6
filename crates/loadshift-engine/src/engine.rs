//! The rebalancing engine.
//!
//! Drives the two planning passes against fresh inventory snapshots and
//! turns their operations into migrator calls, honoring dry-run and the
//! per-pass wait policy.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use loadshift_cluster::{Cluster, Operation};
use loadshift_planner::{cluster_disparity, resolve_violations, spread_load};
use loadshift_rules::RuleSet;

use crate::error::{EngineError, EngineResult};
use crate::traits::{Inventory, Migrator, TASK_RUNNING};

/// Tunables for a rebalancing run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-host disparity tolerance; the balance pass runs only when the
    /// cluster disparity exceeds `allowed_disparity * host_count`.
    pub allowed_disparity: f64,
    /// When true, balancing migrations are fired without waiting for
    /// completion. Violation fixes are always waited on.
    pub async_migrations: bool,
    /// Report every decision but never call the migrator.
    pub dry_run: bool,
    /// Upper bound on waiting for a single migration task.
    pub migration_timeout: Duration,
    /// Delay between task status polls.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allowed_disparity: 20.0,
            async_migrations: true,
            dry_run: false,
            migration_timeout: Duration::from_secs(3600),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// What a run decided and did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Corrective migrations planned by the violation pass.
    pub rule_ops: Vec<Operation>,
    /// Migrations planned by the load balancer pass.
    pub balance_ops: Vec<Operation>,
    /// Cluster disparity measured after violations were fixed.
    pub disparity: f64,
    /// Whether the disparity exceeded the threshold and balancing ran.
    pub balance_ran: bool,
}

/// Orchestrates one full rebalancing run over pluggable collaborators.
pub struct Engine<I, M> {
    inventory: I,
    migrator: M,
    rules: RuleSet,
    config: EngineConfig,
}

impl<I: Inventory, M: Migrator> Engine<I, M> {
    pub fn new(inventory: I, migrator: M, rules: RuleSet, config: EngineConfig) -> Self {
        Self {
            inventory,
            migrator,
            rules,
            config,
        }
    }

    /// Run the full sequence: fix rule violations (waited on), re-fetch,
    /// then balance load if the cluster is lopsided enough.
    ///
    /// A failed migration or inventory fetch aborts the run; planned but
    /// unexecuted operations are reported in the error path only through
    /// the logs emitted as they were decided.
    pub async fn run(&self) -> EngineResult<RunReport> {
        let mut cluster = self.fetch().await?;

        info!(dry_run = self.config.dry_run, "running rule checks");
        let rule_ops = resolve_violations(&mut cluster, &self.rules)?;
        for op in &rule_ops {
            self.execute(&cluster, op, true).await?;
        }

        // Fresh snapshot: balancing decisions must not build on the
        // pre-violation state.
        let mut cluster = self.fetch().await?;

        let disparity = cluster_disparity(&cluster);
        let threshold = self.config.allowed_disparity * cluster.host_count() as f64;
        let balance_ran = disparity > threshold;
        let mut balance_ops = Vec::new();

        if balance_ran {
            info!(dry_run = self.config.dry_run, disparity, threshold, "running balance");
            log_points(&cluster);

            balance_ops = spread_load(&mut cluster, &self.rules)?;
            for op in &balance_ops {
                self.execute(&cluster, op, !self.config.async_migrations).await?;
            }

            log_points(&cluster);
        } else {
            info!(disparity, threshold, "acceptable overall imbalance, not running balance");
        }

        Ok(RunReport {
            rule_ops,
            balance_ops,
            disparity,
            balance_ran,
        })
    }

    async fn fetch(&self) -> EngineResult<Cluster> {
        self.inventory.fetch().await.map_err(EngineError::Inventory)
    }

    /// Carry out one planned migration.
    ///
    /// The VM's external identifier is resolved from the projected model
    /// here, at execution time, not when the operation was planned.
    async fn execute(&self, cluster: &Cluster, op: &Operation, wait: bool) -> EngineResult<()> {
        let (_, vm) = cluster
            .find_vm(&op.vm_name)
            .ok_or_else(|| EngineError::MissingVm {
                vm: op.vm_name.clone(),
            })?;

        if self.config.dry_run {
            info!(vm = %op.vm_name, from = %op.source, to = %op.target, "would move");
            return Ok(());
        }

        info!(vm = %op.vm_name, vmid = vm.vmid, from = %op.source, to = %op.target, "moving");
        let task = self
            .migrator
            .migrate(&op.source, vm.vmid, &op.target)
            .await
            .map_err(|e| EngineError::Migration {
                vm: op.vm_name.clone(),
                source_host: op.source.clone(),
                target: op.target.clone(),
                source: e,
            })?;

        if wait {
            self.wait_for_task(&op.source, &task).await?;
        }
        Ok(())
    }

    /// Poll a migration task until it is no longer running, bounded by
    /// the configured timeout.
    async fn wait_for_task(&self, host: &str, task: &str) -> EngineResult<()> {
        let poll = async {
            loop {
                let status = self
                    .migrator
                    .task_status(host, task)
                    .await
                    .map_err(|e| EngineError::TaskStatus {
                        host: host.to_string(),
                        task: task.to_string(),
                        source: e,
                    })?;
                if status != TASK_RUNNING {
                    debug!(%host, %task, %status, "migration task finished");
                    return Ok(());
                }
                sleep(self.config.poll_interval).await;
            }
        };

        timeout(self.config.migration_timeout, poll)
            .await
            .map_err(|_| EngineError::MigrationTimeout {
                host: host.to_string(),
                task: task.to_string(),
                timeout: self.config.migration_timeout,
            })?
    }
}

/// Per-host points summary, logged around the balance pass.
fn log_points(cluster: &Cluster) {
    for host in cluster.hosts.values() {
        info!(
            host = %host.name,
            capacity_points = host.capacity_points,
            used_points = host.used_points,
            vms = host.vms.len(),
            "host points"
        );
    }
}
