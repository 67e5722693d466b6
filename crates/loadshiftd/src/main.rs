//! loadshiftd — policy-aware VM rebalancing for Proxmox clusters.
//!
//! One invocation is one run:
//!
//! 1. Load config and parse placement rules
//! 2. Take the cluster-wide run lock
//! 3. Fix rule violations (migrations waited on)
//! 4. Re-fetch inventory, measure disparity
//! 5. Spread load if the cluster is lopsided enough
//!
//! # Usage
//!
//! ```text
//! loadshiftd --config /etc/loadshift/config.toml [--dry-run]
//! ```

mod config;
mod lock;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use loadshift_engine::{Engine, EngineConfig};
use loadshift_proxmox::{ProxmoxClient, ProxmoxConfig};
use loadshift_rules::RuleSet;

use crate::config::Config;
use crate::lock::RunLock;

#[derive(Parser)]
#[command(name = "loadshiftd", about = "Policy-aware VM rebalancer for Proxmox clusters")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "/etc/loadshift/config.toml")]
    config: PathBuf,

    /// Report every planned move without issuing migrations.
    #[arg(short, long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,loadshiftd=debug,loadshift=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let rules = RuleSet::parse(&config.rules.pin, &config.rules.separate, &config.rules.unite)?;

    // One run at a time, cluster-wide. Held until this process exits,
    // released on unwind as well.
    let _lock = RunLock::acquire(
        &config.lock_file,
        Duration::from_secs(config.lock_timeout_secs),
    )
    .await?;

    let client = ProxmoxClient::new(&ProxmoxConfig {
        host: config.proxmox.host.clone(),
        port: config.proxmox.port,
        user: config.proxmox.user.clone(),
        token_name: config.proxmox.token_name.clone(),
        token_secret: config.proxmox.token_secret.clone(),
        verify_tls: config.proxmox.verify_tls,
        method: config.method,
    })?;

    let engine = Engine::new(
        client.clone(),
        client,
        rules,
        EngineConfig {
            allowed_disparity: config.allowed_disparity,
            async_migrations: config.async_migrations,
            dry_run: cli.dry_run,
            migration_timeout: Duration::from_secs(config.migration_timeout_secs),
            poll_interval: Duration::from_secs(1),
        },
    );

    let report = engine.run().await?;
    info!(
        rule_moves = report.rule_ops.len(),
        balance_moves = report.balance_ops.len(),
        disparity = report.disparity,
        balance_ran = report.balance_ran,
        "run complete"
    );
    Ok(())
}
