//! Daemon configuration.
//!
//! Loaded from a TOML file; every tunable has a default so a minimal
//! config only needs the Proxmox connection details. Rule lists are
//! handed to `loadshift-rules` for parsing before a run starts.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use loadshift_cluster::ScoreMethod;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Scoring method for VM demand points.
    #[serde(default)]
    pub method: ScoreMethod,

    /// Per-host disparity tolerance gating the balance pass.
    #[serde(default = "default_allowed_disparity")]
    pub allowed_disparity: f64,

    /// Fire balancing migrations without waiting for completion.
    #[serde(rename = "async", default = "default_async")]
    pub async_migrations: bool,

    /// Upper bound on waiting for a single migration task, in seconds.
    #[serde(default = "default_migration_timeout_secs")]
    pub migration_timeout_secs: u64,

    /// Cluster-wide advisory lock file.
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,

    /// How long to keep trying for the lock, in seconds.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    pub proxmox: ProxmoxSection,

    #[serde(default)]
    pub rules: RulesSection,
}

#[derive(Debug, Deserialize)]
pub struct ProxmoxSection {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub token_name: String,
    pub token_secret: String,
    #[serde(default)]
    pub verify_tls: bool,
}

/// Placement policy rule declarations, as flat string lists.
#[derive(Debug, Default, Deserialize)]
pub struct RulesSection {
    /// `"vm:host"` pairs.
    #[serde(default)]
    pub pin: Vec<String>,
    /// Comma-joined groups to keep apart.
    #[serde(default)]
    pub separate: Vec<String>,
    /// Comma-joined groups to keep together.
    #[serde(default)]
    pub unite: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("cannot parse {}", path.display()))
    }
}

fn default_allowed_disparity() -> f64 {
    20.0
}

fn default_async() -> bool {
    true
}

fn default_migration_timeout_secs() -> u64 {
    3600
}

fn default_lock_file() -> PathBuf {
    PathBuf::from("/run/loadshift.lock")
}

fn default_lock_timeout_secs() -> u64 {
    120
}

fn default_port() -> u16 {
    8006
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [proxmox]
            host = "pve.example.net"
            user = "balancer@pam"
            token_name = "loadshift"
            token_secret = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.method, ScoreMethod::Current);
        assert_eq!(config.allowed_disparity, 20.0);
        assert!(config.async_migrations);
        assert_eq!(config.migration_timeout_secs, 3600);
        assert_eq!(config.lock_timeout_secs, 120);
        assert_eq!(config.proxmox.port, 8006);
        assert!(!config.proxmox.verify_tls);
        assert!(config.rules.pin.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            method = "max"
            allowed_disparity = 35.5
            async = false
            migration_timeout_secs = 900
            lock_file = "/tmp/loadshift.lock"

            [proxmox]
            host = "10.0.0.2"
            port = 443
            user = "root@pam"
            token_name = "bal"
            token_secret = "s3cr3t"
            verify_tls = true

            [rules]
            pin = ["db-1:pve2"]
            separate = ["web-1,web-2"]
            unite = ["app-1,cache-1"]
            "#,
        )
        .unwrap();

        assert_eq!(config.method, ScoreMethod::Max);
        assert_eq!(config.allowed_disparity, 35.5);
        assert!(!config.async_migrations);
        assert_eq!(config.lock_file, PathBuf::from("/tmp/loadshift.lock"));
        assert_eq!(config.proxmox.port, 443);
        assert_eq!(config.rules.pin, vec!["db-1:pve2".to_string()]);
        assert_eq!(config.rules.unite, vec!["app-1,cache-1".to_string()]);
    }

    #[test]
    fn missing_connection_details_fail() {
        let result = toml::from_str::<Config>("method = \"current\"\n");
        assert!(result.is_err());
    }
}
