//! Engine error types.

use std::time::Duration;

use thiserror::Error;

use loadshift_cluster::ClusterError;

/// Errors that abort a rebalancing run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("inventory fetch failed: {0}")]
    Inventory(#[source] anyhow::Error),

    #[error("migration of '{vm}' from '{source_host}' to '{target}' failed: {source}")]
    Migration {
        vm: String,
        source_host: String,
        target: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("task status query for '{task}' on '{host}' failed: {source}")]
    TaskStatus {
        host: String,
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("migration task '{task}' on '{host}' still running after {timeout:?}")]
    MigrationTimeout {
        host: String,
        task: String,
        timeout: Duration,
    },

    #[error("vm '{vm}' missing from the projected model at execution time")]
    MissingVm { vm: String },

    #[error("cluster state error: {0}")]
    Cluster(#[from] ClusterError),
}

pub type EngineResult<T> = Result<T, EngineError>;
