//! Cluster model error types.

use thiserror::Error;

/// Errors that can occur while mutating the projected cluster model.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("unknown host: {0}")]
    UnknownHost(String),

    #[error("vm '{vm}' not found on host '{host}'")]
    UnknownVm { host: String, vm: String },
}

pub type ClusterResult<T> = Result<T, ClusterError>;
