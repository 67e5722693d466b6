//! Proxmox client error types.

use thiserror::Error;

/// Errors from talking to the Proxmox API.
#[derive(Debug, Error)]
pub enum ProxmoxError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api returned {status} for {path}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },
}

pub type ProxmoxResult<T> = Result<T, ProxmoxError>;
