//! Cluster-wide advisory run lock.
//!
//! At most one balancing run may be active against a cluster at a
//! time. The lock is a pid file created with `create_new`; acquisition
//! retries on a short interval up to a bounded timeout and failing
//! that, the run never starts. Dropping the guard removes the file,
//! including on unwind.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Guard for the cluster-wide run lock.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock, retrying until `timeout` elapses.
    pub async fn acquire(path: &Path, timeout: Duration) -> anyhow::Result<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let _ = write!(file, "{}", std::process::id());
                    debug!(path = %path.display(), "acquired run lock");
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let now = Instant::now();
                    if now >= deadline {
                        bail!(
                            "timed out acquiring run lock {} (another run active?)",
                            path.display()
                        );
                    }
                    sleep(RETRY_INTERVAL.min(deadline - now)).await;
                }
                Err(e) => {
                    return Err(e)
                        .context(format!("cannot create lock file {}", path.display()));
                }
            }
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove run lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquires_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.lock");

        let lock = RunLock::acquire(&path, Duration::from_millis(50)).await.unwrap();
        assert!(path.exists());

        drop(lock);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn second_acquisition_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.lock");

        let _held = RunLock::acquire(&path, Duration::from_millis(50)).await.unwrap();
        let err = RunLock::acquire(&path, Duration::from_millis(50)).await.unwrap_err();

        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn lock_becomes_available_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.lock");

        {
            let _held = RunLock::acquire(&path, Duration::from_millis(50)).await.unwrap();
        }
        // Released on drop; a fresh acquisition succeeds at once.
        let _again = RunLock::acquire(&path, Duration::from_millis(50)).await.unwrap();
    }
}
