//! Points scoring — converts raw CPU/memory facts into load points.
//!
//! Each CPU unit is worth 5 points, each GiB of memory 1 point. A
//! deliberately simple linear weighting: the goal is a single scalar
//! that makes hosts and VMs comparable, not an accurate cost model.

use serde::{Deserialize, Serialize};

const CPU_POINTS: f64 = 5.0;
const MEM_GIB_POINTS: f64 = 1.0;
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// How VM demand is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    /// Instantaneous CPU usage and resident memory.
    #[default]
    Current,
    /// Configured vCPU count and maximum memory.
    Max,
}

/// Resource facts for a single VM, as reported by the inventory provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VmResources {
    /// Instantaneous CPU usage in cores (fractional).
    pub cpu_usage: f64,
    /// Configured vCPU count.
    pub max_cpus: u32,
    /// Resident memory in bytes.
    pub mem_bytes: u64,
    /// Configured maximum memory in bytes.
    pub max_mem_bytes: u64,
}

/// Demand points for a VM under the given scoring method.
pub fn vm_points(res: &VmResources, method: ScoreMethod) -> f64 {
    match method {
        ScoreMethod::Current => {
            res.cpu_usage * CPU_POINTS + (res.mem_bytes as f64 / BYTES_PER_GIB) * MEM_GIB_POINTS
        }
        ScoreMethod::Max => {
            f64::from(res.max_cpus) * CPU_POINTS
                + (res.max_mem_bytes as f64 / BYTES_PER_GIB) * MEM_GIB_POINTS
        }
    }
}

/// Capacity points for a host. Always derived from maximums, never from
/// current usage.
pub fn host_capacity_points(max_cpus: u32, max_mem_bytes: u64) -> f64 {
    f64::from(max_cpus) * CPU_POINTS + (max_mem_bytes as f64 / BYTES_PER_GIB) * MEM_GIB_POINTS
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn current_method_uses_instantaneous_usage() {
        let res = VmResources {
            cpu_usage: 0.5,
            max_cpus: 8,
            mem_bytes: 2 * GIB,
            max_mem_bytes: 16 * GIB,
        };

        // 0.5 cores * 5 + 2 GiB * 1 = 4.5
        assert_eq!(vm_points(&res, ScoreMethod::Current), 4.5);
    }

    #[test]
    fn max_method_uses_configured_maximums() {
        let res = VmResources {
            cpu_usage: 0.5,
            max_cpus: 8,
            mem_bytes: 2 * GIB,
            max_mem_bytes: 16 * GIB,
        };

        // 8 vCPUs * 5 + 16 GiB * 1 = 56
        assert_eq!(vm_points(&res, ScoreMethod::Max), 56.0);
    }

    #[test]
    fn host_capacity_ignores_usage_entirely() {
        // 16 cores * 5 + 64 GiB * 1 = 144
        assert_eq!(host_capacity_points(16, 64 * GIB), 144.0);
    }

    #[test]
    fn score_method_deserializes_lowercase() {
        assert_eq!(
            serde_json::from_str::<ScoreMethod>("\"current\"").unwrap(),
            ScoreMethod::Current
        );
        assert_eq!(
            serde_json::from_str::<ScoreMethod>("\"max\"").unwrap(),
            ScoreMethod::Max
        );
    }
}
