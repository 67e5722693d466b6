//! Cluster-wide disparity metric.
//!
//! Disparity is the sum of each host's absolute deviation from the
//! average used points. It gates whether the load balancer pass runs at
//! all: below `allowed_disparity * host_count` the cluster is considered
//! acceptably balanced.

use tracing::warn;

use loadshift_cluster::Cluster;

/// Percentage deviation above which a host is called out in the logs.
const DEVIATION_WARN_PCT: f64 = 30.0;

/// Summed absolute deviation of every host's used points from the
/// cluster average. Hosts more than 30% off the average are logged;
/// that reporting has no effect on the result.
pub fn cluster_disparity(cluster: &Cluster) -> f64 {
    let average = cluster.average_points();
    let mut total = 0.0;
    for host in cluster.hosts.values() {
        total += (average - host.used_points).abs();
        if average > 0.0 {
            let deviation = (100.0 - (host.used_points / average) * 100.0).abs();
            if deviation > DEVIATION_WARN_PCT {
                warn!(
                    host = %host.name,
                    used_points = host.used_points,
                    deviation_pct = deviation as i64,
                    "host load deviates from cluster average"
                );
            }
        }
    }
    total
}

/// Whether the disparity exceeds the configured per-host tolerance.
pub fn needs_balancing(cluster: &Cluster, allowed_disparity: f64) -> bool {
    cluster_disparity(cluster) > allowed_disparity * cluster.host_count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadshift_cluster::{Host, Vm};

    fn host_with_load(name: &str, capacity: f64, used: f64) -> Host {
        let mut host = Host::new(name, capacity);
        host.add_vm(Vm {
            name: format!("{name}-load"),
            vmid: 100,
            running: true,
            points: used,
        });
        host
    }

    fn two_host_cluster(used1: f64, used2: f64) -> Cluster {
        let mut cluster = Cluster::new();
        cluster.add_host(host_with_load("h1", 100.0, used1));
        cluster.add_host(host_with_load("h2", 100.0, used2));
        cluster
    }

    #[test]
    fn disparity_sums_absolute_deviations() {
        // average = 50, |50-90| + |50-10| = 80
        let cluster = two_host_cluster(90.0, 10.0);
        assert_eq!(cluster_disparity(&cluster), 80.0);
    }

    #[test]
    fn lopsided_cluster_triggers_balancing() {
        let cluster = two_host_cluster(90.0, 10.0);
        // 80 > 20 * 2
        assert!(needs_balancing(&cluster, 20.0));
    }

    #[test]
    fn tolerant_threshold_suppresses_balancing() {
        let cluster = two_host_cluster(90.0, 10.0);
        // 80 > 50 * 2 is false
        assert!(!needs_balancing(&cluster, 50.0));
    }

    #[test]
    fn balanced_cluster_has_zero_disparity() {
        let cluster = two_host_cluster(40.0, 40.0);
        assert_eq!(cluster_disparity(&cluster), 0.0);
        assert!(!needs_balancing(&cluster, 20.0));
    }

    #[test]
    fn empty_cluster_is_balanced() {
        let cluster = Cluster::new();
        assert_eq!(cluster_disparity(&cluster), 0.0);
        assert!(!needs_balancing(&cluster, 20.0));
    }
}
