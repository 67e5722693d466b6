//! Load balancer pass.
//!
//! Greedily moves running, unpinned VMs off heavier hosts. For each VM
//! a candidate host is accepted only if the move leaves the candidate
//! strictly lighter than the VM's current host, picking the lightest
//! projected result among accepted candidates.
//!
//! Bookkeeping is deliberately asymmetric: planned moves shift
//! `used_points` immediately so later decisions see the projected load,
//! but VM membership stays where the pass found it, so constraint
//! checks run against the pre-pass placement throughout.

use tracing::info;

use loadshift_cluster::{Cluster, ClusterResult, Operation};
use loadshift_rules::{violates_separate, violates_unite, RuleSet};

/// Plan balancing migrations for every running, unpinned VM.
///
/// A single sweep in sorted (host, VM) order; at most one move is
/// planned per VM and no fixed point is sought.
pub fn spread_load(cluster: &mut Cluster, rules: &RuleSet) -> ClusterResult<Vec<Operation>> {
    let mut operations = Vec::new();

    let pairs: Vec<(String, String)> = cluster
        .hosts
        .values()
        .flat_map(|host| host.vms.keys().map(|vm| (host.name.clone(), vm.clone())))
        .collect();

    for (host_name, vm_name) in pairs {
        let Some(host) = cluster.host(&host_name) else { continue };
        let Some(vm) = host.vms.get(&vm_name) else { continue };
        if !vm.running || rules.is_pinned(&vm_name) {
            continue;
        }
        let points = vm.points;

        if let Some(target) = best_host_for(cluster, &host_name, &vm_name, points, rules) {
            info!(vm = %vm_name, from = %host_name, to = %target, "planned balancing migration");
            operations.push(Operation::new(&vm_name, &host_name, &target));
            cluster.shift_points(points, &host_name, &target)?;
        }
    }

    Ok(operations)
}

/// Best target host for one VM, or `None` if no move improves on the
/// current placement.
fn best_host_for(
    cluster: &Cluster,
    current: &str,
    vm_name: &str,
    points: f64,
    rules: &RuleSet,
) -> Option<String> {
    let current_used = cluster.host(current)?.used_points;
    let mut best: Option<(String, f64)> = None;

    for host in cluster.hosts.values() {
        if host.name == current {
            continue;
        }

        // Constraint checks run against the hosted names as of the start
        // of the pass; membership is not updated while planning.
        let hosted = host.vm_names();
        if let Some(group) = rules.separate_group_of(vm_name) {
            if violates_separate(group, vm_name, &hosted) {
                continue;
            }
        }
        if let Some(group) = rules.unite_group_of(vm_name) {
            if violates_unite(group, vm_name, &hosted) {
                continue;
            }
        }

        let projected = host.used_points + points;
        if projected < current_used && best.as_ref().is_none_or(|(_, b)| projected < *b) {
            best = Some((host.name.clone(), projected));
        }
    }

    best.map(|(name, _)| name)
}
