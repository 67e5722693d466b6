//! Violation resolution pass.
//!
//! Scans every running (host, VM) pair in sorted order, finds VMs whose
//! current placement contradicts their rule, and plans a corrective
//! migration per violation. Stopped VMs are never migrated. Each
//! planned move is applied to the projected model at once, so later
//! decisions in the same pass observe it. Unsatisfiable violations are
//! logged and left unresolved; the pass keeps going.

use tracing::{debug, info, warn};

use loadshift_cluster::{Cluster, ClusterResult, Operation};
use loadshift_rules::{violates_separate, violates_unite, Rule, RuleSet};

/// Find and plan corrections for all rule violations in the cluster.
///
/// Returns the planned operations in decision order. The cluster is
/// mutated as each operation is planned.
pub fn resolve_violations(cluster: &mut Cluster, rules: &RuleSet) -> ClusterResult<Vec<Operation>> {
    let mut operations = Vec::new();
    if rules.is_empty() {
        return Ok(operations);
    }

    let host_names: Vec<String> = cluster.hosts.keys().cloned().collect();
    for host_name in &host_names {
        let vm_names: Vec<String> = match cluster.host(host_name) {
            Some(host) => host.vms.keys().cloned().collect(),
            None => continue,
        };
        for vm_name in &vm_names {
            let Some(host) = cluster.host(host_name) else { continue };
            let Some(vm) = host.vms.get(vm_name) else {
                // Moved off this host by an earlier decision.
                continue;
            };
            if !vm.running {
                // Migrations are issued online; a stopped VM cannot be
                // corrected and is left where it is.
                debug!(vm = %vm_name, host = %host_name, "skipping stopped vm");
                continue;
            }
            let Some(rule) = rules.rule_for(vm_name) else { continue };

            let hosted = host.vm_names();
            let target = match &rule {
                Rule::Unite(group) => {
                    if violates_unite(group, vm_name, &hosted) {
                        warn!(vm = %vm_name, host = %host_name, "rule violation: unite group is fragmented");
                        unite_target(cluster, group, vm_name)
                    } else {
                        None
                    }
                }
                Rule::Separate(group) => {
                    if violates_separate(group, vm_name, &hosted) {
                        warn!(vm = %vm_name, host = %host_name, "rule violation: separated vms share a host");
                        separate_target(cluster, group, vm_name)
                    } else {
                        None
                    }
                }
                Rule::Pin { host: pinned, .. } => {
                    if pinned != host_name {
                        warn!(vm = %vm_name, host = %host_name, pinned = %pinned, "rule violation: vm is off its pinned host");
                        if cluster.hosts.contains_key(pinned) {
                            Some(pinned.clone())
                        } else {
                            warn!(vm = %vm_name, pinned = %pinned, "cannot enforce pin: host not in inventory");
                            None
                        }
                    } else {
                        None
                    }
                }
            };

            if let Some(target) = target {
                if target != *host_name {
                    info!(vm = %vm_name, from = %host_name, to = %target, "planned corrective migration");
                    operations.push(Operation::new(vm_name, host_name, &target));
                    cluster.move_vm(vm_name, host_name, &target)?;
                }
            }
        }
    }

    Ok(operations)
}

/// Remedial target for a unite violation: a host already carrying at
/// least one other group member, ranked by [`best_candidate`].
fn unite_target(cluster: &Cluster, group: &[String], vm_name: &str) -> Option<String> {
    let candidates: Vec<&str> = cluster
        .hosts
        .values()
        .filter(|host| group.iter().any(|m| m != vm_name && host.has_vm(m)))
        .map(|host| host.name.as_str())
        .collect();
    best_candidate(cluster, &candidates).map(str::to_string)
}

/// Remedial target for a separate violation: a host carrying none of the
/// other group members. With no such host the violation stays
/// unresolved for this pass.
fn separate_target(cluster: &Cluster, group: &[String], vm_name: &str) -> Option<String> {
    let candidates: Vec<&str> = cluster
        .hosts
        .values()
        .filter(|host| !group.iter().any(|m| m != vm_name && host.has_vm(m)))
        .map(|host| host.name.as_str())
        .collect();
    if candidates.is_empty() {
        warn!(vm = %vm_name, "no suitable candidate host found, perhaps you need more hosts");
        return None;
    }
    best_candidate(cluster, &candidates).map(str::to_string)
}

/// Rank candidate hosts and return the one with the highest capacity
/// points. Returns `None` for an empty candidate set; callers treat
/// that as "no valid target".
fn best_candidate<'a>(cluster: &Cluster, candidates: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for &candidate in candidates {
        let Some(host) = cluster.host(candidate) else { continue };
        match best {
            None => best = Some((candidate, host.capacity_points)),
            Some((_, points)) if host.capacity_points > points => {
                best = Some((candidate, host.capacity_points));
            }
            _ => {}
        }
    }
    best.map(|(name, _)| name)
}
