//! Domain types for the projected cluster model.
//!
//! `Cluster` is the mutable state threaded by reference through the
//! planning passes. Hosts and VMs are kept in `BTreeMap`s so every
//! enumeration over the model is in sorted name order, which makes the
//! planners' output deterministic and reproducible.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ClusterError, ClusterResult};

/// A virtual machine in the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Vm {
    /// Unique name within the cluster; the rule-matching key.
    pub name: String,
    /// External identifier, used only for the migration call.
    pub vmid: u32,
    /// Whether the VM is currently running.
    pub running: bool,
    /// Demand points under the configured scoring method.
    pub points: f64,
}

/// A compute host and the VMs it currently carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    pub name: String,
    /// Capacity points, derived from max CPU and max memory.
    pub capacity_points: f64,
    /// Sum of demand points of all hosted VMs.
    pub used_points: f64,
    /// Hosted VMs, keyed by name.
    pub vms: BTreeMap<String, Vm>,
}

impl Host {
    pub fn new(name: impl Into<String>, capacity_points: f64) -> Self {
        Self {
            name: name.into(),
            capacity_points,
            used_points: 0.0,
            vms: BTreeMap::new(),
        }
    }

    /// Add a VM, keeping `used_points` in sync.
    pub fn add_vm(&mut self, vm: Vm) {
        self.used_points += vm.points;
        self.vms.insert(vm.name.clone(), vm);
    }

    pub fn has_vm(&self, name: &str) -> bool {
        self.vms.contains_key(name)
    }

    /// Names of all hosted VMs, for constraint checks.
    pub fn vm_names(&self) -> BTreeSet<String> {
        self.vms.keys().cloned().collect()
    }
}

/// A planned migration of one VM between two hosts.
///
/// Append-only: once created an operation is never mutated. The source
/// and target are always distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub vm_name: String,
    pub source: String,
    pub target: String,
}

impl Operation {
    pub fn new(vm_name: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        let op = Self {
            vm_name: vm_name.into(),
            source: source.into(),
            target: target.into(),
        };
        debug_assert_ne!(op.source, op.target, "operation must move between distinct hosts");
        op
    }
}

/// The projected cluster state: every host and its VMs, mutated in place
/// as migrations are planned so that later decisions see earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cluster {
    pub hosts: BTreeMap<String, Host>,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host(&mut self, host: Host) {
        self.hosts.insert(host.name.clone(), host);
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn total_used_points(&self) -> f64 {
        self.hosts.values().map(|h| h.used_points).sum()
    }

    /// Average used points per host; zero for an empty cluster.
    pub fn average_points(&self) -> f64 {
        if self.hosts.is_empty() {
            return 0.0;
        }
        self.total_used_points() / self.hosts.len() as f64
    }

    /// Locate a VM anywhere in the projected model.
    pub fn find_vm(&self, vm_name: &str) -> Option<(&str, &Vm)> {
        self.hosts
            .values()
            .find_map(|h| h.vms.get(vm_name).map(|vm| (h.name.as_str(), vm)))
    }

    /// Name of the host currently carrying the given VM.
    pub fn host_of(&self, vm_name: &str) -> Option<&str> {
        self.find_vm(vm_name).map(|(host, _)| host)
    }

    /// Move a VM's entry between host maps, adjusting both hosts'
    /// `used_points`. Total points across the cluster are conserved.
    pub fn move_vm(&mut self, vm_name: &str, source: &str, target: &str) -> ClusterResult<()> {
        if !self.hosts.contains_key(target) {
            return Err(ClusterError::UnknownHost(target.to_string()));
        }
        let src = self
            .hosts
            .get_mut(source)
            .ok_or_else(|| ClusterError::UnknownHost(source.to_string()))?;
        let vm = src.vms.remove(vm_name).ok_or_else(|| ClusterError::UnknownVm {
            host: source.to_string(),
            vm: vm_name.to_string(),
        })?;
        src.used_points -= vm.points;

        // Presence checked above.
        if let Some(dst) = self.hosts.get_mut(target) {
            dst.add_vm(vm);
        }
        Ok(())
    }

    /// Shift only the points bookkeeping between two hosts, leaving VM
    /// membership untouched. Used by the load balancer pass, which keeps
    /// constraint checks against the pre-pass placement while projecting
    /// load onto later decisions.
    pub fn shift_points(&mut self, points: f64, source: &str, target: &str) -> ClusterResult<()> {
        if !self.hosts.contains_key(target) {
            return Err(ClusterError::UnknownHost(target.to_string()));
        }
        let src = self
            .hosts
            .get_mut(source)
            .ok_or_else(|| ClusterError::UnknownHost(source.to_string()))?;
        src.used_points -= points;
        if let Some(dst) = self.hosts.get_mut(target) {
            dst.used_points += points;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vm(name: &str, points: f64) -> Vm {
        Vm {
            name: name.to_string(),
            vmid: 100,
            running: true,
            points,
        }
    }

    fn make_cluster() -> Cluster {
        let mut cluster = Cluster::new();
        let mut h1 = Host::new("h1", 100.0);
        h1.add_vm(make_vm("vm-a", 10.0));
        h1.add_vm(make_vm("vm-b", 20.0));
        let mut h2 = Host::new("h2", 100.0);
        h2.add_vm(make_vm("vm-c", 5.0));
        cluster.add_host(h1);
        cluster.add_host(h2);
        cluster
    }

    #[test]
    fn used_points_tracks_hosted_vms() {
        let cluster = make_cluster();
        assert_eq!(cluster.host("h1").unwrap().used_points, 30.0);
        assert_eq!(cluster.host("h2").unwrap().used_points, 5.0);
        assert_eq!(cluster.total_used_points(), 35.0);
    }

    #[test]
    fn average_points_of_empty_cluster_is_zero() {
        assert_eq!(Cluster::new().average_points(), 0.0);
    }

    #[test]
    fn move_vm_conserves_total_points() {
        let mut cluster = make_cluster();
        let before = cluster.total_used_points();

        cluster.move_vm("vm-b", "h1", "h2").unwrap();

        assert_eq!(cluster.total_used_points(), before);
        assert!(!cluster.host("h1").unwrap().has_vm("vm-b"));
        assert!(cluster.host("h2").unwrap().has_vm("vm-b"));
        assert_eq!(cluster.host("h1").unwrap().used_points, 10.0);
        assert_eq!(cluster.host("h2").unwrap().used_points, 25.0);
    }

    #[test]
    fn move_vm_to_unknown_host_fails_without_mutation() {
        let mut cluster = make_cluster();
        let before = cluster.clone();

        let err = cluster.move_vm("vm-b", "h1", "h9").unwrap_err();

        assert!(matches!(err, ClusterError::UnknownHost(_)));
        assert_eq!(cluster, before);
    }

    #[test]
    fn move_unknown_vm_fails() {
        let mut cluster = make_cluster();
        let err = cluster.move_vm("vm-z", "h1", "h2").unwrap_err();
        assert!(matches!(err, ClusterError::UnknownVm { .. }));
    }

    #[test]
    fn shift_points_leaves_membership_alone() {
        let mut cluster = make_cluster();

        cluster.shift_points(20.0, "h1", "h2").unwrap();

        assert_eq!(cluster.host("h1").unwrap().used_points, 10.0);
        assert_eq!(cluster.host("h2").unwrap().used_points, 25.0);
        // vm-b still listed on h1.
        assert!(cluster.host("h1").unwrap().has_vm("vm-b"));
        assert!(!cluster.host("h2").unwrap().has_vm("vm-b"));
    }

    #[test]
    fn find_vm_reports_current_host() {
        let mut cluster = make_cluster();
        assert_eq!(cluster.host_of("vm-c"), Some("h2"));

        cluster.move_vm("vm-c", "h2", "h1").unwrap();
        assert_eq!(cluster.host_of("vm-c"), Some("h1"));
        assert_eq!(cluster.host_of("vm-z"), None);
    }

    #[test]
    fn vm_belongs_to_exactly_one_host_after_move() {
        let mut cluster = make_cluster();
        cluster.move_vm("vm-a", "h1", "h2").unwrap();

        let carriers: Vec<_> = cluster
            .hosts
            .values()
            .filter(|h| h.has_vm("vm-a"))
            .collect();
        assert_eq!(carriers.len(), 1);
    }
}
