//! loadshift-cluster — the in-memory cluster model.
//!
//! Holds the point-in-time inventory snapshot (hosts and their VMs) as a
//! mutable projected model: both planning passes apply their decisions to
//! it immediately, so later decisions see the effects of earlier ones.
//! Also home of the points scoring that makes hosts and VMs comparable.

pub mod error;
pub mod model;
pub mod points;

pub use error::{ClusterError, ClusterResult};
pub use model::{Cluster, Host, Operation, Vm};
pub use points::{host_capacity_points, vm_points, ScoreMethod, VmResources};
