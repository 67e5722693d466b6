//! loadshift-planner — turns cluster state into migration plans.
//!
//! Two passes over the projected cluster model, run in order:
//!
//! 1. [`resolve_violations`] fixes placement-policy violations
//!    (pin / separate / unite), moving VM entries in the model as each
//!    operation is planned.
//! 2. [`spread_load`] greedily moves VMs off heavier hosts, gated by the
//!    cluster-wide disparity check in [`imbalance`].
//!
//! Both passes are single-sweep greedy heuristics: each decision sees
//! the effects of earlier decisions, but no global optimum is sought
//! and convergence to the lowest possible disparity is not guaranteed.

pub mod balance_pass;
pub mod imbalance;
pub mod rule_pass;

pub use balance_pass::spread_load;
pub use imbalance::{cluster_disparity, needs_balancing};
pub use rule_pass::resolve_violations;
