//! loadshift-engine — the rebalancing run itself.
//!
//! Wires the planning passes to the outside world through two trait
//! seams: an [`Inventory`] that supplies cluster snapshots and a
//! [`Migrator`] that performs live migrations. One [`Engine::run`]
//! executes the full sequence:
//!
//! ```text
//! fetch inventory
//!   └── violation resolution pass → execute each move, always waited on
//! re-fetch inventory
//!   └── imbalance gate → load balancer pass → execute each move,
//!       waited on only when async migrations are disabled
//! ```
//!
//! Dry-run reports every decision without touching the migrator.

pub mod engine;
pub mod error;
pub mod traits;

pub use engine::{Engine, EngineConfig, RunReport};
pub use error::{EngineError, EngineResult};
pub use traits::{Inventory, Migrator};
