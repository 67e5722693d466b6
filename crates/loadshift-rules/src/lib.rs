//! loadshift-rules — placement policy constraints.
//!
//! Three rule kinds govern where a VM may live:
//!
//! - **Pin**: fix a VM to one named host (`"vm:host"`)
//! - **Separate**: keep a group of VMs on different hosts (`"a,b,c"`)
//! - **Unite**: keep a group of VMs on the same host (`"a,b,c"`)
//!
//! Rules are declared as flat string lists in configuration and parsed
//! once into a [`RuleSet`]. Lookup precedence is Pin, then Separate,
//! then Unite: a VM named in several rule kinds resolves to the first
//! kind in that order.

pub mod error;
pub mod rules;

pub use error::{RuleError, RuleResult};
pub use rules::{violates_separate, violates_unite, Rule, RuleSet};
