//! Rule set parsing, per-VM rule lookup, and violation predicates.

use std::collections::BTreeSet;

use crate::error::{RuleError, RuleResult};

/// The single rule applicable to a VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// The VM must live on the named host.
    Pin { vm: String, host: String },
    /// The VM must not share a host with any other group member.
    Separate(Vec<String>),
    /// The VM must share a host with every other group member.
    Unite(Vec<String>),
}

/// Parsed placement policy rules.
///
/// Built once from the configuration's flat string lists; lookups are
/// evaluated per call against the parsed lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pins: Vec<(String, String)>,
    separate: Vec<Vec<String>>,
    unite: Vec<Vec<String>>,
}

impl RuleSet {
    /// Parse rule declarations.
    ///
    /// Pin entries are `"vm:host"` pairs; separate and unite entries are
    /// comma-joined name groups of at least two members. Whitespace
    /// around names is trimmed.
    pub fn parse(pin: &[String], separate: &[String], unite: &[String]) -> RuleResult<Self> {
        let mut pins = Vec::with_capacity(pin.len());
        for entry in pin {
            let (vm, host) = entry
                .split_once(':')
                .ok_or_else(|| RuleError::InvalidPin(entry.clone()))?;
            let (vm, host) = (vm.trim(), host.trim());
            if vm.is_empty() || host.is_empty() {
                return Err(RuleError::InvalidPin(entry.clone()));
            }
            pins.push((vm.to_string(), host.to_string()));
        }

        Ok(Self {
            pins,
            separate: parse_groups(separate, "separate")?,
            unite: parse_groups(unite, "unite")?,
        })
    }

    /// The single rule applicable to the VM, if any.
    ///
    /// Precedence is Pin, then Separate, then Unite: the first kind that
    /// structurally matches wins, and any later matches are ignored.
    pub fn rule_for(&self, vm_name: &str) -> Option<Rule> {
        if let Some((vm, host)) = self.pins.iter().find(|(vm, _)| vm == vm_name) {
            return Some(Rule::Pin {
                vm: vm.clone(),
                host: host.clone(),
            });
        }
        if let Some(group) = self.separate_group_of(vm_name) {
            return Some(Rule::Separate(group.to_vec()));
        }
        if let Some(group) = self.unite_group_of(vm_name) {
            return Some(Rule::Unite(group.to_vec()));
        }
        None
    }

    /// True only for VMs with a pin rule.
    pub fn is_pinned(&self, vm_name: &str) -> bool {
        self.pins.iter().any(|(vm, _)| vm == vm_name)
    }

    /// First separate group containing the VM.
    pub fn separate_group_of(&self, vm_name: &str) -> Option<&[String]> {
        self.separate
            .iter()
            .find(|group| group.iter().any(|m| m == vm_name))
            .map(Vec::as_slice)
    }

    /// First unite group containing the VM.
    pub fn unite_group_of(&self, vm_name: &str) -> Option<&[String]> {
        self.unite
            .iter()
            .find(|group| group.iter().any(|m| m == vm_name))
            .map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty() && self.separate.is_empty() && self.unite.is_empty()
    }
}

fn parse_groups(entries: &[String], kind: &'static str) -> RuleResult<Vec<Vec<String>>> {
    let mut groups = Vec::with_capacity(entries.len());
    for entry in entries {
        let group: Vec<String> = entry
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if group.len() < 2 {
            return Err(RuleError::GroupTooSmall {
                kind,
                rule: entry.clone(),
            });
        }
        groups.push(group);
    }
    Ok(groups)
}

/// True if any other member of the separate group is present among the
/// names hosted alongside the VM.
pub fn violates_separate(group: &[String], vm_name: &str, hosted: &BTreeSet<String>) -> bool {
    group
        .iter()
        .any(|member| member != vm_name && hosted.contains(member))
}

/// True if any other member of the unite group is absent from the names
/// hosted alongside the VM.
pub fn violates_unite(group: &[String], vm_name: &str, hosted: &BTreeSet<String>) -> bool {
    group
        .iter()
        .any(|member| member != vm_name && !hosted.contains(member))
}
