//! N-1 contingency scenarios for the security-constrained model.
//!
//! A raw contingency list (branch and generator references, possibly with
//! repeats) is expanded into two disjoint, ordered scenario sets:
//!
//! - **Branch scenarios**, keyed by the failed [`BranchId`]. The network loses
//!   that branch; dispatch is held at its base-case value.
//! - **Generator scenarios**, keyed by the failed [`GenId`]. Topology is
//!   unchanged; every surviving unit picks up a share of the lost output
//!   according to its participation factor.
//!
//! Expansion validates every reference against the network before anything
//! else happens, and records topological facts the assembler needs (islands
//! per scenario) together with non-fatal findings such as an outage that
//! islands part of the grid.

mod expand;

pub use expand::PARTICIPATION_EPS;

use scopf_core::{BranchId, Diagnostics, GenId, IslandMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single-element outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Contingency {
    Branch(BranchId),
    Generator(GenId),
}

impl Contingency {
    pub fn branch(from: usize, to: usize, circuit: usize) -> Self {
        Contingency::Branch(BranchId::new(from, to, circuit))
    }

    pub fn generator(bus: usize, unit: usize) -> Self {
        Contingency::Generator(GenId::new(bus, unit))
    }
}

impl fmt::Display for Contingency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contingency::Branch(id) => write!(f, "branch {}", id),
            Contingency::Generator(id) => write!(f, "gen {}", id),
        }
    }
}

/// Scenario with one branch out of service.
#[derive(Debug, Clone)]
pub struct BranchContingencyScenario {
    pub branch: BranchId,
    /// Islands of the network without `branch`
    pub islands: IslandMap,
}

/// Scenario with one generating unit offline.
#[derive(Debug, Clone)]
pub struct GeneratorContingencyScenario {
    pub generator: GenId,
    /// Every unit except the failed one, in id order. May be empty.
    pub survivors: Vec<GenId>,
    /// Sum of the survivors' participation factors
    pub participation: f64,
    /// Survivors whose participation factor is nonzero
    pub responders: usize,
}

impl GeneratorContingencyScenario {
    /// Whether the lost output can be redistributed at all.
    pub fn has_survivors(&self) -> bool {
        !self.survivors.is_empty()
    }

    /// At least one survivor follows the lost-generation variable.
    ///
    /// Factors that cancel out still count: the variable then shifts output
    /// between survivors without changing their total.
    pub fn can_respond(&self) -> bool {
        self.responders > 0
    }
}

/// Validated, deduplicated contingency scenarios.
#[derive(Debug, Clone)]
pub struct ContingencySet {
    /// Islands of the intact network (base case and generator scenarios)
    pub base_islands: IslandMap,
    pub branch: BTreeMap<BranchId, BranchContingencyScenario>,
    pub generator: BTreeMap<GenId, GeneratorContingencyScenario>,
    /// Warnings gathered during expansion
    pub diagnostics: Diagnostics,
}

impl ContingencySet {
    /// Number of contingency scenarios (excluding the base case)
    pub fn len(&self) -> usize {
        self.branch.len() + self.generator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
