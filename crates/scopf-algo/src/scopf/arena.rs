//! Per-scenario variable allocation.
//!
//! All columns are created up front, scenario by scenario, so each scenario
//! owns one contiguous column range. Row generation afterwards only reads the
//! arena, which is what lets scenarios be assembled independently.

use super::model::{LpModel, VarId};
use crate::contingency::ContingencySet;
use scopf_core::{BranchId, BusId, GenId, Network};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Which network state a scenario models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScenarioKey {
    Base,
    Branch(BranchId),
    Generator(GenId),
}

impl ScenarioKey {
    /// Branch out of service in this scenario, if any.
    pub fn outaged_branch(&self) -> Option<BranchId> {
        match self {
            ScenarioKey::Branch(id) => Some(*id),
            _ => None,
        }
    }

    /// Unit offline in this scenario, if any.
    pub fn outaged_generator(&self) -> Option<GenId> {
        match self {
            ScenarioKey::Generator(id) => Some(*id),
            _ => None,
        }
    }

    fn generation_name(&self, gen: GenId) -> String {
        match self {
            ScenarioKey::Base => format!("pg[{}]", gen),
            ScenarioKey::Branch(id) => format!("pg_bc[{}][{}]", id, gen),
            ScenarioKey::Generator(id) => format!("pg_gc[{}][{}]", id, gen),
        }
    }

    fn angle_name(&self, bus: BusId) -> String {
        match self {
            ScenarioKey::Base => format!("theta[{}]", bus),
            ScenarioKey::Branch(id) => format!("theta_bc[{}][{}]", id, bus),
            ScenarioKey::Generator(id) => format!("theta_gc[{}][{}]", id, bus),
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKey::Base => write!(f, "base"),
            ScenarioKey::Branch(id) => write!(f, "bc:{}", id),
            ScenarioKey::Generator(id) => write!(f, "gc:{}", id),
        }
    }
}

/// Columns owned by one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioVars {
    pub key: ScenarioKey,
    /// One free angle per bus
    pub angles: BTreeMap<BusId, VarId>,
    /// One bounded output per online unit
    pub generation: BTreeMap<GenId, VarId>,
    /// Lost-generation variable of a generator contingency whose survivors
    /// can respond
    pub omega: Option<VarId>,
    /// Contiguous column range covering everything above
    pub columns: Range<usize>,
}

/// Column layout of the whole model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioArena {
    scenarios: Vec<ScenarioVars>,
    index: BTreeMap<ScenarioKey, usize>,
}

impl ScenarioArena {
    /// Allocate columns for the base case, then branch scenarios in id
    /// order, then generator scenarios in id order.
    pub fn allocate(network: &Network, set: &ContingencySet, model: &mut LpModel) -> Self {
        let keys = std::iter::once(ScenarioKey::Base)
            .chain(set.branch.keys().map(|id| ScenarioKey::Branch(*id)))
            .chain(set.generator.keys().map(|id| ScenarioKey::Generator(*id)));

        let mut arena = ScenarioArena {
            scenarios: Vec::with_capacity(set.len() + 1),
            index: BTreeMap::new(),
        };
        for key in keys {
            let vars = allocate_scenario(network, set, key, model);
            arena.index.insert(key, arena.scenarios.len());
            arena.scenarios.push(vars);
        }
        arena
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenarios in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &ScenarioVars> {
        self.scenarios.iter()
    }

    pub fn scenarios(&self) -> &[ScenarioVars] {
        &self.scenarios
    }

    pub fn get(&self, key: ScenarioKey) -> Option<&ScenarioVars> {
        self.index.get(&key).map(|&i| &self.scenarios[i])
    }

    /// Base-case columns; always the first scenario.
    pub fn base(&self) -> &ScenarioVars {
        &self.scenarios[0]
    }
}

fn allocate_scenario(
    network: &Network,
    set: &ContingencySet,
    key: ScenarioKey,
    model: &mut LpModel,
) -> ScenarioVars {
    let start = model.variables.len();
    let failed = key.outaged_generator();

    let mut generation = BTreeMap::new();
    for gen in network.generators().filter(|g| Some(g.id) != failed) {
        let var = model.add_variable(key.generation_name(gen.id), gen.pmin.value(), gen.pmax.value());
        generation.insert(gen.id, var);
    }

    let mut angles = BTreeMap::new();
    for bus in network.buses() {
        let var = model.add_variable(key.angle_name(bus.id), f64::NEG_INFINITY, f64::INFINITY);
        angles.insert(bus.id, var);
    }

    let omega = failed
        .and_then(|id| set.generator.get(&id))
        .filter(|scenario| scenario.can_respond())
        .map(|scenario| {
            model.add_variable(
                format!("omega[{}]", scenario.generator),
                f64::NEG_INFINITY,
                f64::INFINITY,
            )
        });

    ScenarioVars {
        key,
        angles,
        generation,
        omega,
        columns: start..model.variables.len(),
    }
}
