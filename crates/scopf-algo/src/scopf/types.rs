use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use scopf_core::{BranchId, BusId, GenId};
use serde::{Deserialize, Serialize};

use super::model::ModelStats;

/// LP backend used through `good_lp`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LpSolverKind {
    #[default]
    Clarabel,
    Highs,
}

impl LpSolverKind {
    /// Labels of the backends compiled into this build
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_LP_SOLVERS
    }

    pub fn is_available(&self) -> bool {
        AVAILABLE_LP_SOLVERS.contains(&self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LpSolverKind::Clarabel => "clarabel",
            LpSolverKind::Highs => "highs",
        }
    }
}

const AVAILABLE_LP_SOLVERS: &[&str] = &[
    #[cfg(feature = "solver-clarabel")]
    "clarabel",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_solver_error(label: &str) -> anyhow::Error {
    anyhow!(
        "unknown lp solver '{}'; supported values: {}",
        label,
        LpSolverKind::available().join(", ")
    )
}

impl FromStr for LpSolverKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "clarabel" => Ok(LpSolverKind::Clarabel),
            "highs" => Ok(LpSolverKind::Highs),
            other => Err(unknown_solver_error(other)),
        }
    }
}

impl fmt::Display for LpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the free angle shift of each island is removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleReference {
    /// Pin the lowest-numbered bus of every island to 0 in every scenario
    #[default]
    PerIsland,
    /// Leave angles unpinned; the solver picks any consistent shift
    Free,
}

impl fmt::Display for AngleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngleReference::PerIsland => write!(f, "per_island"),
            AngleReference::Free => write!(f, "free"),
        }
    }
}

impl FromStr for AngleReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "per_island" | "island" => Ok(AngleReference::PerIsland),
            "free" | "none" => Ok(AngleReference::Free),
            _ => Err(format!("Unknown angle reference: {}", s)),
        }
    }
}

/// Model build and solve settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopfConfig {
    pub lp_solver: LpSolverKind,
    /// Assemble scenario rows on the rayon pool
    pub parallel: bool,
    pub angle_reference: AngleReference,
}

impl Default for ScopfConfig {
    fn default() -> Self {
        Self {
            lp_solver: LpSolverKind::default(),
            parallel: true,
            angle_reference: AngleReference::default(),
        }
    }
}

/// Dispatch and network state of one scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioDispatch {
    /// Output per online unit (MW)
    pub generation: BTreeMap<GenId, f64>,
    /// Angle per bus (degrees)
    pub angles: BTreeMap<BusId, f64>,
    /// Flow per in-service branch, from → to (MW)
    pub flows: BTreeMap<BranchId, f64>,
}

impl ScenarioDispatch {
    pub fn total_generation(&self) -> f64 {
        self.generation.values().sum()
    }
}

/// Generator-contingency state plus the lost-generation variable
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratorContingencyDispatch {
    #[serde(flatten)]
    pub dispatch: ScenarioDispatch,
    /// `None` when no survivor can pick up the loss
    pub omega: Option<f64>,
}

/// Optimal secure dispatch
#[derive(Debug, Clone, Serialize)]
pub struct ScopfSolution {
    /// Total base-case cost ($/h)
    pub objective_value: f64,
    pub base: ScenarioDispatch,
    pub branch_contingencies: BTreeMap<BranchId, ScenarioDispatch>,
    pub generator_contingencies: BTreeMap<GenId, GeneratorContingencyDispatch>,
    pub stats: ModelStats,
    pub solve_time_ms: u128,
    pub lp_solver: LpSolverKind,
}

impl ScopfSolution {
    /// Base-case output of one unit
    pub fn generation(&self, id: GenId) -> Option<f64> {
        self.base.generation.get(&id).copied()
    }

    /// Base-case flow on one branch
    pub fn flow(&self, id: BranchId) -> Option<f64> {
        self.base.flows.get(&id).copied()
    }
}
