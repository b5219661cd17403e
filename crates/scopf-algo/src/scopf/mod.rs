//! Security-constrained DC optimal power flow.
//!
//! One linear program covers the base case and every N-1 scenario:
//!
//! ```text
//! minimize    Σ cost[g]·pg[g]
//! subject to  per scenario s, per bus i:
//!               Σ pg(i,s) − Σ_b ±b_b·(θ_from − θ_to) = demand[i]
//!             per in-service branch:  flow_min ≤ b·(θ_from − θ_to) ≤ flow_max
//!             branch outage:          pg_bc[g,s] = pg[g]
//!             unit outage:            pg_gc[g,s] = pg[g] + alpha[g]·Ω[s]
//!             pg_min ≤ pg ≤ pg_max wherever the unit is online
//! ```
//!
//! Building and solving are split: [`ScopfSolver::build`] returns the
//! assembled [`LpModel`] for inspection, [`ScopfProblem::solve`] hands it to
//! the configured `good_lp` backend.

mod arena;
mod assemble;
mod error;
mod model;
mod objective;
mod solve;
mod types;
mod verify;

pub use arena::{ScenarioArena, ScenarioKey, ScenarioVars};
pub use assemble::{assemble_rows, scenario_rows};
pub use error::{ScopfError, ScopfResult};
pub use model::{Constraint, LinearExpr, LpModel, ModelStats, RowKind, VarId, VariableDef};
pub use objective::base_cost;
pub use solve::{solve_lp, LpOutcome};
pub use types::{
    AngleReference, GeneratorContingencyDispatch, LpSolverKind, ScenarioDispatch, ScopfConfig,
    ScopfSolution,
};
pub use verify::{verify_solution, Violation, ViolationKind, ViolationReport};

use crate::contingency::{Contingency, ContingencySet};
use scopf_core::{Degrees, Network};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Security-constrained OPF front-end
#[derive(Debug, Clone, Default)]
pub struct ScopfSolver {
    config: ScopfConfig,
}

impl ScopfSolver {
    /// Solver with default settings (Clarabel, parallel, per-island angles)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ScopfConfig) -> Self {
        Self { config }
    }

    /// Set LP backend
    pub fn with_lp_solver(mut self, lp_solver: LpSolverKind) -> Self {
        self.config.lp_solver = lp_solver;
        self
    }

    /// Assemble scenario rows in parallel
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn with_angle_reference(mut self, angle_reference: AngleReference) -> Self {
        self.config.angle_reference = angle_reference;
        self
    }

    pub fn config(&self) -> &ScopfConfig {
        &self.config
    }

    /// Validate contingencies and assemble the full model without solving.
    pub fn build<'a>(
        &self,
        network: &'a Network,
        contingencies: &[Contingency],
    ) -> ScopfResult<ScopfProblem<'a>> {
        let start = Instant::now();
        let set = ContingencySet::expand(network, contingencies)?;

        let mut model = LpModel::new();
        let arena = ScenarioArena::allocate(network, &set, &mut model);
        let rows = assemble_rows(
            network,
            &set,
            &arena,
            self.config.angle_reference,
            self.config.parallel,
        );
        model.extend_rows(rows);
        model.set_objective(base_cost(network, arena.base()));

        let stats = model.stats(arena.len());
        info!(
            variables = stats.num_variables,
            constraints = stats.num_constraints,
            nonzeros = stats.num_nonzeros,
            scenarios = stats.num_scenarios,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "SCOPF model assembled"
        );

        Ok(ScopfProblem {
            network,
            set,
            arena,
            model,
            stats,
            config: self.config.clone(),
        })
    }

    /// Build and solve in one step.
    pub fn solve(
        &self,
        network: &Network,
        contingencies: &[Contingency],
    ) -> ScopfResult<ScopfSolution> {
        self.build(network, contingencies)?.solve()
    }
}

/// Assembled model, ready for inspection or solving
#[derive(Debug, Clone)]
pub struct ScopfProblem<'a> {
    network: &'a Network,
    set: ContingencySet,
    arena: ScenarioArena,
    model: LpModel,
    stats: ModelStats,
    config: ScopfConfig,
}

impl<'a> ScopfProblem<'a> {
    pub fn model(&self) -> &LpModel {
        &self.model
    }

    pub fn stats(&self) -> &ModelStats {
        &self.stats
    }

    pub fn arena(&self) -> &ScenarioArena {
        &self.arena
    }

    pub fn contingencies(&self) -> &ContingencySet {
        &self.set
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn solve(&self) -> ScopfResult<ScopfSolution> {
        let outcome = solve_lp(&self.model, self.config.lp_solver)?;

        let mut branch_contingencies = BTreeMap::new();
        let mut generator_contingencies = BTreeMap::new();
        let mut base = ScenarioDispatch::default();
        for vars in self.arena.iter() {
            let dispatch = self.dispatch(vars, &outcome);
            match vars.key {
                ScenarioKey::Base => base = dispatch,
                ScenarioKey::Branch(id) => {
                    branch_contingencies.insert(id, dispatch);
                }
                ScenarioKey::Generator(id) => {
                    generator_contingencies.insert(
                        id,
                        GeneratorContingencyDispatch {
                            dispatch,
                            omega: vars.omega.map(|omega| outcome.value(omega)),
                        },
                    );
                }
            }
        }

        Ok(ScopfSolution {
            objective_value: outcome.objective_value,
            base,
            branch_contingencies,
            generator_contingencies,
            stats: self.stats.clone(),
            solve_time_ms: outcome.solve_time_ms,
            lp_solver: self.config.lp_solver,
        })
    }

    /// Recheck a solution of this problem against the network.
    pub fn verify(&self, solution: &ScopfSolution, tol: f64) -> ViolationReport {
        verify_solution(self.network, &self.set, solution, tol)
    }

    fn dispatch(&self, vars: &ScenarioVars, outcome: &LpOutcome) -> ScenarioDispatch {
        let generation = vars
            .generation
            .iter()
            .map(|(&id, &var)| (id, outcome.value(var)))
            .collect();
        let angles: BTreeMap<_, _> = vars
            .angles
            .iter()
            .map(|(&id, &var)| (id, outcome.value(var)))
            .collect();

        let outaged = vars.key.outaged_branch();
        let flows = self
            .network
            .branches()
            .filter(|b| Some(b.id) != outaged)
            .map(|b| {
                let from = Degrees(angles.get(&b.from_bus()).copied().unwrap_or(0.0));
                let to = Degrees(angles.get(&b.to_bus()).copied().unwrap_or(0.0));
                (b.id, b.flow(from, to).value())
            })
            .collect();

        ScenarioDispatch {
            generation,
            angles,
            flows,
        }
    }
}
