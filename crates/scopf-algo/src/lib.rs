//! # scopf-algo: Security-Constrained DC Optimal Power Flow
//!
//! Builds one linear program whose optimum is the cheapest generation
//! dispatch that stays feasible in the base case and under every listed
//! single-element outage, then solves it through `good_lp`.
//!
//! ## Pipeline
//!
//! | Stage | Item |
//! |-------|------|
//! | Contingency expansion | [`ContingencySet::expand`] |
//! | Column allocation | [`ScenarioArena::allocate`] |
//! | Row assembly | [`assemble_rows`] (parallel with the `parallel` feature) |
//! | Objective | [`base_cost`] |
//! | Solve | [`solve_lp`] with [`LpSolverKind`] |
//! | Check | [`verify_solution`] |
//!
//! [`ScopfSolver`] runs the whole pipeline.
//!
//! ## Generator response
//!
//! - **Branch outage:** every unit keeps its base-case output.
//! - **Unit outage:** every surviving unit moves by `alpha · Ω`, where the
//!   scenario's lost-generation variable Ω is fixed by power balance. When
//!   the survivors' factors sum to 1, Ω equals the failed unit's base output.
//!
//! ## Example
//!
//! ```no_run
//! use scopf_algo::{Contingency, ScopfSolver};
//! use scopf_core::{Branch, Gen, NetworkBuilder};
//!
//! let network = NetworkBuilder::new()
//!     .bus_count(2)
//!     .branch(Branch::new(1, 2, 1, 0.1).with_limits(-100.0, 100.0))
//!     .generator(Gen::new(1, 1).with_limits(0.0, 200.0).with_cost(10.0).with_participation(0.5))
//!     .generator(Gen::new(2, 1).with_limits(0.0, 80.0).with_cost(25.0).with_participation(0.5))
//!     .demand(2, 50.0)
//!     .build()?;
//!
//! let solution = ScopfSolver::new().solve(&network, &[Contingency::generator(2, 1)])?;
//! println!("Cost: ${:.2}/hr", solution.objective_value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod contingency;
pub mod scopf;

pub use contingency::{
    BranchContingencyScenario, Contingency, ContingencySet, GeneratorContingencyScenario,
    PARTICIPATION_EPS,
};
pub use scopf::{
    assemble_rows, base_cost, solve_lp, verify_solution, AngleReference, Constraint,
    GeneratorContingencyDispatch, LinearExpr, LpModel, LpOutcome, LpSolverKind, ModelStats,
    RowKind, ScenarioArena, ScenarioDispatch, ScenarioKey, ScenarioVars, ScopfConfig, ScopfError,
    ScopfProblem, ScopfResult, ScopfSolution, ScopfSolver, VarId, VariableDef, Violation,
    ViolationKind, ViolationReport,
};
