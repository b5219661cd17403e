//! Constraint rows for every scenario.
//!
//! Per scenario, rows are emitted in a fixed order: power balance per bus,
//! flow limits per in-service branch, generator response, angle references.
//! Scenarios only read the shared network, the contingency set and their own
//! arena entry, so their blocks can be built in any order and concatenated.

use super::arena::{ScenarioArena, ScenarioKey, ScenarioVars};
use super::model::{Constraint, LinearExpr, RowKind};
use super::types::AngleReference;
use crate::contingency::ContingencySet;
use scopf_core::{Branch, BusId, IslandMap, Network};
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Rows of all scenarios in arena order.
pub fn assemble_rows(
    network: &Network,
    set: &ContingencySet,
    arena: &ScenarioArena,
    angle_reference: AngleReference,
    parallel: bool,
) -> Vec<Constraint> {
    let blocks: Vec<Vec<Constraint>> = if parallel {
        #[cfg(feature = "parallel")]
        {
            let base = arena.base();
            arena
                .scenarios()
                .par_iter()
                .map(|vars| scenario_rows(network, set, base, vars, angle_reference))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            tracing::debug!("parallel assembly requested without the `parallel` feature");
            sequential_blocks(network, set, arena, angle_reference)
        }
    } else {
        sequential_blocks(network, set, arena, angle_reference)
    };
    blocks.into_iter().flatten().collect()
}

fn sequential_blocks(
    network: &Network,
    set: &ContingencySet,
    arena: &ScenarioArena,
    angle_reference: AngleReference,
) -> Vec<Vec<Constraint>> {
    let base = arena.base();
    arena
        .iter()
        .map(|vars| scenario_rows(network, set, base, vars, angle_reference))
        .collect()
}

/// Rows of one scenario.
pub fn scenario_rows(
    network: &Network,
    set: &ContingencySet,
    base: &ScenarioVars,
    vars: &ScenarioVars,
    angle_reference: AngleReference,
) -> Vec<Constraint> {
    let key = vars.key;
    let mut rows = Vec::new();

    balance_rows(network, vars, &mut rows);
    flow_rows(network, vars, &mut rows);
    response_rows(network, base, vars, &mut rows);
    if angle_reference == AngleReference::PerIsland {
        let islands = scenario_islands(set, key);
        for &bus in islands.references() {
            if let Some(&theta) = vars.angles.get(&bus) {
                rows.push(Constraint::equality(
                    format!("angle_ref[{}][{}]", key, bus),
                    RowKind::AngleReference,
                    LinearExpr::term(theta, 1.0),
                    0.0,
                ));
            }
        }
    }
    rows
}

fn scenario_islands(set: &ContingencySet, key: ScenarioKey) -> &IslandMap {
    match key {
        ScenarioKey::Branch(id) => set
            .branch
            .get(&id)
            .map(|s| &s.islands)
            .unwrap_or(&set.base_islands),
        _ => &set.base_islands,
    }
}

/// `susceptance·(θ_from − θ_to)` for an in-service branch of this scenario.
fn flow_expr(vars: &ScenarioVars, branch: &Branch) -> Option<LinearExpr> {
    let from = *vars.angles.get(&branch.from_bus())?;
    let to = *vars.angles.get(&branch.to_bus())?;
    let b = branch.susceptance().value();
    let mut expr = LinearExpr::term(from, b);
    expr.add_term(to, -b);
    Some(expr)
}

fn in_service<'a>(
    network: &'a Network,
    vars: &ScenarioVars,
) -> impl Iterator<Item = &'a Branch> {
    let outaged = vars.key.outaged_branch();
    network.branches().filter(move |b| Some(b.id) != outaged)
}

// Generation − net outflow = demand
fn balance_rows(network: &Network, vars: &ScenarioVars, rows: &mut Vec<Constraint>) {
    let mut injections: BTreeMap<BusId, LinearExpr> =
        network.buses().map(|b| (b.id, LinearExpr::new())).collect();

    for (gen, &var) in &vars.generation {
        if let Some(expr) = injections.get_mut(&gen.bus) {
            expr.add_term(var, 1.0);
        }
    }

    for branch in in_service(network, vars) {
        let (Some(from), Some(to)) = (
            vars.angles.get(&branch.from_bus()),
            vars.angles.get(&branch.to_bus()),
        ) else {
            continue;
        };
        let b = branch.susceptance().value();
        if let Some(expr) = injections.get_mut(&branch.from_bus()) {
            expr.add_term(*from, -b).add_term(*to, b);
        }
        if let Some(expr) = injections.get_mut(&branch.to_bus()) {
            expr.add_term(*from, b).add_term(*to, -b);
        }
    }

    for (bus, expr) in injections {
        rows.push(Constraint::equality(
            format!("balance[{}][{}]", vars.key, bus),
            RowKind::PowerBalance,
            expr,
            network.demand(bus).value(),
        ));
    }
}

fn flow_rows(network: &Network, vars: &ScenarioVars, rows: &mut Vec<Constraint>) {
    for branch in in_service(network, vars) {
        let (lower, upper) = (branch.flow_min.value(), branch.flow_max.value());
        if lower.is_infinite() && upper.is_infinite() {
            continue;
        }
        if let Some(expr) = flow_expr(vars, branch) {
            rows.push(Constraint::ranged(
                format!("flow[{}][{}]", vars.key, branch.id),
                RowKind::FlowLimit,
                expr,
                lower,
                upper,
            ));
        }
    }
}

fn response_rows(
    network: &Network,
    base: &ScenarioVars,
    vars: &ScenarioVars,
    rows: &mut Vec<Constraint>,
) {
    let kind = match vars.key {
        ScenarioKey::Base => return,
        ScenarioKey::Branch(_) => RowKind::BranchResponse,
        ScenarioKey::Generator(_) => RowKind::GeneratorResponse,
    };
    for (gen, &var) in &vars.generation {
        let Some(&base_var) = base.generation.get(gen) else {
            continue;
        };
        let mut expr = LinearExpr::term(var, 1.0);
        expr.add_term(base_var, -1.0);
        if let Some(omega) = vars.omega {
            let alpha = network.generator(*gen).map(|g| g.alpha).unwrap_or(0.0);
            expr.add_term(omega, -alpha);
        }
        rows.push(Constraint::equality(
            format!("response[{}][{}]", vars.key, gen),
            kind,
            expr,
            0.0,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contingency::Contingency;
    use crate::scopf::model::LpModel;
    use scopf_core::{Gen, GenId, NetworkBuilder};

    fn triangle() -> Network {
        NetworkBuilder::new()
            .bus_count(3)
            .branch(Branch::new(1, 2, 1, 0.1).with_limits(-100.0, 100.0))
            .branch(Branch::new(2, 3, 1, 0.2))
            .branch(Branch::new(1, 3, 1, 0.2).with_limits(-50.0, 50.0))
            .generator(Gen::new(1, 1).with_limits(0.0, 200.0).with_participation(0.6))
            .generator(Gen::new(3, 1).with_limits(0.0, 100.0).with_participation(0.4))
            .demand(2, 80.0)
            .build()
            .unwrap()
    }

    fn build(
        network: &Network,
        contingencies: &[Contingency],
        parallel: bool,
    ) -> (LpModel, ScenarioArena) {
        let set = ContingencySet::expand(network, contingencies).unwrap();
        let mut model = LpModel::new();
        let arena = ScenarioArena::allocate(network, &set, &mut model);
        let rows = assemble_rows(network, &set, &arena, AngleReference::PerIsland, parallel);
        model.extend_rows(rows);
        (model, arena)
    }

    fn coef(model: &LpModel, row: &Constraint, var: &str) -> f64 {
        let id = model.find_variable(var).unwrap();
        row.terms
            .iter()
            .find(|(v, _)| *v == id)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    #[test]
    fn balance_signs_follow_branch_direction() {
        let network = triangle();
        let (model, _) = build(&network, &[], false);

        let row = model.find_row("balance[base][1]").unwrap();
        assert_eq!(row.lower, 0.0);
        assert_eq!(coef(&model, row, "pg[1-1]"), 1.0);
        // 1 is the from end of 1-2-1 (b=10) and 1-3-1 (b=5)
        assert!((coef(&model, row, "theta[1]") + 15.0).abs() < 1e-12);
        assert!((coef(&model, row, "theta[2]") - 10.0).abs() < 1e-12);

        let row = model.find_row("balance[base][2]").unwrap();
        assert_eq!(row.lower, 80.0);
        assert_eq!(row.upper, 80.0);
        assert!((coef(&model, row, "theta[1]") - 10.0).abs() < 1e-12);
    }

    #[test]
    fn unlimited_branch_has_no_flow_row() {
        let network = triangle();
        let (model, _) = build(&network, &[], false);
        assert_eq!(model.rows_of(RowKind::FlowLimit).count(), 2);
        assert!(model.find_row("flow[base][2-3-1]").is_none());
        let row = model.find_row("flow[base][1-3-1]").unwrap();
        assert_eq!((row.lower, row.upper), (-50.0, 50.0));
    }

    #[test]
    fn failed_branch_is_omitted_from_its_scenario() {
        let network = triangle();
        let (model, _) = build(&network, &[Contingency::branch(1, 2, 1)], false);

        assert!(model.find_row("flow[bc:1-2-1][1-2-1]").is_none());
        assert!(model.find_row("flow[bc:1-2-1][1-3-1]").is_some());
        let row = model.find_row("balance[bc:1-2-1][2]").unwrap();
        assert_eq!(coef(&model, row, "theta_bc[1-2-1][1]"), 0.0);

        let row = model.find_row("response[bc:1-2-1][3-1]").unwrap();
        assert_eq!(coef(&model, row, "pg_bc[1-2-1][3-1]"), 1.0);
        assert_eq!(coef(&model, row, "pg[3-1]"), -1.0);
        assert_eq!(model.rows_of(RowKind::BranchResponse).count(), 2);
    }

    #[test]
    fn generator_response_uses_participation() {
        let network = triangle();
        let (model, arena) = build(&network, &[Contingency::generator(1, 1)], false);

        let scenario = arena.get(ScenarioKey::Generator(GenId::new(1, 1))).unwrap();
        assert!(scenario.omega.is_some());
        let rows: Vec<_> = model.rows_of(RowKind::GeneratorResponse).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(coef(&model, rows[0], "omega[1-1]"), -0.4);
        let row = model.find_row("balance[gc:1-1][1]").unwrap();
        assert_eq!(coef(&model, row, "pg[1-1]"), 0.0);
        assert!(model.find_variable("pg_gc[1-1][1-1]").is_none());
    }

    #[test]
    fn one_reference_per_island() {
        let network = NetworkBuilder::new()
            .bus_count(3)
            .branch(Branch::new(1, 2, 1, 0.1))
            .branch(Branch::new(2, 3, 1, 0.1))
            .generator(Gen::new(1, 1).with_limits(0.0, 10.0))
            .build()
            .unwrap();
        let (model, _) = build(&network, &[Contingency::branch(2, 3, 1)], false);
        let refs: Vec<_> = model
            .rows_of(RowKind::AngleReference)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            refs,
            ["angle_ref[base][1]", "angle_ref[bc:2-3-1][1]", "angle_ref[bc:2-3-1][3]"]
        );
    }

    #[test]
    fn parallel_matches_sequential() {
        let network = triangle();
        let contingencies = [
            Contingency::branch(1, 3, 1),
            Contingency::generator(3, 1),
            Contingency::branch(1, 2, 1),
        ];
        let (sequential, _) = build(&network, &contingencies, false);
        let (parallel, _) = build(&network, &contingencies, true);
        assert_eq!(sequential, parallel);
    }
}
