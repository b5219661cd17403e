//! Independent check of a solution against the network physics.
//!
//! Everything is recomputed from the reported generation and angles, so the
//! check does not trust the solver's constraint handling.

use std::collections::BTreeMap;

use scopf_core::{BusId, Degrees, Network};
use serde::Serialize;

use super::arena::ScenarioKey;
use super::types::{ScenarioDispatch, ScopfSolution};
use crate::contingency::ContingencySet;

/// One constraint violated by more than the tolerance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub scenario: ScenarioKey,
    pub kind: ViolationKind,
    /// Bus, branch or generator concerned
    pub entity: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    PowerBalance,
    FlowLimit,
    GeneratorLimit,
    Response,
}

/// Worst-case residuals over all scenarios (MW)
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViolationReport {
    pub max_balance_residual: f64,
    pub max_flow_violation: f64,
    pub max_gen_limit_violation: f64,
    pub max_response_residual: f64,
    pub violations: Vec<Violation>,
}

impl ViolationReport {
    /// No residual exceeded the tolerance used for the check
    pub fn is_secure(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn max_violation(&self) -> f64 {
        self.max_balance_residual
            .max(self.max_flow_violation)
            .max(self.max_gen_limit_violation)
            .max(self.max_response_residual)
    }

    fn record(
        &mut self,
        scenario: ScenarioKey,
        kind: ViolationKind,
        entity: String,
        amount: f64,
        tol: f64,
    ) {
        let slot = match kind {
            ViolationKind::PowerBalance => &mut self.max_balance_residual,
            ViolationKind::FlowLimit => &mut self.max_flow_violation,
            ViolationKind::GeneratorLimit => &mut self.max_gen_limit_violation,
            ViolationKind::Response => &mut self.max_response_residual,
        };
        *slot = slot.max(amount);
        if amount > tol {
            self.violations.push(Violation {
                scenario,
                kind,
                entity,
                amount,
            });
        }
    }
}

/// Check balance, flow limits, generator limits and response rules in every
/// scenario of `solution`.
pub fn verify_solution(
    network: &Network,
    set: &ContingencySet,
    solution: &ScopfSolution,
    tol: f64,
) -> ViolationReport {
    let mut report = ViolationReport::default();
    let base = &solution.base;

    check_scenario(network, ScenarioKey::Base, base, tol, &mut report);

    for (&id, dispatch) in &solution.branch_contingencies {
        let key = ScenarioKey::Branch(id);
        check_scenario(network, key, dispatch, tol, &mut report);
        for (gen, pg) in &dispatch.generation {
            let pg0 = base.generation.get(gen).copied().unwrap_or(0.0);
            report.record(
                key,
                ViolationKind::Response,
                format!("gen {}", gen),
                (pg - pg0).abs(),
                tol,
            );
        }
    }

    for (&id, gc) in &solution.generator_contingencies {
        let key = ScenarioKey::Generator(id);
        check_scenario(network, key, &gc.dispatch, tol, &mut report);
        if gc.dispatch.generation.contains_key(&id) {
            report.record(key, ViolationKind::Response, format!("gen {}", id), f64::INFINITY, tol);
        }
        let omega = gc.omega.unwrap_or(0.0);
        for (gen, pg) in &gc.dispatch.generation {
            let pg0 = base.generation.get(gen).copied().unwrap_or(0.0);
            let alpha = network.generator(*gen).map(|g| g.alpha).unwrap_or(0.0);
            let residual = (pg - pg0 - alpha * omega).abs();
            report.record(key, ViolationKind::Response, format!("gen {}", gen), residual, tol);
        }
    }

    // Scenarios requested but absent from the solution
    for id in set.branch.keys() {
        if !solution.branch_contingencies.contains_key(id) {
            report.record(
                ScenarioKey::Branch(*id),
                ViolationKind::Response,
                format!("branch {}", id),
                f64::INFINITY,
                tol,
            );
        }
    }
    for id in set.generator.keys() {
        if !solution.generator_contingencies.contains_key(id) {
            report.record(
                ScenarioKey::Generator(*id),
                ViolationKind::Response,
                format!("gen {}", id),
                f64::INFINITY,
                tol,
            );
        }
    }

    report
}

fn check_scenario(
    network: &Network,
    key: ScenarioKey,
    dispatch: &ScenarioDispatch,
    tol: f64,
    report: &mut ViolationReport,
) {
    let angle = |bus: BusId| Degrees(dispatch.angles.get(&bus).copied().unwrap_or(0.0));
    let outaged = key.outaged_branch();

    let mut net: BTreeMap<BusId, f64> = network
        .buses()
        .map(|b| (b.id, -b.demand.value()))
        .collect();
    for (gen, pg) in &dispatch.generation {
        if let Some(value) = net.get_mut(&gen.bus) {
            *value += pg;
        }
        if let Some(unit) = network.generator(*gen) {
            let excess = (unit.pmin.value() - pg).max(pg - unit.pmax.value()).max(0.0);
            report.record(key, ViolationKind::GeneratorLimit, format!("gen {}", gen), excess, tol);
        }
    }

    for branch in network.branches().filter(|b| Some(b.id) != outaged) {
        let flow = branch.flow(angle(branch.from_bus()), angle(branch.to_bus())).value();
        if let Some(value) = net.get_mut(&branch.from_bus()) {
            *value -= flow;
        }
        if let Some(value) = net.get_mut(&branch.to_bus()) {
            *value += flow;
        }
        let excess = (branch.flow_min.value() - flow)
            .max(flow - branch.flow_max.value())
            .max(0.0);
        report.record(key, ViolationKind::FlowLimit, format!("branch {}", branch.id), excess, tol);
    }

    for (bus, residual) in net {
        report.record(
            key,
            ViolationKind::PowerBalance,
            format!("bus {}", bus),
            residual.abs(),
            tol,
        );
    }
}
