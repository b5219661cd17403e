//! Translation of an [`LpModel`] into `good_lp` and back.

use std::time::Instant;

#[cfg(feature = "solver-clarabel")]
use good_lp::solvers::clarabel::clarabel as clarabel_solver;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as highs_solver;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use tracing::{debug, info};

use super::error::ScopfError;
use super::model::{LpModel, VarId};
use super::types::LpSolverKind;

/// Primal values of a solved model, indexed like [`LpModel::variables`].
#[derive(Debug, Clone)]
pub struct LpOutcome {
    pub values: Vec<f64>,
    pub objective_value: f64,
    pub solve_time_ms: u128,
}

impl LpOutcome {
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }
}

/// Hand `model` to the selected backend and read back every column.
pub fn solve_lp(model: &LpModel, lp_solver: LpSolverKind) -> Result<LpOutcome, ScopfError> {
    let start = Instant::now();

    let mut vars = ProblemVariables::new();
    let columns: Vec<Variable> = model
        .variables
        .iter()
        .map(|def| {
            let mut definition = variable().name(def.name.clone());
            if def.lower.is_finite() {
                definition = definition.min(def.lower);
            }
            if def.upper.is_finite() {
                definition = definition.max(def.upper);
            }
            vars.add(definition)
        })
        .collect();

    let objective = linear(&model.objective, &columns);
    let problem = vars.minimise(objective);

    let values = match lp_solver {
        #[cfg(feature = "solver-clarabel")]
        LpSolverKind::Clarabel => solve_with(problem.using(clarabel_solver), model, &columns)?,
        #[cfg(feature = "solver-highs")]
        LpSolverKind::Highs => solve_with(problem.using(highs_solver), model, &columns)?,
        #[allow(unreachable_patterns)]
        other => return Err(not_compiled_in(other)),
    };

    let objective_value = model.objective_value(&values);
    let solve_time_ms = start.elapsed().as_millis();
    info!(
        solver = lp_solver.as_str(),
        objective = objective_value,
        elapsed_ms = solve_time_ms as u64,
        "LP solved"
    );
    Ok(LpOutcome {
        values,
        objective_value,
        solve_time_ms,
    })
}

fn not_compiled_in(lp_solver: LpSolverKind) -> ScopfError {
    ScopfError::Config(format!(
        "lp solver '{}' is not compiled in; available: [{}]",
        lp_solver,
        LpSolverKind::available().join(", ")
    ))
}

fn linear(terms: &[(VarId, f64)], columns: &[Variable]) -> Expression {
    let mut expr = Expression::from(0.0);
    for (var, coef) in terms {
        if let Some(&column) = columns.get(var.index()) {
            expr += *coef * column;
        }
    }
    expr
}

fn solve_with<M>(mut problem: M, model: &LpModel, columns: &[Variable]) -> Result<Vec<f64>, ScopfError>
where
    M: SolverModel<Error = ResolutionError>,
{
    for row in &model.rows {
        let expr = linear(&row.terms, columns);
        if row.is_equality() {
            problem = problem.with(constraint!(expr == row.lower));
            continue;
        }
        if row.lower.is_finite() {
            problem = problem.with(constraint!(expr.clone() >= row.lower));
        }
        if row.upper.is_finite() {
            problem = problem.with(constraint!(expr <= row.upper));
        }
    }
    debug!(
        columns = columns.len(),
        rows = model.rows.len(),
        "model handed to solver"
    );

    let solution = problem.solve().map_err(|e| map_resolution_error(e, model))?;
    Ok(columns.iter().map(|&column| solution.value(column)).collect())
}

fn map_resolution_error(err: ResolutionError, model: &LpModel) -> ScopfError {
    match err {
        ResolutionError::Infeasible => ScopfError::Infeasible(format!(
            "no dispatch satisfies all {} constraints",
            model.rows.len()
        )),
        ResolutionError::Unbounded => ScopfError::Unbounded,
        other => ScopfError::Solver(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scopf::model::{Constraint, LinearExpr, RowKind};

    #[cfg(feature = "solver-clarabel")]
    #[test]
    fn solves_small_lp() {
        // min x + 2y  s.t. x + y = 10, 0 <= x <= 4, y >= 0
        let mut model = LpModel::new();
        let x = model.add_variable("x", 0.0, 4.0);
        let y = model.add_variable("y", 0.0, f64::INFINITY);
        let mut sum = LinearExpr::term(x, 1.0);
        sum.add_term(y, 1.0);
        model.add_row(Constraint::equality("sum", RowKind::PowerBalance, sum, 10.0));
        let mut cost = LinearExpr::term(x, 1.0);
        cost.add_term(y, 2.0);
        model.set_objective(cost);

        let outcome = solve_lp(&model, LpSolverKind::Clarabel).unwrap();
        assert!((outcome.value(x) - 4.0).abs() < 1e-4);
        assert!((outcome.value(y) - 6.0).abs() < 1e-4);
        assert!((outcome.objective_value - 16.0).abs() < 1e-3);
    }

    #[cfg(feature = "solver-clarabel")]
    #[test]
    fn infeasible_rows_are_reported() {
        let mut model = LpModel::new();
        let x = model.add_variable("x", 0.0, 1.0);
        model.add_row(Constraint::equality(
            "too_much",
            RowKind::PowerBalance,
            LinearExpr::term(x, 1.0),
            5.0,
        ));
        model.set_objective(LinearExpr::term(x, 1.0));

        let err = solve_lp(&model, LpSolverKind::Clarabel).unwrap_err();
        assert!(err.is_infeasible(), "unexpected error: {err}");
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn missing_backend_is_a_config_error() {
        let mut model = LpModel::new();
        let x = model.add_variable("x", 0.0, 1.0);
        model.set_objective(LinearExpr::term(x, 1.0));

        let err = solve_lp(&model, LpSolverKind::Highs).unwrap_err();
        assert!(matches!(err, ScopfError::Config(_)), "unexpected error: {err}");
        assert!(err.to_string().contains("'highs' is not compiled in"));
    }
}
