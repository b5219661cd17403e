//! Solver-agnostic linear program.
//!
//! The assembler writes into an [`LpModel`]; the solver adapter reads it. Every
//! row is stored as `lower <= Σ coef·x <= upper` with its terms sorted by
//! column, merged and stripped of zeros, so two builds from the same input
//! compare equal.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Column index into [`LpModel::variables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDef {
    pub name: String,
    /// `-inf` when free below
    pub lower: f64,
    /// `+inf` when free above
    pub upper: f64,
}

/// Family a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    PowerBalance,
    FlowLimit,
    /// `pg_bc = pg`
    BranchResponse,
    /// `pg_gc = pg + alpha·omega`
    GeneratorResponse,
    AngleReference,
}

impl RowKind {
    pub const ALL: [RowKind; 5] = [
        RowKind::PowerBalance,
        RowKind::FlowLimit,
        RowKind::BranchResponse,
        RowKind::GeneratorResponse,
        RowKind::AngleReference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::PowerBalance => "power_balance",
            RowKind::FlowLimit => "flow_limit",
            RowKind::BranchResponse => "branch_response",
            RowKind::GeneratorResponse => "generator_response",
            RowKind::AngleReference => "angle_reference",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub name: String,
    pub kind: RowKind,
    pub terms: Vec<(VarId, f64)>,
    pub lower: f64,
    pub upper: f64,
}

impl Constraint {
    /// Build `lower <= expr <= upper`.
    pub fn ranged(
        name: impl Into<String>,
        kind: RowKind,
        expr: LinearExpr,
        lower: f64,
        upper: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            terms: expr.into_terms(),
            lower,
            upper,
        }
    }

    /// Build `expr == rhs`.
    pub fn equality(name: impl Into<String>, kind: RowKind, expr: LinearExpr, rhs: f64) -> Self {
        Self::ranged(name, kind, expr, rhs, rhs)
    }

    #[inline]
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }

    /// Row activity for a full column assignment.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Linear expression `Σ coef·x`, kept sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(var: VarId, coef: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(var, coef);
        expr
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut Self {
        *self.terms.entry(var).or_insert(0.0) += coef;
        self
    }

    /// Nonzero terms in column order.
    pub fn into_terms(self) -> Vec<(VarId, f64)> {
        self.terms.into_iter().filter(|(_, c)| *c != 0.0).collect()
    }
}

/// Counts describing an assembled model
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelStats {
    pub num_variables: usize,
    pub num_constraints: usize,
    pub num_nonzeros: usize,
    /// Base case plus one per contingency
    pub num_scenarios: usize,
    pub rows_by_kind: BTreeMap<RowKind, usize>,
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables, {} constraints, {} nonzeros across {} scenarios",
            self.num_variables, self.num_constraints, self.num_nonzeros, self.num_scenarios
        )
    }
}

/// Variables, rows and a linear objective to minimize.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LpModel {
    pub variables: Vec<VariableDef>,
    pub rows: Vec<Constraint>,
    pub objective: Vec<(VarId, f64)>,
}

impl LpModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column and return its id.
    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDef {
            name: name.into(),
            lower,
            upper,
        });
        id
    }

    pub fn add_row(&mut self, row: Constraint) {
        self.rows.push(row);
    }

    pub fn extend_rows(&mut self, rows: impl IntoIterator<Item = Constraint>) {
        self.rows.extend(rows);
    }

    pub fn set_objective(&mut self, expr: LinearExpr) {
        self.objective = expr.into_terms();
    }

    pub fn variable(&self, id: VarId) -> Option<&VariableDef> {
        self.variables.get(id.index())
    }

    /// Column with the given name (linear scan).
    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .map(VarId)
    }

    pub fn find_row(&self, name: &str) -> Option<&Constraint> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn rows_of(&self, kind: RowKind) -> impl Iterator<Item = &Constraint> {
        self.rows.iter().filter(move |r| r.kind == kind)
    }

    pub fn num_nonzeros(&self) -> usize {
        self.rows.iter().map(|r| r.terms.len()).sum()
    }

    /// Objective value for a full column assignment.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn stats(&self, num_scenarios: usize) -> ModelStats {
        let mut rows_by_kind = BTreeMap::new();
        for row in &self.rows {
            *rows_by_kind.entry(row.kind).or_insert(0) += 1;
        }
        ModelStats {
            num_variables: self.variables.len(),
            num_constraints: self.rows.len(),
            num_nonzeros: self.num_nonzeros(),
            num_scenarios,
            rows_by_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_merges_and_drops_zeros() {
        let mut model = LpModel::new();
        let a = model.add_variable("a", 0.0, 1.0);
        let b = model.add_variable("b", 0.0, 1.0);

        let mut expr = LinearExpr::new();
        expr.add_term(b, 2.0).add_term(a, 1.0).add_term(b, -2.0).add_term(a, 0.5);
        assert_eq!(expr.into_terms(), vec![(a, 1.5)]);
    }

    #[test]
    fn one_sided_row_is_not_equality() {
        let mut model = LpModel::new();
        let x = model.add_variable("x", f64::NEG_INFINITY, f64::INFINITY);
        let expr = LinearExpr::term(x, 1.0);

        let row = Constraint::ranged("r", RowKind::FlowLimit, expr, -10.0, f64::INFINITY);
        assert_eq!(row.lower, -10.0);
        assert!(row.upper.is_infinite());
        assert!(!row.is_equality());
    }

    #[test]
    fn stats_count_rows_by_kind() {
        let mut model = LpModel::new();
        let x = model.add_variable("x", 0.0, 1.0);
        let y = model.add_variable("y", 0.0, 1.0);
        let mut sum = LinearExpr::term(x, 1.0);
        sum.add_term(y, 1.0);
        model.add_row(Constraint::equality("sum", RowKind::PowerBalance, sum, 1.0));
        model.add_row(Constraint::equality(
            "pin",
            RowKind::AngleReference,
            LinearExpr::term(x, 1.0),
            0.0,
        ));
        model.set_objective(LinearExpr::term(y, 3.0));

        let stats = model.stats(1);
        assert_eq!(stats.num_variables, 2);
        assert_eq!(stats.num_constraints, 2);
        assert_eq!(stats.num_nonzeros, 3);
        assert_eq!(stats.rows_by_kind[&RowKind::PowerBalance], 1);
        assert_eq!(model.find_variable("y"), Some(y));
        assert_eq!(model.objective_value(&[0.0, 2.0]), 6.0);
        assert_eq!(model.find_row("sum").map(|r| r.activity(&[0.25, 0.75])), Some(1.0));
    }
}
