use super::arena::ScenarioVars;
use super::model::LinearExpr;
use scopf_core::Network;

/// Linear production cost of the base-case dispatch.
///
/// Contingency generation is a consequence of the base dispatch and the
/// response rules, so it carries no cost of its own.
pub fn base_cost(network: &Network, base: &ScenarioVars) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for gen in network.generators() {
        if let Some(&var) = base.generation.get(&gen.id) {
            expr.add_term(var, gen.cost);
        }
    }
    expr
}
