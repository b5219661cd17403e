use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use scopf_algo::{LpSolverKind, ScopfSolution, ScopfSolver};
use scopf_cli::{CaseFile, ModelArgs};
use scopf_core::Network;
use tabwriter::TabWriter;
use tracing::{info, warn};

use crate::commands::util::{configure_threads, load_config};

/// Residual above which the post-solve check complains (MW)
const VERIFY_TOL: f64 = 1e-4;

pub fn handle(
    case_path: &Path,
    out: Option<&Path>,
    model: &ModelArgs,
    lp_solver: Option<&str>,
    threads: &str,
) -> Result<()> {
    configure_threads(threads);
    let mut config = load_config(model)?;
    if let Some(label) = lp_solver {
        config.lp_solver = label.parse::<LpSolverKind>()?;
    }

    let case = CaseFile::load(case_path)?;
    let network = case.network()?;
    let contingencies = case.contingency_list();
    info!(
        case = %case_path.display(),
        contingencies = contingencies.len(),
        lp_solver = config.lp_solver.as_str(),
        "solving SCOPF"
    );

    let problem = ScopfSolver::from_config(config).build(&network, &contingencies)?;
    let solution = problem.solve()?;

    let report = problem.verify(&solution, VERIFY_TOL);
    if report.is_secure() {
        info!(max_violation = report.max_violation(), "solution verified");
    } else {
        warn!(
            violations = report.violations.len(),
            max_violation = report.max_violation(),
            "solution exceeds tolerance"
        );
    }

    print_dispatch(&network, &solution)?;

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&solution)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Solution written to {}", path.display());
    }
    Ok(())
}

fn print_dispatch(network: &Network, solution: &ScopfSolution) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout()).padding(2);
    writeln!(writer, "GEN\tPG (MW)\tPMIN\tPMAX\tCOST")?;
    for gen in network.generators() {
        writeln!(
            writer,
            "{}\t{:.3}\t{:.1}\t{:.1}\t{:.2}",
            gen.id,
            solution.generation(gen.id).unwrap_or(0.0),
            gen.pmin.value(),
            gen.pmax.value(),
            gen.cost
        )?;
    }
    writer.flush()?;

    println!(
        "Objective: ${:.2}/hr across {} scenarios ({} ms)",
        solution.objective_value, solution.stats.num_scenarios, solution.solve_time_ms
    );
    Ok(())
}
