use std::path::Path;

use anyhow::Result;
use scopf_algo::ContingencySet;
use scopf_cli::CaseFile;

pub fn handle(case_path: &Path) -> Result<()> {
    let case = CaseFile::load(case_path)?;
    let network = case.network()?;
    let set = ContingencySet::expand(&network, &case.contingency_list())?;

    let stats = network.stats();
    println!(
        "Network OK: {} buses, {} branches, {} generators, {:.1} MW demand, {:.1} MW capacity",
        stats.num_buses,
        stats.num_branches,
        stats.num_gens,
        stats.total_demand_mw,
        stats.total_capacity_mw
    );
    println!(
        "Contingencies OK: {} branch, {} generator",
        set.branch.len(),
        set.generator.len()
    );

    let mut findings = network.advisories();
    findings.merge(set.diagnostics);
    print!("{}", findings);
    Ok(())
}
