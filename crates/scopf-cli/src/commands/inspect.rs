use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use scopf_algo::{RowKind, ScopfSolver};
use scopf_cli::{CaseFile, ModelArgs};
use tabwriter::TabWriter;

use crate::commands::util::load_config;

pub fn handle(case_path: &Path, model: &ModelArgs) -> Result<()> {
    let config = load_config(model)?;
    let case = CaseFile::load(case_path)?;
    let network = case.network()?;
    let problem = ScopfSolver::from_config(config).build(&network, &case.contingency_list())?;
    let stats = problem.stats();

    println!("{}", stats);
    let mut writer = TabWriter::new(io::stdout()).padding(2);
    writeln!(writer, "ROW KIND\tCOUNT")?;
    for kind in RowKind::ALL {
        let count = stats.rows_by_kind.get(&kind).copied().unwrap_or(0);
        writeln!(writer, "{}\t{}", kind.as_str(), count)?;
    }
    writer.flush()?;
    Ok(())
}
