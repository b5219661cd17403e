use clap::Parser;
use scopf_algo::ScopfError;
use scopf_cli::{Cli, Commands};
use scopf_core::ValidationError;
use std::io;
use std::process;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

use crate::commands::{inspect, solve, validate};

/// Exit status for a failed run: 2 when no secure dispatch exists, 3 when
/// the input was rejected, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(scopf) = err.downcast_ref::<ScopfError>() {
        return match scopf {
            ScopfError::Infeasible(_) => 2,
            ScopfError::Validation(_) => 3,
            _ => 1,
        };
    }
    if err.downcast_ref::<ValidationError>().is_some() {
        return 3;
    }
    1
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    let result = match &cli.command {
        Commands::Solve {
            case,
            out,
            model,
            lp_solver,
            threads,
        } => solve::handle(case, out.as_deref(), model, lp_solver.as_deref(), threads),
        Commands::Validate { case } => validate::handle(case),
        Commands::Inspect { case, model } => inspect::handle(case, model),
    };

    if let Err(err) = result {
        error!("{:#}", err);
        process::exit(exit_code(&err));
    }
}
