use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Security-constrained DC optimal power flow", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and solve the SCOPF for a case file
    Solve {
        /// Path to the JSON case file
        case: PathBuf,
        /// Write the solution as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        model: ModelArgs,
        /// LP solver to use (clarabel, highs)
        #[arg(long)]
        lp_solver: Option<String>,
        /// Threads: `auto` or numeric
        #[arg(long, default_value = "auto")]
        threads: String,
    },
    /// Check a case file without building the model
    Validate {
        /// Path to the JSON case file
        case: PathBuf,
    },
    /// Build the model and print its size
    Inspect {
        /// Path to the JSON case file
        case: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
    },
}

/// Model-building options shared by `solve` and `inspect`
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// TOML file with solver settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Assemble scenarios on one thread
    #[arg(long)]
    pub sequential: bool,
    /// Do not pin a reference angle per island
    #[arg(long)]
    pub free_angles: bool,
}
