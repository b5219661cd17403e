use std::fs;

use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;
use scopf_algo::{AngleReference, ScopfConfig};
use scopf_cli::ModelArgs;
use tracing::debug;

pub fn configure_threads(spec: &str) {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse().unwrap_or_else(|_| num_cpus::get())
    };
    if ThreadPoolBuilder::new().num_threads(count).build_global().is_ok() {
        debug!(threads = count, "rayon pool configured");
    }
}

/// Settings from `--config` (if any) with command-line flags applied on top.
pub fn load_config(args: &ModelArgs) -> Result<ScopfConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ScopfConfig::default(),
    };
    if args.sequential {
        config.parallel = false;
    }
    if args.free_angles {
        config.angle_reference = AngleReference::Free;
    }
    Ok(config)
}
