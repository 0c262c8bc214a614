use anyhow::Result;
use colored::*;
use std::path::{Path, PathBuf};

use crate::defaults::Defaults;
use crate::tools;

/// `clean`: no argument removes the compile cache, `all` also removes both
/// manifests and the build output, anything else is removed as given.
pub fn execute_clean_pipeline(
    base_dir: &Path,
    dir: Option<&str>,
    defaults: &Defaults,
) -> Result<()> {
    let targets: Vec<PathBuf> = match dir {
        Some("all") => std::iter::once(defaults.cache_dir_in(base_dir))
            .chain(std::iter::once(base_dir.join(&defaults.manifest_file)))
            .chain(std::iter::once(base_dir.join(&defaults.dll_manifest_file)))
            .chain(defaults.build_dirs.iter().map(|d| base_dir.join(d)))
            .collect(),
        Some(dir) => vec![base_dir.join(dir)],
        None => vec![defaults.cache_dir_in(base_dir)],
    };

    for target in targets {
        if tools::rm(&target)? {
            println!("{} Removed {}", "[INFO]".cyan(), target.display());
        } else {
            tracing::debug!("Nothing to remove at {}", target.display());
        }
    }
    Ok(())
}

pub fn execute_open_pipeline(
    base_dir: &Path,
    dir: Option<&Path>,
    defaults: &Defaults,
) -> Result<()> {
    let path = dir
        .map(|d| base_dir.join(d))
        .unwrap_or_else(|| defaults.cache_dir_in(base_dir));
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }
    tools::open(&path)
}

pub fn execute_kill_pipeline(port: Option<&str>, defaults: &Defaults) -> Result<()> {
    let ports = port
        .map(str::to_string)
        .unwrap_or_else(|| defaults.kill_ports_arg());
    for port in tools::parse_ports(&ports) {
        let pids = tools::kill_port(port)?;
        if pids.is_empty() {
            println!("{} No process listening on port {}", "[INFO]".cyan(), port);
        } else {
            println!(
                "{} Killed {} on port {}",
                "[DONE]".green().bold(),
                pids.join(", "),
                port
            );
        }
    }
    Ok(())
}

pub fn execute_deploy_pipeline() -> Result<()> {
    println!("{} Deploy is not available yet.", "[WARN]".yellow());
    Ok(())
}
