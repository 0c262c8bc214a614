use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::assembler;
use crate::cli::BuildFlags;
use crate::config::ResolveExtra;
use crate::defaults::Defaults;
use crate::installer::{Installer, PackageManagerInstaller};
use crate::option::RawFlags;

use super::common::prepare;

/// Install dependencies missing from `node_modules`, then make sure the
/// configuration still assembles.
pub fn execute_install_pipeline(
    base_dir: &Path,
    flags: &BuildFlags,
    mode: Option<String>,
    defaults: &Defaults,
) -> Result<()> {
    let package_manager = mode.unwrap_or_else(|| defaults.package_manager.clone());
    println!(
        "{} Checking dependencies with {}",
        "[EASY]".green().bold(),
        package_manager
    );

    let raw = RawFlags {
        install_mode: Some(package_manager),
        ..RawFlags::from(flags)
    };
    let installer = PackageManagerInstaller;
    let (resolved, option) = prepare(
        base_dir,
        flags,
        raw,
        ResolveExtra::default(),
        defaults,
        &installer,
    )?;
    assembler::assemble(&resolved, &option, defaults)
        .context("Failed to assemble bundler config")?;

    println!("{} Dependencies are up to date", "[DONE]".green().bold());
    Ok(())
}

pub fn execute_upgrade_pipeline(
    base_dir: &Path,
    mode: Option<String>,
    defaults: &Defaults,
) -> Result<()> {
    let package_manager = mode.unwrap_or_else(|| defaults.package_manager.clone());
    if !base_dir.join("package.json").exists() {
        anyhow::bail!("No package.json found in {}", base_dir.display());
    }

    println!(
        "{} Upgrading dependencies with {}",
        "[EASY]".green().bold(),
        package_manager
    );
    PackageManagerInstaller.upgrade(&package_manager, base_dir)?;
    println!("{} Upgrade finished", "[DONE]".green().bold());
    Ok(())
}
