use std::path::Path;
use std::process::Command;

use crate::error::InstallError;

/// One invocation of the package manager.
#[derive(Debug, Clone)]
pub struct InstallRequest<'a> {
    pub package_manager: &'a str,
    pub registry: Option<&'a str>,
    pub cwd: &'a Path,
    /// Explicit packages to add. Empty means "install what package.json declares".
    pub packages: &'a [String],
    /// Skip devDependencies.
    pub production: bool,
}

/// Package installation helper. A failed install aborts the calling pipeline.
pub trait Installer {
    fn install(&self, request: &InstallRequest<'_>) -> Result<(), InstallError>;

    /// Upgrade the project's dependencies in place.
    fn upgrade(&self, package_manager: &str, cwd: &Path) -> Result<(), InstallError>;
}

/// Shells out to npm, yarn, cnpm, pnpm and friends.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageManagerInstaller;

impl PackageManagerInstaller {
    fn program(package_manager: &str) -> String {
        if cfg!(target_os = "windows") && !package_manager.ends_with(".cmd") {
            format!("{package_manager}.cmd")
        } else {
            package_manager.to_string()
        }
    }

    fn run(package_manager: &str, cwd: &Path, args: &[String]) -> Result<(), InstallError> {
        let program = Self::program(package_manager);
        tracing::debug!("Executing: {program} {} (cwd={})", args.join(" "), cwd.display());

        let status = Command::new(&program)
            .args(args)
            .current_dir(cwd)
            .status()
            .map_err(|e| InstallError {
                package_manager: package_manager.to_string(),
                reason: format!("failed to spawn '{program}': {e}"),
            })?;

        if !status.success() {
            return Err(InstallError {
                package_manager: package_manager.to_string(),
                reason: format!("process exited with {status}"),
            });
        }
        Ok(())
    }
}

/// Build the argument list for one install request.
pub fn install_args(request: &InstallRequest<'_>) -> Vec<String> {
    let yarn = request.package_manager.starts_with("yarn");
    let mut args = Vec::new();

    if request.packages.is_empty() {
        args.push("install".to_string());
        if request.production {
            args.push("--production".to_string());
        }
    } else {
        args.push(if yarn { "add" } else { "install" }.to_string());
        args.extend(request.packages.iter().cloned());
        if !yarn {
            args.push("--no-save".to_string());
        }
    }

    if let Some(registry) = request.registry {
        args.push(format!("--registry={registry}"));
    }
    args
}

impl Installer for PackageManagerInstaller {
    fn install(&self, request: &InstallRequest<'_>) -> Result<(), InstallError> {
        Self::run(request.package_manager, request.cwd, &install_args(request))
    }

    fn upgrade(&self, package_manager: &str, cwd: &Path) -> Result<(), InstallError> {
        let verb = if package_manager.starts_with("yarn") {
            "upgrade"
        } else {
            "update"
        };
        Self::run(package_manager, cwd, &[verb.to_string()])
    }
}
