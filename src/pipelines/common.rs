use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::BuildFlags;
use crate::config::{self, CliState, ResolveExtra, ResolvedConfig};
use crate::defaults::Defaults;
use crate::installer::Installer;
use crate::option::{self, BuildOption, RawFlags};

/// Normalize flags and resolve the configuration for one command.
///
/// An install check requested through the flags is forwarded to the resolver.
pub fn prepare(
    base_dir: &Path,
    flags: &BuildFlags,
    raw: RawFlags,
    extra: ResolveExtra,
    defaults: &Defaults,
    installer: &dyn Installer,
) -> Result<(ResolvedConfig, BuildOption)> {
    let option = option::normalize(&raw);
    let state = CliState {
        base_dir: base_dir.to_path_buf(),
        filename: flags.filename.clone(),
    };
    let extra = ResolveExtra {
        install: option.install_check.clone().or(extra.install),
        ..extra
    };

    let resolved = config::resolve(&state, &extra, defaults, installer)
        .context("Failed to resolve bundler config")?;
    tracing::debug!(
        "Resolved config (env={:?}, framework={:?}, origin={:?})",
        resolved.env,
        resolved.framework,
        resolved.origin
    );

    Ok((resolved, option))
}
