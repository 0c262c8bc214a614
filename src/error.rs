//! Error taxonomy shared by the resolver, assembler, orchestrator and archiver.
//!
//! Core modules return [`CliError`]; the command pipelines wrap it in
//! `anyhow` with extra context before it reaches `main`.

use std::path::PathBuf;
use thiserror::Error;

use crate::assembler::Target;

/// Top-level error type for every core operation.
#[derive(Debug, Error)]
pub enum CliError {
    /// An explicit `--filename` did not resolve to a readable file.
    #[error("Config file not found: {}\n\nHint: check the --filename path or drop it to use webpack.config.json", .0.display())]
    ConfigNotFound(PathBuf),

    /// An explicit config file exists but could not be parsed.
    #[error("Invalid config file {}: {message}", path.display())]
    ConfigInvalid { path: PathBuf, message: String },

    /// Strict mode is on and no build target could be determined.
    #[error("Unable to determine a build target.\n\nHint: pass --type, --web/--node/--dll or declare `type` in the config")]
    UnresolvedTarget,

    /// Configuration layers for one target could not be combined.
    #[error("Unable to layer configuration for target '{}': {message}", target.name())]
    Layer { target: Target, message: String },

    #[error(transparent)]
    Install(#[from] InstallError),

    /// At least one target failed to compile.
    #[error("Build failed for target(s): {}", failed.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "))]
    BuildFailed { failed: Vec<Target> },

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dependency or runtime installation failed.
#[derive(Debug, Error)]
#[error("Dependency installation with '{package_manager}' failed: {reason}")]
pub struct InstallError {
    pub package_manager: String,
    pub reason: String,
}

/// A single target reported a compilation error.
#[derive(Debug, Clone, Error)]
#[error("[{}] {message}", target.name())]
pub struct BuildFailure {
    pub target: Target,
    pub message: String,
}

/// Archive packaging errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive source path does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Archive target path is not writable: {}: {source}", path.display())]
    TargetNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Zip encoding error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;
