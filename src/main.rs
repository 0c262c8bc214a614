use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::Path;

use easyweb_cli::archive::ArchiveFormat;
use easyweb_cli::cli::{Cli, Commands};
use easyweb_cli::defaults::Defaults;
use easyweb_cli::{logger, pipelines};

/// CLI entry point.
///
/// Parses arguments, installs logging, and prints top-level errors without
/// a Rust backtrace.
fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet, cli.no_color);
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let base_dir = std::env::current_dir().context("Unable to read current directory")?;
    let defaults = Defaults::default();

    match cli.command {
        Commands::Init { name, registry } => {
            let project_dir = name
                .map(|n| base_dir.join(n))
                .unwrap_or_else(|| base_dir.clone());
            pipelines::execute_init_pipeline(&project_dir, registry.as_deref())
        }
        Commands::Install { mode, flags } => {
            pipelines::execute_install_pipeline(&base_dir, &flags, mode, &defaults)
        }
        Commands::Upgrade { mode } => {
            pipelines::execute_upgrade_pipeline(&base_dir, mode, &defaults)
        }
        Commands::Print {
            env,
            node_path,
            flags,
        } => pipelines::execute_print_pipeline(
            &base_dir,
            &flags,
            env,
            node_path.as_deref(),
            &defaults,
        ),
        Commands::Dll { env, flags } => {
            pipelines::execute_dll_pipeline(&base_dir, &flags, env, &defaults)
        }
        Commands::Build { env, flags } => {
            pipelines::execute_build_pipeline(&base_dir, &flags, env, &defaults)
        }
        Commands::Server { env, flags } => {
            pipelines::execute_server_pipeline(&base_dir, &flags, env, &defaults)
        }
        Commands::Zip(args) => {
            pipelines::execute_archive_pipeline(&base_dir, &args, ArchiveFormat::Zip, &defaults)
        }
        Commands::Tar(args) => {
            pipelines::execute_archive_pipeline(&base_dir, &args, ArchiveFormat::Tar, &defaults)
        }
        Commands::Deploy => pipelines::execute_deploy_pipeline(),
        Commands::Clean { dir } => {
            pipelines::execute_clean_pipeline(&base_dir, dir.as_deref(), &defaults)
        }
        Commands::Open { dir } => {
            pipelines::execute_open_pipeline(&base_dir, dir.as_deref().map(Path::new), &defaults)
        }
        Commands::Kill { port } => pipelines::execute_kill_pipeline(port.as_deref(), &defaults),
    }
}
