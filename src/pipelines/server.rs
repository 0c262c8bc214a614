use anyhow::{Context, Result};
use colored::*;
use serde_json::json;
use std::path::Path;

use crate::assembler::{self, AssembledConfig, TargetConfig};
use crate::bundler::{Bundler, CommandBundler};
use crate::cli::BuildFlags;
use crate::config::ResolveExtra;
use crate::defaults::Defaults;
use crate::installer::PackageManagerInstaller;
use crate::option::{BuildOption, RawFlags};
use crate::tree;

use super::build::{compile_all, target_list};
use super::common::prepare;

/// Build the targets the dev server does not serve, then serve the rest.
///
/// Server-side bundles are compiled once up front; any failure there aborts
/// before the server starts. Blocks until the dev server exits.
pub fn serve_targets(
    assembled: &AssembledConfig,
    option: &BuildOption,
    defaults: &Defaults,
    bundler: &dyn Bundler,
) -> Result<()> {
    let (mut served, prebuilt): (Vec<TargetConfig>, Vec<TargetConfig>) = assembled
        .entries()
        .iter()
        .cloned()
        .partition(|c| c.target.is_web_side());

    if !prebuilt.is_empty() {
        compile_all(&prebuilt, bundler).into_result()?;
    }

    if served.is_empty() {
        println!(
            "{} No web-side target to serve; build pass finished.",
            "[WARN]".yellow()
        );
        return Ok(());
    }

    let port = option.port.unwrap_or(defaults.port);
    for config in &mut served {
        tree::set_path(&mut config.config, "devServer/port", json!(port));
    }

    println!(
        "{} Dev server listening on http://127.0.0.1:{}",
        "[EASY]".green().bold(),
        port
    );
    bundler.serve(&served, port)
}

pub fn execute_server_pipeline(
    base_dir: &Path,
    flags: &BuildFlags,
    env: Option<String>,
    defaults: &Defaults,
) -> Result<()> {
    let installer = PackageManagerInstaller;
    let extra = ResolveExtra {
        env,
        ..Default::default()
    };
    let (resolved, option) = prepare(
        base_dir,
        flags,
        RawFlags::from(flags),
        extra,
        defaults,
        &installer,
    )?;
    let assembled = assembler::assemble(&resolved, &option, defaults)
        .context("Failed to assemble bundler config")?;

    println!(
        "{} Starting dev build for: {}",
        "[EASY]".green().bold(),
        target_list(&assembled)
    );

    let bundler = CommandBundler::from_config(&resolved, defaults);
    bundler
        .check_env()
        .context("Bundler environment validation failed")?;

    serve_targets(&assembled, &option, defaults, &bundler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Target;
    use crate::error::{BuildFailure, CliError};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingBundler {
        compiled: RefCell<Vec<Target>>,
        served: RefCell<Vec<(Vec<TargetConfig>, u16)>>,
        fail_compile: bool,
    }

    impl Bundler for RecordingBundler {
        fn check_env(&self) -> Result<()> {
            Ok(())
        }

        fn compile(&self, config: &TargetConfig) -> std::result::Result<(), BuildFailure> {
            self.compiled.borrow_mut().push(config.target);
            if self.fail_compile {
                return Err(BuildFailure {
                    target: config.target,
                    message: "broken".into(),
                });
            }
            Ok(())
        }

        fn serve(&self, configs: &[TargetConfig], port: u16) -> Result<()> {
            self.served.borrow_mut().push((configs.to_vec(), port));
            Ok(())
        }
    }

    fn assembled() -> AssembledConfig {
        AssembledConfig::Multiple(vec![
            TargetConfig {
                target: Target::Client,
                config: json!({}),
            },
            TargetConfig {
                target: Target::Server,
                config: json!({}),
            },
        ])
    }

    #[test]
    fn server_bundle_is_built_before_serving_client_on_default_port() {
        let bundler = RecordingBundler::default();
        serve_targets(
            &assembled(),
            &BuildOption::default(),
            &Defaults::default(),
            &bundler,
        )
        .unwrap();

        assert_eq!(*bundler.compiled.borrow(), vec![Target::Server]);
        let served = bundler.served.borrow();
        assert_eq!(served.len(), 1);
        let (configs, port) = &served[0];
        assert_eq!(*port, 7001);
        assert_eq!(configs[0].target, Target::Client);
        assert_eq!(configs[0].config["devServer"]["port"], 7001);
    }

    #[test]
    fn explicit_port_is_used() {
        let bundler = RecordingBundler::default();
        let option = BuildOption {
            port: Some(9100),
            ..Default::default()
        };
        serve_targets(&assembled(), &option, &Defaults::default(), &bundler).unwrap();
        assert_eq!(bundler.served.borrow()[0].1, 9100);
    }

    #[test]
    fn failed_prebuild_prevents_serving() {
        let bundler = RecordingBundler {
            fail_compile: true,
            ..Default::default()
        };
        let err = serve_targets(
            &assembled(),
            &BuildOption::default(),
            &Defaults::default(),
            &bundler,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::BuildFailed { .. })
        ));
        assert!(bundler.served.borrow().is_empty());
    }
}
