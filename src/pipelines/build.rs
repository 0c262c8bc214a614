use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::assembler::{self, AssembledConfig, Target, TargetConfig};
use crate::bundler::{Bundler, CommandBundler};
use crate::cli::BuildFlags;
use crate::config::ResolveExtra;
use crate::defaults::Defaults;
use crate::error::{BuildFailure, CliError};
use crate::installer::PackageManagerInstaller;
use crate::option::RawFlags;

use super::common::prepare;

/// Outcome of one target's compilation.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: Target,
    pub result: Result<(), BuildFailure>,
}

/// Per-target results of a build pass, in build order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failed_targets(&self) -> Vec<Target> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.target)
            .collect()
    }

    pub fn into_result(self) -> Result<(), CliError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(CliError::BuildFailed {
                failed: self.failed_targets(),
            })
        }
    }
}

/// Compile every assembled target in order.
///
/// A failing target is recorded and the remaining ones are still attempted.
pub fn build_targets(assembled: &AssembledConfig, bundler: &dyn Bundler) -> BuildReport {
    compile_all(assembled.entries(), bundler)
}

pub(crate) fn compile_all(configs: &[TargetConfig], bundler: &dyn Bundler) -> BuildReport {
    let mut report = BuildReport::default();
    for config in configs {
        println!(
            "{} Compiling target: {}",
            "[INFO]".cyan(),
            config.target.name()
        );
        let result = bundler.compile(config);
        match &result {
            Ok(()) => tracing::debug!("Target '{}' compiled", config.target.name()),
            Err(e) => eprintln!("{} {}", "[FAIL]".red().bold(), e),
        }
        report.outcomes.push(TargetOutcome {
            target: config.target,
            result,
        });
    }
    report
}

/// Standard build pipeline: resolve, assemble, compile each target.
pub fn execute_build_pipeline(
    base_dir: &Path,
    flags: &BuildFlags,
    env: Option<String>,
    defaults: &Defaults,
) -> Result<()> {
    let extra = ResolveExtra {
        env,
        ..Default::default()
    };
    run_build(base_dir, flags, RawFlags::from(flags), extra, defaults)
}

/// DLL pre-build: forces the dll framework and the dll-only filter.
pub fn execute_dll_pipeline(
    base_dir: &Path,
    flags: &BuildFlags,
    env: Option<String>,
    defaults: &Defaults,
) -> Result<()> {
    let raw = RawFlags {
        only_dll: true,
        ..RawFlags::from(flags)
    };
    let extra = ResolveExtra {
        env,
        framework: Some("dll".to_string()),
        install: None,
    };
    run_build(base_dir, flags, raw, extra, defaults)
}

fn run_build(
    base_dir: &Path,
    flags: &BuildFlags,
    raw: RawFlags,
    extra: ResolveExtra,
    defaults: &Defaults,
) -> Result<()> {
    let start_time = Instant::now();
    let installer = PackageManagerInstaller;

    let (resolved, option) = prepare(base_dir, flags, raw, extra, defaults, &installer)?;
    let assembled = assembler::assemble(&resolved, &option, defaults)
        .context("Failed to assemble bundler config")?;

    println!(
        "{} Building targets: {} [env={}]",
        "[EASY]".green().bold(),
        target_list(&assembled),
        resolved.env.as_deref().unwrap_or("-")
    );

    let bundler = CommandBundler::from_config(&resolved, defaults);
    bundler
        .check_env()
        .context("Bundler environment validation failed")?;

    build_targets(&assembled, &bundler).into_result()?;

    println!(
        "{} Build completed in {:.2}s",
        "[DONE]".green().bold(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

pub(crate) fn target_list(assembled: &AssembledConfig) -> String {
    assembled
        .targets()
        .iter()
        .map(Target::name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// Fails the targets it is told to fail and records every attempt.
    struct ScriptedBundler {
        fail: Vec<Target>,
        attempts: RefCell<Vec<Target>>,
    }

    impl Bundler for ScriptedBundler {
        fn check_env(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn compile(&self, config: &TargetConfig) -> Result<(), BuildFailure> {
            self.attempts.borrow_mut().push(config.target);
            if self.fail.contains(&config.target) {
                return Err(BuildFailure {
                    target: config.target,
                    message: "compilation error".into(),
                });
            }
            Ok(())
        }

        fn serve(&self, _: &[TargetConfig], _: u16) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn entry(target: Target) -> TargetConfig {
        TargetConfig {
            target,
            config: json!({}),
        }
    }

    #[test]
    fn failing_middle_target_does_not_stop_the_rest() {
        let assembled = AssembledConfig::Multiple(vec![
            entry(Target::Dll),
            entry(Target::Client),
            entry(Target::Server),
        ]);
        let bundler = ScriptedBundler {
            fail: vec![Target::Client],
            attempts: RefCell::new(Vec::new()),
        };

        let report = build_targets(&assembled, &bundler);
        assert_eq!(
            *bundler.attempts.borrow(),
            vec![Target::Dll, Target::Client, Target::Server]
        );
        assert!(!report.is_success());
        assert_eq!(report.failed_targets(), vec![Target::Client]);
        assert!(matches!(
            report.into_result(),
            Err(CliError::BuildFailed { failed }) if failed == vec![Target::Client]
        ));
    }

    #[test]
    fn single_config_builds_once() {
        let bundler = ScriptedBundler {
            fail: vec![],
            attempts: RefCell::new(Vec::new()),
        };
        let report = build_targets(&AssembledConfig::Single(entry(Target::Web)), &bundler);
        assert!(report.is_success());
        assert!(report.into_result().is_ok());
        assert_eq!(*bundler.attempts.borrow(), vec![Target::Web]);
    }
}
