use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::assembler::TargetConfig;
use crate::config::ResolvedConfig;
use crate::defaults::Defaults;
use crate::error::BuildFailure;

/// Bundler interface.
///
/// The CLI never compiles assets itself. It hands finished configurations to
/// an implementation of this trait.
pub trait Bundler {
    /// Verify the bundler can be launched at all.
    fn check_env(&self) -> Result<()>;

    /// Compile one target.
    ///
    /// # Side effects
    /// - Writes build output to the paths named in the configuration.
    /// - May write bundler logs to stdout/stderr.
    fn compile(&self, config: &TargetConfig) -> Result<(), BuildFailure>;

    /// Start a dev server for the given targets and block until it exits.
    fn serve(&self, configs: &[TargetConfig], port: u16) -> Result<()>;
}

/// Runs an external bundler command (webpack by default) against config
/// files written to the compile cache.
pub struct CommandBundler {
    command: String,
    base_dir: PathBuf,
    cache_dir: PathBuf,
}

impl CommandBundler {
    pub fn new(command: impl Into<String>, base_dir: &Path, cache_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            base_dir: base_dir.to_path_buf(),
            cache_dir,
        }
    }

    /// Bundler command from the config's `cli.bundler`, else the default.
    pub fn from_config(resolved: &ResolvedConfig, defaults: &Defaults) -> Self {
        let command = resolved
            .source
            .get("cli")
            .and_then(|cli| cli.get("bundler"))
            .and_then(Value::as_str)
            .unwrap_or(&defaults.bundler_command);
        Self::new(
            command,
            &resolved.base_dir,
            defaults.cache_dir_in(&resolved.base_dir),
        )
    }

    fn write_config(&self, name: &str, value: &Value) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("Failed to create cache dir: {}", self.cache_dir.display())
        })?;
        let path = self.cache_dir.join(format!("{name}.config.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(value)?)
            .with_context(|| format!("Failed to write bundler config: {}", path.display()))?;
        Ok(path)
    }

    fn shell(&self, cmd: &str) -> Command {
        let (shell, arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        let mut command = Command::new(shell);
        command.args([arg, cmd]).current_dir(&self.base_dir);
        command
    }
}

impl Bundler for CommandBundler {
    fn check_env(&self) -> Result<()> {
        let program = self
            .command
            .split_whitespace()
            .next()
            .context("Bundler command is empty")?;
        Command::new(program)
            .arg("--version")
            .output()
            .with_context(|| format!("Bundler '{program}' not found. Is it installed and on PATH?"))?;
        Ok(())
    }

    fn compile(&self, config: &TargetConfig) -> Result<(), BuildFailure> {
        let failure = |message: String| BuildFailure {
            target: config.target,
            message,
        };

        let path = self
            .write_config(config.target.name(), &config.config)
            .map_err(|e| failure(format!("{e:#}")))?;
        let cmd = format!("{} --config \"{}\"", self.command, path.display());
        tracing::debug!("Executing: {cmd}");

        let status = self
            .shell(&cmd)
            .status()
            .map_err(|e| failure(format!("failed to execute '{cmd}': {e}")))?;
        if !status.success() {
            return Err(failure(format!("bundler exited with {status}")));
        }
        Ok(())
    }

    fn serve(&self, configs: &[TargetConfig], port: u16) -> Result<()> {
        let value = match configs {
            [single] => single.config.clone(),
            many => Value::Array(many.iter().map(|c| c.config.clone()).collect()),
        };
        let path = self.write_config("dev-server", &value)?;
        let cmd = format!(
            "{} serve --config \"{}\" --port {port}",
            self.command,
            path.display()
        );
        tracing::debug!("Executing: {cmd}");

        let status = self
            .shell(&cmd)
            .status()
            .with_context(|| format!("Failed to start dev server: {cmd}"))?;
        if !status.success() {
            anyhow::bail!("Dev server exited with {status}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Target;
    use serde_json::json;

    #[cfg(unix)]
    #[test]
    fn compile_writes_config_and_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        let config = TargetConfig {
            target: Target::Server,
            config: json!({"target": "node"}),
        };

        CommandBundler::new("true", dir.path(), cache.clone())
            .compile(&config)
            .unwrap();
        let written: Value =
            serde_json::from_slice(&std::fs::read(cache.join("server.config.json")).unwrap())
                .unwrap();
        assert_eq!(written, json!({"target": "node"}));

        let err = CommandBundler::new("false", dir.path(), cache)
            .compile(&config)
            .unwrap_err();
        assert_eq!(err.target, Target::Server);
        assert!(err.message.contains("exited"));
    }

    #[test]
    fn empty_command_fails_env_check() {
        let bundler = CommandBundler::new("  ", Path::new("."), PathBuf::from("cache"));
        assert!(bundler.check_env().is_err());
    }
}
