//! Config resolution: built-in defaults < config file < caller extra.
//!
//! Layers are stacked with `figment`. For an environment `<env>` the order is:
//! built-in defaults, built-in `<env>` preset, config file, then the file's own
//! `env.<env>` section.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::checker;
use crate::defaults::Defaults;
use crate::error::{CliError, Result};
use crate::installer::{InstallRequest, Installer};
use crate::option::InstallCheck;
use crate::tree;

/// Where the loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Defaults,
    File(PathBuf),
    PackageJson(PathBuf),
}

/// CLI state that locates the configuration.
#[derive(Debug, Clone)]
pub struct CliState {
    pub base_dir: PathBuf,
    /// Explicit `--filename`, relative to `base_dir` unless absolute.
    pub filename: Option<PathBuf>,
}

/// Per-command additions layered on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct ResolveExtra {
    pub env: Option<String>,
    pub framework: Option<String>,
    pub install: Option<InstallCheck>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_dir: PathBuf,
    pub env: Option<String>,
    pub framework: Option<String>,
    pub source: Value,
    pub origin: ConfigOrigin,
}

impl ConfigOrigin {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigOrigin::Defaults => None,
            ConfigOrigin::File(path) | ConfigOrigin::PackageJson(path) => Some(path.as_path()),
        }
    }
}

/// Built-in defaults shared by every environment.
pub fn builtin_config() -> Value {
    json!({
        "entry": {},
        "plugins": [],
    })
}

/// Built-in preset for a named environment. Sits below the config file.
pub fn builtin_env_preset(env: &str) -> Option<Value> {
    match env {
        "dev" => Some(json!({ "devtool": "eval-source-map" })),
        "test" => Some(json!({ "devtool": "source-map" })),
        "prod" => Some(json!({ "optimization": { "minimize": true } })),
        _ => None,
    }
}

pub fn resolve(
    state: &CliState,
    extra: &ResolveExtra,
    defaults: &Defaults,
    installer: &dyn Installer,
) -> Result<ResolvedConfig> {
    let (file_config, origin) = match load_config_file(state, defaults)? {
        Some((value, origin)) => (value, origin),
        None => (Value::Object(Default::default()), ConfigOrigin::Defaults),
    };
    tracing::debug!("Config origin: {origin:?}");

    let env = extra.env.as_deref();
    let preset = env.and_then(builtin_env_preset);
    let overlay = env.and_then(|env| {
        match file_config.get("env").and_then(|envs| envs.get(env)) {
            Some(section @ Value::Object(_)) => Some(section.clone()),
            _ => {
                tracing::debug!("No overrides declared for env '{env}'");
                None
            }
        }
    });

    let builtin = builtin_config();
    let layers = [
        Some(&builtin),
        preset.as_ref(),
        Some(&file_config),
        overlay.as_ref(),
    ];
    let source = tree::layered(layers.into_iter().flatten()).map_err(|e| {
        CliError::ConfigInvalid {
            path: origin
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| state.base_dir.clone()),
            message: e.to_string(),
        }
    })?;

    let framework = extra.framework.clone().or_else(|| {
        source
            .get("framework")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    if let Some(install) = extra.install.as_ref().filter(|i| i.check) {
        ensure_dependencies(&state.base_dir, install, installer)?;
    }

    Ok(ResolvedConfig {
        base_dir: state.base_dir.clone(),
        env: extra.env.clone(),
        framework,
        source,
        origin,
    })
}

fn ensure_dependencies(
    base_dir: &Path,
    install: &InstallCheck,
    installer: &dyn Installer,
) -> Result<()> {
    let missing = checker::missing_dependencies(base_dir);
    if missing.is_empty() {
        tracing::info!("All declared dependencies are installed");
        return Ok(());
    }

    tracing::info!(
        "Installing {} missing dependencies with {}: {}",
        missing.len(),
        install.npm,
        missing.join(", ")
    );
    installer.install(&InstallRequest {
        package_manager: &install.npm,
        registry: None,
        cwd: base_dir,
        packages: &missing,
        production: false,
    })?;
    Ok(())
}

/// Load the explicit or discovered config file.
///
/// An explicit path must exist and parse. Implicit discovery never fails:
/// missing files are skipped and unparsable ones are logged and skipped.
pub fn load_config_file(
    state: &CliState,
    defaults: &Defaults,
) -> Result<Option<(Value, ConfigOrigin)>> {
    if let Some(filename) = &state.filename {
        let path = if filename.is_absolute() {
            filename.clone()
        } else {
            state.base_dir.join(filename)
        };
        if !path.is_file() {
            return Err(CliError::ConfigNotFound(path));
        }
        let content =
            fs::read_to_string(&path).map_err(|_| CliError::ConfigNotFound(path.clone()))?;
        let value = parse_config(&path, &content)?;
        return Ok(Some((value, ConfigOrigin::File(path))));
    }

    for name in &defaults.config_files {
        let path = state.base_dir.join(name);
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        match parse_config(&path, &content) {
            Ok(value) => return Ok(Some((value, ConfigOrigin::File(path)))),
            Err(e) => tracing::warn!("Skipping config file: {e}"),
        }
    }

    let package_json = state.base_dir.join("package.json");
    if let Ok(content) = fs::read_to_string(&package_json) {
        let section = serde_json::from_str::<Value>(&content)
            .ok()
            .and_then(|pkg| pkg.get("webpack").cloned())
            .filter(Value::is_object);
        if let Some(section) = section {
            return Ok(Some((section, ConfigOrigin::PackageJson(package_json))));
        }
    }

    Ok(None)
}

/// Parse a JSON or TOML config file into a JSON tree.
fn parse_config(path: &Path, content: &str) -> Result<Value> {
    let invalid = |message: String| CliError::ConfigInvalid {
        path: path.to_path_buf(),
        message,
    };

    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let table: toml::Value = toml::from_str(content).map_err(|e| invalid(e.to_string()))?;
            serde_json::to_value(table).map_err(|e| invalid(e.to_string()))?
        }
        Some("json") => serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?,
        _ => match serde_json::from_str(content) {
            Ok(value) => value,
            Err(json_err) => {
                let table: toml::Value = toml::from_str(content)
                    .map_err(|_| invalid(format!("neither JSON nor TOML: {json_err}")))?;
                serde_json::to_value(table).map_err(|e| invalid(e.to_string()))?
            }
        },
    };

    if !value.is_object() {
        return Err(invalid("top-level value must be an object".to_string()));
    }
    Ok(value)
}
