//! Expands a resolved configuration into one config per build target.

use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

use crate::config::ResolvedConfig;
use crate::defaults::Defaults;
use crate::error::{CliError, Result};
use crate::option::{BuildOption, BuildType};
use crate::tree;

/// One build variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Client,
    Server,
    Web,
    Weex,
    Node,
    Dll,
}

impl Target {
    pub const ALL: [Target; 6] = [
        Target::Client,
        Target::Server,
        Target::Web,
        Target::Weex,
        Target::Node,
        Target::Dll,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Target::Client => "client",
            Target::Server => "server",
            Target::Web => "web",
            Target::Weex => "weex",
            Target::Node => "node",
            Target::Dll => "dll",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == value)
    }

    /// Browser-side targets. These are the ones a dev server serves.
    pub fn is_web_side(&self) -> bool {
        matches!(self, Target::Client | Target::Web | Target::Weex)
    }

    pub fn is_node_side(&self) -> bool {
        matches!(self, Target::Server | Target::Node)
    }

    /// Value of the bundler's own `target` field.
    fn platform(&self) -> &'static str {
        if self.is_node_side() {
            "node"
        } else {
            "web"
        }
    }
}

impl From<BuildType> for Target {
    fn from(value: BuildType) -> Self {
        match value {
            BuildType::Client => Target::Client,
            BuildType::Server => Target::Server,
            BuildType::Web => Target::Web,
            BuildType::Weex => Target::Weex,
        }
    }
}

/// A bundler-ready configuration for a single target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetConfig {
    pub target: Target,
    pub config: Value,
}

/// Either one configuration or an ordered list of them.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembledConfig {
    Single(TargetConfig),
    Multiple(Vec<TargetConfig>),
}

impl AssembledConfig {
    fn from_vec(mut configs: Vec<TargetConfig>) -> Self {
        if configs.len() == 1 {
            AssembledConfig::Single(configs.remove(0))
        } else {
            AssembledConfig::Multiple(configs)
        }
    }

    pub fn entries(&self) -> &[TargetConfig] {
        match self {
            AssembledConfig::Single(config) => std::slice::from_ref(config),
            AssembledConfig::Multiple(configs) => configs,
        }
    }

    pub fn targets(&self) -> Vec<Target> {
        self.entries().iter().map(|c| c.target).collect()
    }

    /// JSON shape handed to the bundler: an object or an array.
    pub fn to_value(&self) -> Value {
        match self {
            AssembledConfig::Single(config) => config.config.clone(),
            AssembledConfig::Multiple(configs) => {
                Value::Array(configs.iter().map(|c| c.config.clone()).collect())
            }
        }
    }
}

/// Top-level keys consumed by the CLI itself and never forwarded as-is.
const RESERVED_KEYS: &[&str] = &[
    "type", "env", "framework", "cli", "dll", "client", "server", "web", "weex", "node",
];

pub fn assemble(
    resolved: &ResolvedConfig,
    option: &BuildOption,
    defaults: &Defaults,
) -> Result<AssembledConfig> {
    let targets = select_targets(resolved, option)?;
    tracing::debug!(
        "Assembling targets: {}",
        targets.iter().map(Target::name).collect::<Vec<_>>().join(", ")
    );

    let dll_modules = dll_modules(&resolved.source);
    let common = tree::without_keys(&resolved.source, RESERVED_KEYS);

    let configs = targets
        .into_iter()
        .map(|target| {
            let base = target_defaults(target, &resolved.base_dir, defaults, &dll_modules);
            let section = resolved
                .source
                .get(target.name())
                .filter(|v| v.is_object());
            let layers = [Some(&base), Some(&common), section];
            let mut config = tree::layered(layers.into_iter().flatten()).map_err(|e| {
                CliError::Layer {
                    target,
                    message: e.to_string(),
                }
            })?;
            apply_build_option(&mut config, target, option);
            Ok(TargetConfig { target, config })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AssembledConfig::from_vec(configs))
}

/// Decide which targets to build, in a stable order.
pub fn select_targets(resolved: &ResolvedConfig, option: &BuildOption) -> Result<Vec<Target>> {
    if let Some(build_type) = option.build_type {
        return Ok(vec![build_type.into()]);
    }
    if resolved.framework.as_deref() == Some("dll") {
        return Ok(vec![Target::Dll]);
    }

    let declared = declared_targets(&resolved.source);
    let mut targets = Vec::new();

    if option.has_target_filter() {
        if option.only_dll {
            targets.push(Target::Dll);
        }
        let web: Vec<Target> = declared.iter().copied().filter(Target::is_web_side).collect();
        let node: Vec<Target> = declared.iter().copied().filter(Target::is_node_side).collect();
        for target in &declared {
            let wanted = (option.only_web && target.is_web_side())
                || (option.only_node && target.is_node_side());
            if wanted {
                targets.push(*target);
            }
        }
        if option.only_web && web.is_empty() {
            targets.push(Target::Client);
        }
        if option.only_node && node.is_empty() {
            targets.push(Target::Server);
        }
    } else {
        targets.extend(declared.into_iter().filter(|t| *t != Target::Dll));
    }

    if targets.is_empty() {
        if option.strict {
            return Err(CliError::UnresolvedTarget);
        }
        targets.push(Target::Client);
    }
    Ok(targets)
}

/// Targets named by the config's `type` key, deduplicated in declared order.
fn declared_targets(source: &Value) -> Vec<Target> {
    let names: Vec<&str> = match source.get("type") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    let mut targets = Vec::new();
    for name in names {
        match Target::parse(name) {
            Some(target) if !targets.contains(&target) => targets.push(target),
            Some(_) => {}
            None => tracing::warn!("Ignoring unknown target type '{name}'"),
        }
    }
    targets
}

/// Vendor modules listed under `dll` (array, or object of named bundles).
fn dll_modules(source: &Value) -> Option<Value> {
    match source.get("dll") {
        Some(Value::Array(items)) if !items.is_empty() => Some(json!({ "vendor": items })),
        Some(Value::String(name)) => Some(json!({ "vendor": [name] })),
        Some(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map.clone())),
        _ => None,
    }
}

fn target_defaults(
    target: Target,
    base_dir: &Path,
    defaults: &Defaults,
    dll_modules: &Option<Value>,
) -> Value {
    let dll_manifest = base_dir.join(&defaults.dll_manifest_file);
    let out = |dir: &str| base_dir.join(dir).to_string_lossy().into_owned();

    let mut config = match target {
        Target::Client => json!({
            "output": { "path": out("public"), "publicPath": "/public/", "filename": "js/[name].js" }
        }),
        Target::Server => json!({
            "output": { "path": out("app/view"), "filename": "[name].js", "libraryTarget": "commonjs2" },
            "devtool": false
        }),
        Target::Web => json!({
            "output": { "path": out("dist"), "publicPath": "/", "filename": "js/[name].js" }
        }),
        Target::Weex => json!({
            "output": { "path": out("dist/weex"), "publicPath": "/", "filename": "weex/[name].js" }
        }),
        Target::Node => json!({
            "output": { "path": out("dist/node"), "filename": "[name].js", "libraryTarget": "commonjs2" },
            "devtool": false
        }),
        Target::Dll => json!({
            "entry": dll_modules.clone().unwrap_or_else(|| json!({})),
            "output": { "path": out("public"), "publicPath": "/public/", "filename": "js/[name].dll.js", "library": "[name]_dll" },
            "dllManifest": dll_manifest.to_string_lossy(),
            "devtool": false
        }),
    };

    tree::set_path(&mut config, "target", json!(target.platform()));
    if target.is_web_side() && dll_modules.is_some() {
        tree::set_path(
            &mut config,
            "dllReference",
            json!({ "manifest": dll_manifest.to_string_lossy() }),
        );
    }
    config
}

/// Highest-precedence overrides coming from the command line.
fn apply_build_option(config: &mut Value, target: Target, option: &BuildOption) {
    if option.watch {
        tree::set_path(config, "watch", json!(true));
    }
    if option.hash_assets && (target.is_web_side() || target == Target::Dll) {
        let filename = if target == Target::Dll {
            "js/[name].[contenthash:8].dll.js"
        } else {
            "js/[name].[contenthash:8].js"
        };
        tree::set_path(config, "output/filename", json!(filename));
        tree::set_path(config, "output/chunkFilename", json!("js/chunk/[name].[contenthash:8].js"));
    }
    if option.compress {
        tree::set_path(config, "optimization/minimize", json!(true));
    }
    if let Some(devtool) = &option.devtool {
        tree::set_path(config, "devtool", json!(devtool));
    }
    if let (Some(port), true) = (option.port, target.is_web_side()) {
        tree::set_path(config, "devServer/port", json!(port));
    }
    if let Some(analyzer) = option.size_analyzer {
        tree::set_path(config, "analyzer", json!(analyzer.as_str()));
    }
}
