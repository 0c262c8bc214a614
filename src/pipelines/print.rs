use anyhow::{Context, Result};
use colored::*;
use serde_json::Value;
use std::path::Path;

use crate::assembler::{self, AssembledConfig, Target};
use crate::cli::BuildFlags;
use crate::config::ResolveExtra;
use crate::defaults::Defaults;
use crate::installer::PackageManagerInstaller;
use crate::option::RawFlags;
use crate::tree;

use super::common::prepare;

/// Look up `path` in every assembled entry. Missing nodes yield `None`.
pub fn lookup_node<'a>(
    assembled: &'a AssembledConfig,
    path: &str,
) -> Vec<(Target, Option<&'a Value>)> {
    assembled
        .entries()
        .iter()
        .map(|entry| (entry.target, tree::get_path(&entry.config, path)))
        .collect()
}

/// Render the whole configuration, or one node of each entry.
pub fn render(assembled: &AssembledConfig, node_path: Option<&str>) -> Result<String> {
    let mut out = String::new();
    match (assembled, node_path) {
        (_, Some(path)) => {
            for (target, value) in lookup_node(assembled, path) {
                let body = match value {
                    Some(value) => serde_json::to_string_pretty(value)?,
                    None => "undefined".to_string(),
                };
                out.push_str(&format!(
                    "{}\n{}\n",
                    format!("easyweb: {} {} info:", target.name(), path).green(),
                    body
                ));
            }
        }
        (AssembledConfig::Single(entry), None) => {
            out.push_str(&format!(
                "{}\n{}\n",
                format!("easyweb: {} config info:", entry.target.name()).green(),
                serde_json::to_string_pretty(&entry.config)?
            ));
        }
        (AssembledConfig::Multiple(_), None) => {
            out.push_str(&format!(
                "{}\n{}\n",
                "easyweb: config info:".green(),
                serde_json::to_string_pretty(&assembled.to_value())?
            ));
        }
    }
    Ok(out)
}

pub fn execute_print_pipeline(
    base_dir: &Path,
    flags: &BuildFlags,
    env: Option<String>,
    node_path: Option<&str>,
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

    print!("{}", render(&assembled, node_path)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::TargetConfig;
    use serde_json::json;

    fn assembled() -> AssembledConfig {
        AssembledConfig::Multiple(vec![
            TargetConfig {
                target: Target::Client,
                config: json!({"plugins": ["html"], "module": {"rules": [{"test": "vue"}]}}),
            },
            TargetConfig {
                target: Target::Server,
                config: json!({"module": {"rules": []}}),
            },
        ])
    }

    #[test]
    fn plugins_lookup_returns_value_or_none_per_entry() {
        let assembled = assembled();
        let found = lookup_node(&assembled, "plugins");
        assert_eq!(
            found,
            vec![(Target::Client, Some(&json!(["html"]))), (Target::Server, None)]
        );
    }

    #[test]
    fn render_marks_missing_nodes_as_undefined() {
        colored::control::set_override(false);
        let text = render(&assembled(), Some("plugins")).unwrap();
        assert!(text.contains("easyweb: client plugins info:"));
        assert!(text.contains("undefined"));

        let text = render(&assembled(), Some("module/rules/0/test")).unwrap();
        assert!(text.contains("\"vue\""));
    }

    #[test]
    fn render_whole_config_as_array_for_multiple_targets() {
        colored::control::set_override(false);
        let text = render(&assembled(), None).unwrap();
        let json_start = text.find('[').unwrap();
        let value: Value = serde_json::from_str(text[json_start..].trim()).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
