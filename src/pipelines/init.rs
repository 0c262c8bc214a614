use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::templates;

/// Scaffold a project into `project_dir`.
///
/// Existing files are never overwritten; scaffolding into a directory that
/// already holds a `package.json` or `webpack.config.json` is an error.
pub fn execute_init_pipeline(project_dir: &Path, registry: Option<&str>) -> Result<()> {
    let name = project_dir
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(project_dir)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("app")
        .to_string();

    for existing in ["package.json", "webpack.config.json"] {
        if project_dir.join(existing).exists() {
            anyhow::bail!(
                "Refusing to overwrite existing {} in {}",
                existing,
                project_dir.display()
            );
        }
    }

    let src_dir = project_dir.join("src");
    std::fs::create_dir_all(&src_dir)
        .with_context(|| format!("Failed to create {}", src_dir.display()))?;

    std::fs::write(
        project_dir.join("package.json"),
        templates::package_json(&name),
    )?;
    std::fs::write(
        project_dir.join("webpack.config.json"),
        templates::webpack_config_json(),
    )?;
    std::fs::write(src_dir.join("index.js"), templates::index_js(&name))?;
    if let Some(registry) = registry {
        std::fs::write(project_dir.join(".npmrc"), templates::npmrc(registry))?;
    }

    println!(
        "{} Project initialized at: {}",
        "[DONE]".green().bold(),
        project_dir.display()
    );

    Ok(())
}
