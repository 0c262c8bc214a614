use serde_json::Value;
use std::path::Path;

/// List dependencies declared in `package.json` that are not present in
/// `node_modules`.
///
/// Both `dependencies` and `devDependencies` are checked; the result is
/// sorted and free of duplicates. A project without a readable
/// `package.json` has nothing to install.
pub fn missing_dependencies(project_dir: &Path) -> Vec<String> {
    let package_json = project_dir.join("package.json");
    let Some(manifest) = std::fs::read_to_string(&package_json)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
    else {
        tracing::debug!("No readable package.json in {}", project_dir.display());
        return Vec::new();
    };

    let node_modules = project_dir.join("node_modules");
    let mut missing: Vec<String> = ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|section| manifest.get(section).and_then(Value::as_object))
        .flat_map(|deps| deps.keys())
        .filter(|name| !node_modules.join(name.as_str()).exists())
        .cloned()
        .collect();

    missing.sort();
    missing.dedup();
    missing
}
