use std::path::{Path, PathBuf};

/// Process-wide constants handed to every pipeline.
///
/// Nothing reads these from module globals; callers build a `Defaults`
/// (usually `Defaults::default()`) and pass it down.
#[derive(Debug, Clone)]
pub struct Defaults {
    /// Dev server port when `--port` is absent.
    pub port: u16,
    /// Ports released by `kill` without an argument.
    pub kill_ports: Vec<u16>,
    /// Archive output directory, relative to the project root.
    pub archive_dir: PathBuf,
    /// Compile cache (generated bundler configs), relative to the project root.
    pub cache_dir: PathBuf,
    /// Build output directories removed by `clean all`.
    pub build_dirs: Vec<PathBuf>,
    pub manifest_file: PathBuf,
    pub dll_manifest_file: PathBuf,
    /// Config file names probed in order during implicit discovery.
    pub config_files: Vec<&'static str>,
    pub package_manager: String,
    pub bundler_command: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: 7001,
            kill_ports: vec![7001, 9000, 9001],
            archive_dir: PathBuf::from("dist"),
            cache_dir: PathBuf::from(".cache/easyweb"),
            build_dirs: vec![
                PathBuf::from("public"),
                PathBuf::from("app/view"),
                PathBuf::from("dist"),
            ],
            manifest_file: PathBuf::from("config/manifest.json"),
            dll_manifest_file: PathBuf::from("config/manifest-dll.json"),
            config_files: vec!["webpack.config.json", "webpack.config.toml"],
            package_manager: "npm".to_string(),
            bundler_command: "npx webpack".to_string(),
        }
    }
}

impl Defaults {
    pub fn cache_dir_in(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.cache_dir)
    }

    pub fn archive_dir_in(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.archive_dir)
    }

    /// Comma-separated port list, as accepted by `kill`.
    pub fn kill_ports_arg(&self) -> String {
        self.kill_ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
