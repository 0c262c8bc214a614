use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::archive::{self, ArchiveFormat, ArchiveSpec, RuntimeBundle};
use crate::cli::ArchiveArgs;
use crate::defaults::Defaults;
use crate::installer::PackageManagerInstaller;

/// Build an [`ArchiveSpec`] from command-line arguments.
///
/// Relative `--source` and `--target` paths are taken from `base_dir`.
pub fn archive_spec(
    base_dir: &Path,
    args: &ArchiveArgs,
    format: ArchiveFormat,
    defaults: &Defaults,
) -> ArchiveSpec {
    let source_path = args
        .source
        .as_ref()
        .map(|p| base_dir.join(p))
        .unwrap_or_else(|| base_dir.to_path_buf());
    let target_path = args
        .target
        .as_ref()
        .map(|p| base_dir.join(p))
        .unwrap_or_else(|| defaults.archive_dir_in(base_dir));

    let filename = args.filename.clone().unwrap_or_else(|| {
        source_path
            .canonicalize()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
            .unwrap_or("archive")
            .to_string()
    });

    let bundle_runtime = if args.nodejs {
        Some(RuntimeBundle::Node)
    } else if args.alinode {
        Some(RuntimeBundle::Alinode)
    } else {
        None
    };

    ArchiveSpec {
        format,
        filename,
        source_path,
        target_path,
        install_dependencies: args.deps,
        package_manager: args
            .mode
            .clone()
            .unwrap_or_else(|| defaults.package_manager.clone()),
        registry: args.registry.clone(),
        bundle_runtime,
    }
}

pub fn execute_archive_pipeline(
    base_dir: &Path,
    args: &ArchiveArgs,
    format: ArchiveFormat,
    defaults: &Defaults,
) -> Result<()> {
    let spec = archive_spec(base_dir, args, format, defaults);
    println!(
        "{} Archiving {} -> {}",
        "[EASY]".green().bold(),
        spec.source_path.display(),
        spec.output_path().display()
    );

    let installer = PackageManagerInstaller;
    let output = match format {
        ArchiveFormat::Zip => archive::zip(&spec, &installer),
        ArchiveFormat::Tar => archive::tar(&spec, &installer),
    }
    .context("Archive packaging failed")?;

    println!("{} Archive created: {}", "[DONE]".green().bold(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_fill_missing_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("shop");
        std::fs::create_dir_all(&project).unwrap();

        let spec = archive_spec(
            &project,
            &ArchiveArgs::default(),
            ArchiveFormat::Zip,
            &Defaults::default(),
        );
        assert_eq!(spec.filename, "shop");
        assert_eq!(spec.source_path, project);
        assert_eq!(spec.target_path, project.join("dist"));
        assert_eq!(spec.package_manager, "npm");
        assert_eq!(spec.bundle_runtime, None);
        assert!(spec.output_path().ends_with("dist/shop.zip"));
    }

    #[test]
    fn explicit_arguments_win() {
        let args = ArchiveArgs {
            filename: Some("release".into()),
            source: Some(PathBuf::from("build")),
            target: Some(PathBuf::from("/tmp/out")),
            deps: true,
            mode: Some("tnpm".into()),
            registry: Some("https://r.example.com".into()),
            nodejs: false,
            alinode: true,
        };
        let spec = archive_spec(
            Path::new("/work/app"),
            &args,
            ArchiveFormat::Tar,
            &Defaults::default(),
        );
        assert_eq!(spec.source_path, Path::new("/work/app/build"));
        assert_eq!(spec.target_path, Path::new("/tmp/out"));
        assert!(spec.install_dependencies);
        assert_eq!(spec.package_manager, "tnpm");
        assert_eq!(spec.bundle_runtime, Some(RuntimeBundle::Alinode));
        assert_eq!(spec.output_path(), Path::new("/tmp/out/release.tar.gz"));
    }
}
