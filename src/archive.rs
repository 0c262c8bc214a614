//! Archive packaging: zip or gzip-compressed tar of a project tree.
//!
//! Dependencies and an optional runtime are installed into the source tree
//! before anything is written, so the archive runs without a later install.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ArchiveError, CliError, Result};
use crate::installer::{InstallRequest, Installer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::Tar => ".tar.gz",
        }
    }
}

/// Runtime staged into `node_modules/` next to the dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeBundle {
    Node,
    Alinode,
}

impl RuntimeBundle {
    pub fn package(&self) -> &'static str {
        match self {
            RuntimeBundle::Node => "node",
            RuntimeBundle::Alinode => "alinode",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveSpec {
    pub format: ArchiveFormat,
    pub filename: String,
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub install_dependencies: bool,
    pub package_manager: String,
    pub registry: Option<String>,
    pub bundle_runtime: Option<RuntimeBundle>,
}

impl ArchiveSpec {
    /// Final archive path, with the format extension appended when missing.
    pub fn output_path(&self) -> PathBuf {
        let ext = self.format.extension();
        let name = if self.filename.ends_with(ext)
            || (self.format == ArchiveFormat::Tar
                && (self.filename.ends_with(".tar") || self.filename.ends_with(".tgz")))
        {
            self.filename.clone()
        } else {
            format!("{}{ext}", self.filename)
        };
        self.target_path.join(name)
    }
}

pub fn zip(spec: &ArchiveSpec, installer: &dyn Installer) -> Result<PathBuf> {
    archive(
        &ArchiveSpec {
            format: ArchiveFormat::Zip,
            ..spec.clone()
        },
        installer,
    )
}

pub fn tar(spec: &ArchiveSpec, installer: &dyn Installer) -> Result<PathBuf> {
    archive(
        &ArchiveSpec {
            format: ArchiveFormat::Tar,
            ..spec.clone()
        },
        installer,
    )
}

/// Package `spec.source_path` into `spec.output_path()`.
///
/// Install failures abort before the target directory is touched. A write
/// failure removes the partial file, so either a complete archive exists
/// or none does.
pub fn archive(spec: &ArchiveSpec, installer: &dyn Installer) -> Result<PathBuf> {
    if !spec.source_path.is_dir() {
        return Err(ArchiveError::SourceMissing(spec.source_path.clone()).into());
    }

    if spec.install_dependencies {
        tracing::info!(
            "Installing production dependencies with {}",
            spec.package_manager
        );
        installer.install(&InstallRequest {
            package_manager: &spec.package_manager,
            registry: spec.registry.as_deref(),
            cwd: &spec.source_path,
            packages: &[],
            production: true,
        })?;
    }

    if let Some(runtime) = spec.bundle_runtime {
        tracing::info!("Staging runtime '{}' into node_modules", runtime.package());
        installer.install(&InstallRequest {
            package_manager: &spec.package_manager,
            registry: spec.registry.as_deref(),
            cwd: &spec.source_path,
            packages: &[runtime.package().to_string()],
            production: true,
        })?;
    }

    fs::create_dir_all(&spec.target_path).map_err(|source| ArchiveError::TargetNotWritable {
        path: spec.target_path.clone(),
        source,
    })?;

    let output = spec.output_path();
    let partial = PathBuf::from(format!("{}.partial", output.display()));
    let skip = [output.clone(), partial.clone()];

    let written = match spec.format {
        ArchiveFormat::Zip => write_zip(&spec.source_path, &partial, &skip),
        ArchiveFormat::Tar => write_tar(&spec.source_path, &partial, &skip),
    }
    .and_then(|()| {
        fs::rename(&partial, &output).map_err(|source| {
            ArchiveError::Write {
                path: output.clone(),
                source,
            }
            .into()
        })
    });

    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    tracing::info!("Archive written to {}", output.display());
    Ok(output)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Symlink,
}

/// One walked path and its name inside the archive (`/` separators).
#[derive(Debug)]
struct Entry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
}

/// Entries under `root`, sorted by name. Symlinks are kept as links, not
/// followed, so relative links inside `node_modules/.bin` stay valid.
fn collect_entries(root: &Path, skip: &[PathBuf]) -> Result<Vec<Entry>> {
    let canonical_skip: Vec<PathBuf> = skip
        .iter()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
        .collect();

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchiveError::Write {
            path: root.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(path);
        if rel.as_os_str().is_empty() {
            continue;
        }

        let file_type = entry.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        let skipped = skip.iter().any(|s| s == path)
            || (kind != EntryKind::Symlink
                && path
                    .canonicalize()
                    .is_ok_and(|canonical| canonical_skip.contains(&canonical)));
        if skipped {
            continue;
        }

        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(Entry {
            path: path.to_path_buf(),
            name,
            kind,
        });
    }
    Ok(entries)
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::symlink_metadata(path)
        .ok()
        .map(|metadata| metadata.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_: &Path) -> Option<u32> {
    None
}

/// Deflate options carrying the entry's permission bits where the OS has them.
fn zip_options(path: &Path) -> SimpleFileOptions {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    match unix_mode(path) {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}

fn write_error(path: &Path) -> impl Fn(io::Error) -> CliError + '_ {
    move |source| {
        ArchiveError::Write {
            path: path.to_path_buf(),
            source,
        }
        .into()
    }
}

fn write_zip(root: &Path, out: &Path, skip: &[PathBuf]) -> Result<()> {
    let entries = collect_entries(root, skip)?;
    let file = File::create(out).map_err(write_error(out))?;
    let mut writer = ZipWriter::new(file);

    for entry in entries {
        let options = zip_options(&entry.path);
        match entry.kind {
            EntryKind::Dir => {
                writer
                    .add_directory(format!("{}/", entry.name), options)
                    .map_err(ArchiveError::from)?;
            }
            EntryKind::Symlink => {
                let link = fs::read_link(&entry.path).map_err(write_error(&entry.path))?;
                writer
                    .add_symlink(entry.name, link.to_string_lossy().into_owned(), options)
                    .map_err(ArchiveError::from)?;
            }
            EntryKind::File => {
                writer
                    .start_file(entry.name, options)
                    .map_err(ArchiveError::from)?;
                let mut input = File::open(&entry.path).map_err(write_error(&entry.path))?;
                io::copy(&mut input, &mut writer).map_err(write_error(out))?;
            }
        }
    }

    writer.finish().map_err(ArchiveError::from)?;
    Ok(())
}

fn write_tar(root: &Path, out: &Path, skip: &[PathBuf]) -> Result<()> {
    let entries = collect_entries(root, skip)?;
    let file = File::create(out).map_err(write_error(out))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);

    for entry in entries {
        match entry.kind {
            EntryKind::Dir => builder
                .append_dir(&entry.name, &entry.path)
                .map_err(write_error(&entry.path))?,
            EntryKind::File | EntryKind::Symlink => builder
                .append_path_with_name(&entry.path, &entry.name)
                .map_err(write_error(&entry.path))?,
        }
    }

    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .map_err(write_error(out))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallError;
    use std::cell::RefCell;
    use std::io::Read;

    #[derive(Default)]
    struct FakeInstaller {
        packages: RefCell<Vec<Vec<String>>>,
    }

    impl Installer for FakeInstaller {
        fn install(&self, request: &InstallRequest<'_>) -> std::result::Result<(), InstallError> {
            self.packages.borrow_mut().push(request.packages.to_vec());
            for package in request.packages {
                fs::create_dir_all(request.cwd.join("node_modules").join(package)).unwrap();
            }
            Ok(())
        }

        fn upgrade(&self, _: &str, _: &Path) -> std::result::Result<(), InstallError> {
            Ok(())
        }
    }

    fn spec(source: &Path, target: &Path, format: ArchiveFormat) -> ArchiveSpec {
        ArchiveSpec {
            format,
            filename: "app".into(),
            source_path: source.to_path_buf(),
            target_path: target.to_path_buf(),
            install_dependencies: false,
            package_manager: "npm".into(),
            registry: None,
            bundle_runtime: None,
        }
    }

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), b"alpha").unwrap();
        fs::write(root.join("sub/b.txt"), b"bravo\n").unwrap();
    }

    #[test]
    fn tar_preserves_relative_paths_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);

        let out = tar(
            &spec(&source, &dir.path().join("out"), ArchiveFormat::Tar),
            &FakeInstaller::default(),
        )
        .unwrap();
        assert!(out.ends_with("app.tar.gz"));

        let decoder = flate2::read::GzDecoder::new(File::open(&out).unwrap());
        let mut archive = ::tar::Archive::new(decoder);
        let mut files = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.header().entry_type().is_file() {
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                files.push((entry.path().unwrap().to_string_lossy().into_owned(), content));
            }
        }
        assert_eq!(
            files,
            vec![
                ("a.txt".to_string(), b"alpha".to_vec()),
                ("sub/b.txt".to_string(), b"bravo\n".to_vec()),
            ]
        );
    }

    #[test]
    fn archive_inside_source_does_not_include_itself() {
        let dir = tempfile::tempdir().unwrap();
        sample_tree(dir.path());

        let out = zip(
            &spec(dir.path(), &dir.path().join("dist"), ArchiveFormat::Zip),
            &FakeInstaller::default(),
        )
        .unwrap();
        let archive = ::zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(!names.iter().any(|n| n.ends_with(".zip") || n.ends_with(".partial")));
        assert!(names.contains(&"sub/b.txt"));
    }

    #[test]
    fn runtime_is_staged_before_packaging() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);
        let installer = FakeInstaller::default();

        let mut request = spec(&source, &dir.path().join("out"), ArchiveFormat::Zip);
        request.install_dependencies = true;
        request.bundle_runtime = Some(RuntimeBundle::Alinode);
        let out = archive(&request, &installer).unwrap();

        assert_eq!(
            installer.packages.borrow().as_slice(),
            &[vec![], vec!["alinode".to_string()]]
        );
        let archive = ::zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        assert!(archive.file_names().any(|n| n == "node_modules/alinode/"));
    }

    #[cfg(unix)]
    fn runnable_tree(root: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::create_dir_all(root.join("node_modules/node/bin")).unwrap();
        let binary = root.join("node_modules/node/bin/node");
        fs::write(&binary, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
        fs::create_dir_all(root.join("node_modules/.bin")).unwrap();
        std::os::unix::fs::symlink("../node/bin/node", root.join("node_modules/.bin/node"))
            .unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn zip_keeps_executable_bits_and_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        runnable_tree(&source);

        let out = zip(
            &spec(&source, &dir.path().join("out"), ArchiveFormat::Zip),
            &FakeInstaller::default(),
        )
        .unwrap();
        let mut archive = ::zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();

        let mode = archive
            .by_name("node_modules/node/bin/node")
            .unwrap()
            .unix_mode()
            .unwrap();
        assert_eq!(mode & 0o777, 0o755);

        let mut link = archive.by_name("node_modules/.bin/node").unwrap();
        assert_eq!(link.unix_mode().unwrap() & 0o170000, 0o120000);
        let mut target = String::new();
        link.read_to_string(&mut target).unwrap();
        assert_eq!(target, "../node/bin/node");
    }

    #[cfg(unix)]
    #[test]
    fn tar_keeps_executable_bits_and_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        runnable_tree(&source);

        let out = tar(
            &spec(&source, &dir.path().join("out"), ArchiveFormat::Tar),
            &FakeInstaller::default(),
        )
        .unwrap();
        let decoder = flate2::read::GzDecoder::new(File::open(&out).unwrap());
        let mut archive = ::tar::Archive::new(decoder);

        let mut seen_binary = false;
        let mut seen_link = false;
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            let path = entry.path().unwrap().into_owned();
            if path == Path::new("node_modules/node/bin/node") {
                assert_eq!(entry.header().mode().unwrap() & 0o777, 0o755);
                seen_binary = true;
            }
            if path == Path::new("node_modules/.bin/node") {
                assert!(entry.header().entry_type().is_symlink());
                assert_eq!(
                    entry.link_name().unwrap().unwrap(),
                    Path::new("../node/bin/node")
                );
                seen_link = true;
            }
        }
        assert!(seen_binary && seen_link);
    }

    #[test]
    fn missing_source_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = archive(
            &spec(&dir.path().join("nope"), dir.path(), ArchiveFormat::Tar),
            &FakeInstaller::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Archive(ArchiveError::SourceMissing(_))));
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_target_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        sample_tree(dir.path());
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a dir").unwrap();

        let err = archive(
            &spec(dir.path(), &blocker.join("out"), ArchiveFormat::Zip),
            &FakeInstaller::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CliError::Archive(ArchiveError::TargetNotWritable { .. })
        ));
    }

    #[test]
    fn output_path_keeps_existing_extension() {
        let mut s = spec(Path::new("."), Path::new("out"), ArchiveFormat::Tar);
        s.filename = "release.tgz".into();
        assert_eq!(s.output_path(), Path::new("out/release.tgz"));
        s.format = ArchiveFormat::Zip;
        s.filename = "release".into();
        assert_eq!(s.output_path(), Path::new("out/release.zip"));
    }
}
