use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

use crate::cli::PublishConfig;
use crate::error::{PublishError, Result};

const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// `<tmp>/<repo>-<tag>.zip`
pub fn archive_path(config: &PublishConfig) -> PathBuf {
    // Tags like `release/1.0` must not turn into subdirectories
    let tag = config.tag.replace(['/', '\\'], "-");
    std::env::temp_dir().join(format!("{}-{}.zip", config.name, tag))
}

/// Zip the whole code directory, hidden entries included
pub fn package_directory(config: &PublishConfig) -> Result<PathBuf> {
    let path = archive_path(config);
    create_zip(&config.dir, &path)?;
    Ok(path)
}

/// Write every entry under `src_dir` into a zip at `archive_path`
pub fn create_zip(src_dir: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(file);

    let base_options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut count = 0usize;
    for entry in WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if path == archive_path {
            continue;
        }

        let name = entry_name(src_dir, path)?;
        let metadata = entry.path().symlink_metadata()?;
        let options = with_permissions(base_options, &metadata);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(path)?;
            zip.add_symlink(name, target.to_string_lossy().into_owned(), options)?;
        } else if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            let options = options.large_file(metadata.len() >= ZIP64_THRESHOLD);
            zip.start_file(name, options)?;
            let mut source = File::open(path)?;
            io::copy(&mut source, &mut zip)?;
        }
        count += 1;
    }

    zip.finish()?;
    tracing::info!(
        "Created archive: {} ({} entries)",
        archive_path.display(),
        count
    );
    Ok(())
}

/// Forward-slash path relative to the archive root
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        PublishError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is outside {}", path.display(), root.display()),
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn with_permissions(options: SimpleFileOptions, metadata: &fs::Metadata) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;
    options.unix_permissions(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn with_permissions(options: SimpleFileOptions, _metadata: &fs::Metadata) -> SimpleFileOptions {
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_archive_path_naming() {
        let dir = tempdir().unwrap();
        let config = PublishConfig::for_test(dir.path());
        let path = archive_path(&config);
        assert_eq!(path.file_name().unwrap(), "project-v1.0.0.zip");
        assert_eq!(path.parent().unwrap(), std::env::temp_dir());
    }

    #[test]
    fn test_archive_path_flattens_slashed_tag() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let mut config = PublishConfig::for_test(dir.path());
        config.tag = format!("release/{}", std::process::id());

        let path = archive_path(&config);
        assert_eq!(path.parent().unwrap(), std::env::temp_dir());
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("project-release-{}.zip", std::process::id())
        );

        let packaged = package_directory(&config).unwrap();
        assert!(packaged.is_file());
        fs::remove_file(packaged).unwrap();
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let root = Path::new("/work/project");
        let name = entry_name(root, &root.join("src").join("main.rs")).unwrap();
        assert_eq!(name, "src/main.rs");
        assert!(entry_name(root, Path::new("/elsewhere/file")).is_err());
    }

    #[test]
    fn test_archive_skips_itself() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let archive = dir.path().join("self.zip");

        create_zip(dir.path(), &archive).unwrap();

        let reader = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<&str> = reader.file_names().collect();
        assert_eq!(names, vec!["a.txt"]);
    }
}
