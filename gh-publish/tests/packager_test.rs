use gh_publish::cli::{PublishConfig, Visibility};
use gh_publish::packager::{archive_path, create_zip, package_directory};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tempfile::tempdir;

fn config_for(dir: &Path, tag: &str) -> PublishConfig {
    PublishConfig {
        dir: dir.to_path_buf(),
        owner: "owner".to_string(),
        name: "packager-test".to_string(),
        branch: "main".to_string(),
        remote: "origin".to_string(),
        visibility: Visibility::Private,
        tag: tag.to_string(),
        message: format!("Release {tag}"),
        zip: true,
        force_push: false,
        github_token: None,
        github_user: "x-access-token".to_string(),
        api_url: "https://api.github.com".to_string(),
    }
}

fn read_entry(archive: &Path, name: &str) -> String {
    let mut reader = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = reader.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

#[test]
fn test_zip_includes_hidden_entries() {
    let src = tempdir().unwrap();
    let out = tempdir().unwrap();

    fs::write(src.path().join("README.md"), "readme").unwrap();
    fs::write(src.path().join(".env"), "SECRET=1").unwrap();
    fs::create_dir_all(src.path().join(".config")).unwrap();
    fs::write(src.path().join(".config/settings.toml"), "a = 1").unwrap();
    fs::create_dir_all(src.path().join("src/nested")).unwrap();
    fs::write(src.path().join("src/nested/lib.rs"), "fn f() {}").unwrap();

    let archive = out.path().join("bundle.zip");
    create_zip(src.path(), &archive).unwrap();

    let reader = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let names: Vec<String> = reader.file_names().map(str::to_string).collect();
    for expected in [
        "README.md",
        ".env",
        ".config/settings.toml",
        "src/nested/lib.rs",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}: {names:?}");
    }
    assert!(names.iter().any(|n| n.trim_end_matches('/') == ".config"));

    assert_eq!(read_entry(&archive, ".env"), "SECRET=1");
    assert_eq!(read_entry(&archive, "src/nested/lib.rs"), "fn f() {}");
}

#[test]
fn test_zip_includes_git_metadata() {
    let src = tempdir().unwrap();
    let out = tempdir().unwrap();
    git2::Repository::init(src.path()).unwrap();
    fs::write(src.path().join("file.txt"), "x").unwrap();

    let archive = out.path().join("with-git.zip");
    create_zip(src.path(), &archive).unwrap();

    let reader = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    assert!(reader.file_names().any(|n| n == ".git/HEAD"));
    assert!(reader.file_names().any(|n| n == "file.txt"));
}

#[test]
fn test_package_directory_uses_fixed_temp_path() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("index.html"), "<html></html>").unwrap();
    let tag = format!("v-test-{}", std::process::id());
    let config = config_for(src.path(), &tag);

    let archive = package_directory(&config).unwrap();

    assert_eq!(archive, archive_path(&config));
    assert_eq!(
        archive.file_name().unwrap().to_string_lossy(),
        format!("packager-test-{tag}.zip")
    );
    assert_eq!(read_entry(&archive, "index.html"), "<html></html>");

    fs::remove_file(&archive).unwrap();
}

#[cfg(unix)]
#[test]
fn test_zip_keeps_unix_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempdir().unwrap();
    let out = tempdir().unwrap();
    let script = src.path().join("run.sh");
    fs::write(&script, "#!/bin/sh\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let archive = out.path().join("perms.zip");
    create_zip(src.path(), &archive).unwrap();

    let mut reader = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let entry = reader.by_name("run.sh").unwrap();
    assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o755);
}
