//! Thin wrapper around the version-control collaborator.
//!
//! Read-only lookups and remote configuration go through `git2`. Anything that
//! touches the working tree, the network or credentials shells out to `git` so
//! the user's helpers and SSH agent apply.

use git2::{BranchType, ErrorCode, Repository, RepositoryInitOptions};
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};
use crate::process::{self, CommandOutput};

pub struct Git {
    dir: PathBuf,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the directory itself holds repository metadata
    pub fn is_repository(&self) -> bool {
        Repository::open(&self.dir).is_ok()
    }

    /// Create a repository whose unborn HEAD points at `branch`
    pub fn init(&self, branch: &str) -> Result<()> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(branch);
        Repository::init_opts(&self.dir, &opts)?;
        Ok(())
    }

    fn open(&self) -> Result<Repository> {
        Ok(Repository::open(&self.dir)?)
    }

    pub fn local_branch_exists(&self, branch: &str) -> Result<bool> {
        let repo = self.open()?;
        let exists = repo.find_branch(branch, BranchType::Local).is_ok();
        Ok(exists)
    }

    /// Branch HEAD points at, even when that branch has no commits yet
    pub fn head_branch(&self) -> Result<Option<String>> {
        let repo = self.open()?;
        let head = repo.find_reference("HEAD")?;
        Ok(head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(str::to_string))
    }

    pub fn local_tag_exists(&self, tag: &str) -> Result<bool> {
        let repo = self.open()?;
        let exists = repo.find_reference(&format!("refs/tags/{tag}")).is_ok();
        Ok(exists)
    }

    pub fn remote_tracking_exists(&self, remote: &str, branch: &str) -> Result<bool> {
        let repo = self.open()?;
        let exists = repo
            .find_reference(&format!("refs/remotes/{remote}/{branch}"))
            .is_ok();
        Ok(exists)
    }

    /// URL of a configured remote, or `None` if the remote is not configured
    pub fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        let repo = self.open()?;
        let url = match repo.find_remote(remote) {
            Ok(found) => found.url().map(str::to_string),
            Err(e) if e.code() == ErrorCode::NotFound => None,
            Err(e) if e.code() == ErrorCode::InvalidSpec => None,
            Err(e) => return Err(e.into()),
        };
        Ok(url)
    }

    pub fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
        let repo = self.open()?;
        repo.remote(remote, url)?;
        Ok(())
    }

    pub fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
        let repo = self.open()?;
        repo.remote_set_url(remote, url)?;
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        process::run("git", args, &self.dir).await
    }

    async fn output(&self, args: &[&str]) -> Result<CommandOutput> {
        process::output("git", args, &self.dir).await
    }

    pub async fn checkout(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", branch]).await?;
        Ok(())
    }

    pub async fn checkout_new(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch]).await?;
        Ok(())
    }

    /// Stage additions, modifications and deletions
    pub async fn add_all(&self) -> Result<()> {
        self.run(&["add", "-A"]).await?;
        Ok(())
    }

    pub async fn has_staged_changes(&self) -> Result<bool> {
        let result = self.output(&["diff", "--cached", "--quiet"]).await?;
        match result.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(PublishError::CommandFailed {
                program: "git".to_string(),
                args: "diff --cached --quiet".to_string(),
                status: result.status.to_string(),
                stderr: result.stderr.trim().to_string(),
            }),
        }
    }

    pub async fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message]).await?;
        Ok(())
    }

    /// `git ls-remote`; an unreachable remote reads as having no refs
    async fn ls_remote(&self, args: &[&str]) -> Result<String> {
        let mut full = vec!["ls-remote"];
        full.extend_from_slice(args);
        let result = self.output(&full).await?;
        if !result.success() {
            tracing::debug!("ls-remote failed, treating remote as empty");
            return Ok(String::new());
        }
        Ok(result.stdout)
    }

    pub async fn remote_has_branch(&self, remote: &str, branch: &str) -> Result<bool> {
        let refname = format!("refs/heads/{branch}");
        let out = self.ls_remote(&["--heads", remote, &refname]).await?;
        Ok(!out.trim().is_empty())
    }

    pub async fn remote_has_refs(&self, remote: &str) -> Result<bool> {
        let out = self.ls_remote(&[remote]).await?;
        Ok(!out.trim().is_empty())
    }

    pub async fn remote_tag_exists(&self, remote: &str, tag: &str) -> Result<bool> {
        let refname = format!("refs/tags/{tag}");
        let out = self.ls_remote(&["--tags", remote, &refname]).await?;
        Ok(!out.trim().is_empty())
    }

    /// Default branch advertised by the remote's HEAD symref
    pub async fn remote_default_branch(&self, remote: &str) -> Result<Option<String>> {
        let out = self.ls_remote(&["--symref", remote, "HEAD"]).await?;
        Ok(parse_symref_head(&out))
    }

    /// Fetch from a remote; the caller decides whether failure matters
    pub async fn fetch(&self, remote: &str, branch: Option<&str>) -> Result<bool> {
        let mut args = vec!["fetch", remote];
        if let Some(branch) = branch {
            args.push(branch);
        }
        Ok(self.output(&args).await?.success())
    }

    pub async fn pull_rebase_unrelated(&self, remote: &str, branch: &str) -> Result<bool> {
        let result = self
            .output(&[
                "pull",
                "--rebase",
                "--allow-unrelated-histories",
                remote,
                branch,
            ])
            .await?;
        if !result.success() {
            self.abort_rebase().await;
        }
        Ok(result.success())
    }

    pub async fn rebase_onto(&self, upstream: &str) -> Result<bool> {
        let result = self.output(&["rebase", upstream]).await?;
        if !result.success() {
            self.abort_rebase().await;
        }
        Ok(result.success())
    }

    async fn abort_rebase(&self) {
        if self.dir.join(".git").join("rebase-merge").exists()
            || self.dir.join(".git").join("rebase-apply").exists()
        {
            if let Err(e) = self.output(&["rebase", "--abort"]).await {
                tracing::warn!("Failed to abort rebase: {}", e);
            }
        }
    }

    pub async fn push_branch(
        &self,
        remote: &str,
        branch: &str,
        set_upstream: bool,
        force: bool,
    ) -> Result<()> {
        let mut args = vec!["push"];
        if set_upstream {
            args.push("-u");
        }
        if force {
            args.push("--force-with-lease");
        }
        args.push(remote);
        args.push(branch);
        self.run(&args).await?;
        Ok(())
    }

    pub async fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()> {
        self.run(&["tag", "-a", tag, "-m", message]).await?;
        Ok(())
    }

    pub async fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        let refspec = format!("refs/tags/{tag}");
        self.run(&["push", remote, &refspec]).await?;
        Ok(())
    }
}

/// Extract the branch from `ref: refs/heads/<branch>\tHEAD`
fn parse_symref_head(ls_remote: &str) -> Option<String> {
    ls_remote.lines().find_map(|line| {
        let rest = line.strip_prefix("ref:")?.trim_start();
        let (target, name) = rest.split_once('\t')?;
        if name.trim() != "HEAD" {
            return None;
        }
        target.strip_prefix("refs/heads/").map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_symref_head() {
        let out = "ref: refs/heads/trunk\tHEAD\n3f2a9c1e\tHEAD\n";
        assert_eq!(parse_symref_head(out), Some("trunk".to_string()));
        assert_eq!(parse_symref_head(""), None);
        assert_eq!(parse_symref_head("3f2a9c1e\tHEAD\n"), None);
    }

    #[test]
    fn test_init_sets_unborn_head() {
        let dir = tempdir().unwrap();
        let git = Git::new(dir.path());
        assert!(!git.is_repository());

        git.init("release").unwrap();

        assert!(git.is_repository());
        assert_eq!(git.head_branch().unwrap(), Some("release".to_string()));
        assert!(!git.local_branch_exists("release").unwrap());
    }

    #[test]
    fn test_remote_url_roundtrip() {
        let dir = tempdir().unwrap();
        let git = Git::new(dir.path());
        git.init("main").unwrap();

        assert_eq!(git.remote_url("origin").unwrap(), None);

        git.add_remote("origin", "https://github.com/o/r.git").unwrap();
        assert_eq!(
            git.remote_url("origin").unwrap().as_deref(),
            Some("https://github.com/o/r.git")
        );

        git.set_remote_url("origin", "git@github.com:o/r.git").unwrap();
        assert_eq!(
            git.remote_url("origin").unwrap().as_deref(),
            Some("git@github.com:o/r.git")
        );
    }

    #[test]
    fn test_local_tag_lookup() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, "Initial", &tree, &[])
            .unwrap();
        let commit = repo.find_object(oid, None).unwrap();
        repo.tag("v1.0.0", &commit, &sig, "Release v1.0.0", false)
            .unwrap();

        let git = Git::new(dir.path());
        assert!(git.local_tag_exists("v1.0.0").unwrap());
        assert!(!git.local_tag_exists("v2.0.0").unwrap());
    }
}
