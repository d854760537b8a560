use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{HostingBackend, RepoStatus};
use crate::cli::PublishConfig;
use crate::error::{PublishError, Result};
use crate::process;

/// Backend driving the authenticated `gh` CLI
pub struct GhCli {
    dir: PathBuf,
}

impl GhCli {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// `gh` is on PATH and `gh auth status` succeeds
    pub async fn is_authenticated(dir: &Path) -> bool {
        if !process::tool_available("gh") {
            return false;
        }
        match process::output("gh", &["auth", "status"], dir).await {
            Ok(result) => result.success(),
            Err(e) => {
                tracing::debug!("gh auth status failed: {}", e);
                false
            }
        }
    }

    async fn repo_exists(&self, full_name: &str) -> Result<bool> {
        let result =
            process::output("gh", &["repo", "view", full_name, "--json", "name"], &self.dir)
                .await?;
        Ok(result.success())
    }
}

#[async_trait]
impl HostingBackend for GhCli {
    fn name(&self) -> &'static str {
        "gh"
    }

    async fn ensure_repository(&self, config: &PublishConfig) -> Result<RepoStatus> {
        let full_name = config.full_name();
        if self.repo_exists(&full_name).await? {
            tracing::info!("Repository {} already exists", full_name);
            return Ok(RepoStatus::Existing);
        }

        tracing::info!("Creating {} repository {}", config.visibility, full_name);
        let source = config.dir.to_string_lossy();
        let created = process::run(
            "gh",
            &[
                "repo",
                "create",
                full_name.as_str(),
                config.visibility.as_flag(),
                "--source",
                &*source,
                "--disable-issues",
                "--disable-wiki",
            ],
            &self.dir,
        )
        .await;

        let Err(e) = created else {
            return Ok(RepoStatus::Created);
        };

        // gh exits non-zero when the repository was created but `origin` was already configured
        if self.repo_exists(&full_name).await? {
            tracing::warn!("gh reported an error after creating {}: {}", full_name, e);
            return Ok(RepoStatus::Created);
        }
        Err(PublishError::RepoCreation(e.to_string()))
    }

    async fn release_exists(&self, config: &PublishConfig) -> Result<bool> {
        let full_name = config.full_name();
        let result = process::output(
            "gh",
            &[
                "release",
                "view",
                config.tag.as_str(),
                "--repo",
                full_name.as_str(),
                "--json",
                "tagName",
            ],
            &self.dir,
        )
        .await?;
        Ok(result.success())
    }

    async fn create_release(&self, config: &PublishConfig, asset: Option<&Path>) -> Result<()> {
        let full_name = config.full_name();
        let asset_arg = asset.map(|p| p.to_string_lossy().into_owned());

        let mut args = vec!["release", "create", config.tag.as_str()];
        if let Some(asset) = &asset_arg {
            args.push(asset.as_str());
        }
        args.extend_from_slice(&[
            "--repo",
            full_name.as_str(),
            "--title",
            config.tag.as_str(),
            "--notes",
            config.message.as_str(),
        ]);

        tracing::info!("Creating release {} via gh", config.tag);
        process::run("gh", &args, &self.dir)
            .await
            .map_err(|e| PublishError::ReleaseCreation(e.to_string()))?;
        Ok(())
    }
}
