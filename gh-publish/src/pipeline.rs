use std::path::PathBuf;

use crate::cli::PublishConfig;
use crate::commit::commit_pending;
use crate::error::Result;
use crate::git::Git;
use crate::github::{select_backend, HostingBackend, RepoStatus};
use crate::init::{InitOutcome, Initializer};
use crate::packager;
use crate::process;
use crate::push::{Publisher, TagOutcome};
use crate::remote::{self, RemoteAction, RemoteTarget};

/// Transient state gathered over one run
#[derive(Debug, Clone)]
pub struct PublishState {
    pub init: InitOutcome,
    pub committed: bool,
    pub repository: RepoStatus,
    pub remote: RemoteAction,
    pub first_push: bool,
    pub tag: TagOutcome,
    pub asset: Option<PathBuf>,
    /// False when a release for the tag was already published
    pub released: bool,
}

/// Runs the publish stages in order, stopping at the first fatal error
pub struct Pipeline {
    config: PublishConfig,
    git: Git,
    backend: Box<dyn HostingBackend>,
    home: Option<PathBuf>,
}

impl Pipeline {
    /// Check preconditions and probe for a hosting backend
    pub async fn new(config: PublishConfig) -> Result<Self> {
        process::require_tool("git")?;
        let backend = select_backend(&config).await?;
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: PublishConfig, backend: Box<dyn HostingBackend>) -> Self {
        let git = Git::new(&config.dir);
        Self {
            config,
            git,
            backend,
            home: remote::home_dir(),
        }
    }

    /// Override where credentials and SSH keys are looked up
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub async fn run(&self) -> Result<PublishState> {
        let config = &self.config;
        tracing::info!(
            "Publishing {} as {} ({}, branch {}, backend {})",
            config.dir.display(),
            config.full_name(),
            config.tag,
            config.branch,
            self.backend.name()
        );

        let init = Initializer::new(&self.git, config).run().await?;
        let committed = commit_pending(&self.git, &config.message).await?;

        let target = RemoteTarget::from_config(config);
        let resolved =
            remote::resolve_url(&target, &config.owner, &config.name, self.home.as_deref());
        let remote = remote::register_remote(&self.git, &config.remote, &resolved)?;
        let repository = self.backend.ensure_repository(config).await?;

        let publisher = Publisher::new(&self.git, config);
        let first_push = publisher.push_branch().await?;
        let tag = publisher.publish_tag().await?;

        let released = if self.backend.release_exists(config).await? {
            tracing::warn!(
                "Release {} already exists on {}, skipping",
                config.tag,
                config.full_name()
            );
            false
        } else {
            true
        };

        let asset = if released && config.zip {
            Some(packager::package_directory(config)?)
        } else {
            None
        };

        if released {
            self.backend
                .create_release(config, asset.as_deref())
                .await?;
            tracing::info!("Release {} published for {}", config.tag, config.full_name());
        }

        Ok(PublishState {
            init,
            committed,
            repository,
            remote,
            first_push,
            tag,
            asset,
            released,
        })
    }
}
