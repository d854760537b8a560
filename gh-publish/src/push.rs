use crate::cli::PublishConfig;
use crate::error::Result;
use crate::git::Git;

/// What happened while publishing the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagOutcome {
    pub created: bool,
    pub pushed: bool,
}

/// Pushes the branch and the release tag to the remote
pub struct Publisher<'a> {
    git: &'a Git,
    config: &'a PublishConfig,
}

impl<'a> Publisher<'a> {
    pub fn new(git: &'a Git, config: &'a PublishConfig) -> Self {
        Self { git, config }
    }

    /// Push the branch; returns whether this was the first push of the branch
    pub async fn push_branch(&self) -> Result<bool> {
        let remote = &self.config.remote;
        let branch = &self.config.branch;

        let first_push = !self.git.remote_has_branch(remote, branch).await?;

        if first_push {
            tracing::info!("First push of {} to {}", branch, remote);
            self.reconcile_unrelated_history().await?;
            self.git
                .push_branch(remote, branch, true, self.config.force_push)
                .await?;
        } else {
            tracing::info!("Updating {} on {}", branch, remote);
            self.rebase_onto_remote().await?;
            self.git
                .push_branch(remote, branch, false, self.config.force_push)
                .await?;
        }

        tracing::info!("Pushed {} to {}", branch, remote);
        Ok(first_push)
    }

    /// A remote with refs of its own (e.g. an auto-generated README) gets pulled in first
    async fn reconcile_unrelated_history(&self) -> Result<()> {
        let remote = &self.config.remote;
        if !self.git.remote_has_refs(remote).await? {
            return Ok(());
        }

        let upstream = self
            .git
            .remote_default_branch(remote)
            .await?
            .unwrap_or_else(|| self.config.branch.clone());

        tracing::info!("Remote {} has existing history, pulling {}", remote, upstream);
        if !self.git.fetch(remote, None).await? {
            tracing::warn!("Fetch from {} failed", remote);
        }
        if !self.git.pull_rebase_unrelated(remote, &upstream).await? {
            tracing::warn!("Could not rebase onto {}/{}, pushing anyway", remote, upstream);
        }
        Ok(())
    }

    async fn rebase_onto_remote(&self) -> Result<()> {
        let remote = &self.config.remote;
        let branch = &self.config.branch;

        if !self.git.fetch(remote, Some(branch)).await? {
            tracing::warn!("Fetch of {}/{} failed", remote, branch);
        }

        if self.git.remote_tracking_exists(remote, branch)? {
            let upstream = format!("{remote}/{branch}");
            if !self.git.rebase_onto(&upstream).await? {
                tracing::warn!("Rebase onto {} failed, pushing anyway", upstream);
            }
        }
        Ok(())
    }

    /// Create and push the annotated tag, skipping whatever already exists
    pub async fn publish_tag(&self) -> Result<TagOutcome> {
        let remote = &self.config.remote;
        let tag = &self.config.tag;
        let mut outcome = TagOutcome::default();

        if self.git.local_tag_exists(tag)? {
            tracing::warn!("Tag {} already exists locally, skipping creation", tag);
        } else {
            self.git.create_annotated_tag(tag, &self.config.message).await?;
            tracing::info!("Created tag {}", tag);
            outcome.created = true;
        }

        if self.git.remote_tag_exists(remote, tag).await? {
            tracing::warn!("Tag {} already exists on {}, skipping push", tag, remote);
            return Ok(outcome);
        }

        match self.git.push_tag(remote, tag).await {
            Ok(()) => {
                tracing::info!("Pushed tag {} to {}", tag, remote);
                outcome.pushed = true;
            }
            Err(e) => tracing::warn!("Failed to push tag {}: {}", tag, e),
        }

        Ok(outcome)
    }
}
