use chrono::Local;
use std::fs;
use std::path::Path;

use crate::cli::PublishConfig;
use crate::error::Result;
use crate::git::Git;

const DEFAULT_GITIGNORE: &str = "\
# OS files
.DS_Store
Thumbs.db

# Editors
*.swp
*~
.idea/
.vscode/

# Build output and dependencies
target/
node_modules/
dist/

# Logs and local environment
*.log
.env
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new repository was created
    Created,
    /// Metadata already existed; only the branch was ensured
    Existing,
}

/// Ensures a repository exists with the configured branch checked out
pub struct Initializer<'a> {
    git: &'a Git,
    config: &'a PublishConfig,
}

impl<'a> Initializer<'a> {
    pub fn new(git: &'a Git, config: &'a PublishConfig) -> Self {
        Self { git, config }
    }

    pub async fn run(&self) -> Result<InitOutcome> {
        if self.git.is_repository() {
            self.ensure_branch().await?;
            return Ok(InitOutcome::Existing);
        }

        tracing::info!(
            "Initializing repository in {} on branch {}",
            self.git.dir().display(),
            self.config.branch
        );
        self.git.init(&self.config.branch)?;
        self.write_defaults()?;
        Ok(InitOutcome::Created)
    }

    /// Checkout or create the target branch
    async fn ensure_branch(&self) -> Result<()> {
        let branch = &self.config.branch;
        let head = self.git.head_branch()?;

        if head.as_deref() == Some(branch.as_str()) {
            tracing::debug!("Already on branch {}", branch);
            return Ok(());
        }

        if self.git.local_branch_exists(branch)? {
            tracing::info!("Checking out branch {}", branch);
            self.git.checkout(branch).await
        } else {
            tracing::info!("Creating branch {}", branch);
            self.git.checkout_new(branch).await
        }
    }

    /// Write .gitignore and README.md unless they already exist
    fn write_defaults(&self) -> Result<()> {
        let dir = self.git.dir();

        write_if_absent(&dir.join(".gitignore"), DEFAULT_GITIGNORE)?;

        let readme = format!(
            "# {name}\n\n\
             Repository initialized by gh-publish on {timestamp}.\n\n\
             - Branch: `{branch}`\n\
             - Visibility: {visibility}\n",
            name = self.config.name,
            timestamp = Local::now().format("%Y-%m-%d %H:%M:%S %z"),
            branch = self.config.branch,
            visibility = self.config.visibility,
        );
        write_if_absent(&dir.join("README.md"), &readme)?;

        Ok(())
    }
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::debug!("Keeping existing {}", path.display());
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::info!("Created {}", path.display());
    Ok(())
}
