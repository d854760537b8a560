use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Invalid repository format '{input}'. Expected: owner/name")]
    InvalidRepo { input: String },

    #[error("Directory not found: {}", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("Required tool '{tool}' not found on PATH")]
    MissingTool { tool: String },

    #[error("`{program} {args}` failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        status: String,
        stderr: String,
    },

    #[error("Repository creation failed: {0}")]
    RepoCreation(String),

    #[error("Release creation failed: {0}")]
    ReleaseCreation(String),

    #[error("Asset upload failed: {0}")]
    AssetUpload(String),

    #[error(
        "No GitHub backend available. Run `gh auth login` or set GITHUB_TOKEN"
    )]
    NoBackend,

    #[error("Configuration error at {path}: {message}")]
    Config { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {0}")]
    GitHubApi(Box<octocrab::Error>),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, PublishError>;

impl From<octocrab::Error> for PublishError {
    fn from(err: octocrab::Error) -> Self {
        PublishError::GitHubApi(Box::new(err))
    }
}

impl PublishError {
    /// True for errors raised while resolving arguments, before any side effect
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            PublishError::Usage(_)
                | PublishError::InvalidRepo { .. }
                | PublishError::MissingDirectory { .. }
        )
    }
}
