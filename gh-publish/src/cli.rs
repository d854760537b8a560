use chrono::{DateTime, Local};
use clap::Parser;
use std::path::PathBuf;

use crate::error::{PublishError, Result};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Identity embedded in token URLs when GITHUB_USER is unset
pub const DEFAULT_TOKEN_USER: &str = "x-access-token";

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "gh-publish",
    about = "Publish a local directory as a versioned GitHub release",
    long_about = None,
    disable_version_flag = true
)]
pub struct Cli {
    /// Code directory to publish
    #[clap(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// GitHub repository (owner/name)
    #[clap(short, long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Repository owner (use together with --name)
    #[clap(short, long)]
    pub owner: Option<String>,

    /// Repository name (use together with --owner)
    #[clap(short, long)]
    pub name: Option<String>,

    /// Branch to publish [default: main]
    #[clap(short, long)]
    pub branch: Option<String>,

    /// Remote name [default: origin]
    #[clap(long)]
    pub remote: Option<String>,

    /// Create the repository as public
    #[clap(long, conflicts_with = "private")]
    pub public: bool,

    /// Create the repository as private (default)
    #[clap(long)]
    pub private: bool,

    /// Version tag [default: v<YYYYMMDD>-<HHMMSS>]
    #[clap(short = 'v', long = "version", value_name = "TAG")]
    pub version: Option<String>,

    /// Commit and release message [default: "Release <tag>"]
    #[clap(short, long)]
    pub message: Option<String>,

    /// Attach a zip of the code directory to the release
    #[clap(long)]
    pub zip: bool,

    /// Push with --force-with-lease
    #[clap(long)]
    pub force_push: bool,

    /// Configuration file path
    #[clap(long, default_value = ".config/ghpublish.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[clap(long)]
    pub verbose: bool,

    /// GitHub token (can also be set via GITHUB_TOKEN env var)
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Identity embedded in token-authenticated remote URLs
    #[clap(long, env = "GITHUB_USER")]
    pub github_user: Option<String>,

    /// GitHub REST API base URL
    #[clap(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }

    /// Flag understood by `gh repo create`
    pub fn as_flag(self) -> &'static str {
        match self {
            Visibility::Public => "--public",
            Visibility::Private => "--private",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(PublishError::Usage(format!(
                "unknown visibility '{other}' (expected public or private)"
            ))),
        }
    }
}

/// Fully resolved settings for one publish run
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub dir: PathBuf,
    pub owner: String,
    pub name: String,
    pub branch: String,
    pub remote: String,
    pub visibility: Visibility,
    pub tag: String,
    pub message: String,
    pub zip: bool,
    pub force_push: bool,
    pub github_token: Option<String>,
    pub github_user: String,
    pub api_url: String,
}

impl PublishConfig {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
impl PublishConfig {
    pub(crate) fn for_test(dir: &std::path::Path) -> Self {
        PublishConfig {
            dir: dir.to_path_buf(),
            owner: "owner".to_string(),
            name: "project".to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            visibility: Visibility::Private,
            tag: "v1.0.0".to_string(),
            message: "Release v1.0.0".to_string(),
            zip: false,
            force_push: false,
            github_token: None,
            github_user: DEFAULT_TOKEN_USER.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Cli {
    /// Validate arguments and apply defaults
    pub fn resolve(self) -> Result<PublishConfig> {
        self.resolve_at(Local::now())
    }

    pub fn resolve_at(self, now: DateTime<Local>) -> Result<PublishConfig> {
        let dir = self
            .dir
            .clone()
            .ok_or_else(|| PublishError::Usage("--dir is required".to_string()))?;
        if !dir.is_dir() {
            return Err(PublishError::MissingDirectory { path: dir });
        }
        let dir = std::fs::canonicalize(&dir)?;

        let (owner, name) = self.parse_repository()?;

        let tag = self
            .version
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default_tag(now));
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Release {tag}"));

        let visibility = if self.public {
            Visibility::Public
        } else {
            Visibility::Private
        };

        Ok(PublishConfig {
            dir,
            owner,
            name,
            branch: self.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            remote: self.remote.unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            visibility,
            tag,
            message,
            zip: self.zip,
            force_push: self.force_push,
            github_token: self.github_token.filter(|t| !t.is_empty()),
            github_user: self
                .github_user
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_USER.to_string()),
            api_url: self.api_url,
        })
    }

    /// Parse `--repo owner/name`, or fall back to `--owner` plus `--name`
    pub fn parse_repository(&self) -> Result<(String, String)> {
        if let Some(repo) = &self.repo {
            let invalid = || PublishError::InvalidRepo {
                input: repo.clone(),
            };
            let (owner, name) = repo.split_once('/').ok_or_else(invalid)?;
            if owner.is_empty() || name.is_empty() || name.contains('/') {
                return Err(invalid());
            }
            return Ok((owner.to_string(), name.to_string()));
        }

        match (&self.owner, &self.name) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
                Ok((owner.clone(), name.clone()))
            }
            _ => Err(PublishError::Usage(
                "either --repo owner/name or both --owner and --name are required".to_string(),
            )),
        }
    }
}

/// Timestamp tag of the form `v<YYYYMMDD>-<HHMMSS>`
pub fn default_tag(now: DateTime<Local>) -> String {
    now.format("v%Y%m%d-%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_tag_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(default_tag(now), "v20240309-070501");
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!("PRIVATE".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("internal".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_visibility_flag() {
        assert_eq!(Visibility::Public.as_flag(), "--public");
        assert_eq!(Visibility::Private.as_flag(), "--private");
        assert!(Visibility::Private.is_private());
    }
}
