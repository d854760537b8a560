//! Remote URL selection and registration.
//!
//! Priority for the active URL: token-embedded HTTPS, then a stored
//! `~/.git-credentials` entry, then SSH if a private key exists, then plain HTTPS.

use std::path::{Path, PathBuf};

use crate::cli::PublishConfig;
use crate::error::Result;
use crate::git::Git;

pub const GITHUB_HOST: &str = "github.com";

const SSH_KEY_NAMES: &[&str] = &["id_ed25519", "id_ecdsa", "id_rsa"];

/// Every URL form the remote could take
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub ssh_url: String,
    pub https_url: String,
    pub token_url: Option<String>,
}

impl RemoteTarget {
    pub fn new(owner: &str, name: &str, token: Option<&str>, user: &str) -> Self {
        Self {
            ssh_url: format!("git@{GITHUB_HOST}:{owner}/{name}.git"),
            https_url: format!("https://{GITHUB_HOST}/{owner}/{name}.git"),
            token_url: token
                .map(|token| format!("https://{user}:{token}@{GITHUB_HOST}/{owner}/{name}.git")),
        }
    }

    pub fn from_config(config: &PublishConfig) -> Self {
        Self::new(
            &config.owner,
            &config.name,
            config.github_token.as_deref(),
            &config.github_user,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    Token,
    StoredCredential,
    Ssh,
    Https,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub source: UrlSource,
}

impl ResolvedUrl {
    /// URLs that carry a credential replace whatever the remote had
    pub fn carries_credential(&self) -> bool {
        matches!(self.source, UrlSource::Token | UrlSource::StoredCredential)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    Added,
    Refreshed,
    Unchanged,
}

pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Pick the active remote URL
pub fn resolve_url(target: &RemoteTarget, owner: &str, name: &str, home: Option<&Path>) -> ResolvedUrl {
    if let Some(url) = &target.token_url {
        return ResolvedUrl {
            url: url.clone(),
            source: UrlSource::Token,
        };
    }

    if let Some(home) = home {
        let stored = std::fs::read_to_string(home.join(".git-credentials"))
            .ok()
            .and_then(|content| find_stored_credential(&content));
        if let Some(base) = stored {
            return ResolvedUrl {
                url: format!("{base}/{owner}/{name}.git"),
                source: UrlSource::StoredCredential,
            };
        }

        if has_ssh_key(home) {
            return ResolvedUrl {
                url: target.ssh_url.clone(),
                source: UrlSource::Ssh,
            };
        }
    }

    ResolvedUrl {
        url: target.https_url.clone(),
        source: UrlSource::Https,
    }
}

/// First `https://<user>:<token>@github.com` line with no path suffix
fn find_stored_credential(content: &str) -> Option<String> {
    content.lines().map(str::trim).find_map(|line| {
        let rest = line.strip_prefix("https://")?;
        let (userinfo, host) = rest.rsplit_once('@')?;
        let (user, token) = userinfo.split_once(':')?;
        if user.is_empty() || token.is_empty() || host != GITHUB_HOST {
            return None;
        }
        Some(line.to_string())
    })
}

fn has_ssh_key(home: &Path) -> bool {
    let ssh_dir = home.join(".ssh");
    SSH_KEY_NAMES.iter().any(|key| ssh_dir.join(key).is_file())
}

/// Hide the userinfo part of a URL for logging
pub fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}

/// Add the remote, or refresh its URL when a credential-carrying URL was resolved
pub fn register_remote(git: &Git, remote: &str, resolved: &ResolvedUrl) -> Result<RemoteAction> {
    match git.remote_url(remote)? {
        Some(existing) => {
            if resolved.carries_credential() && existing != resolved.url {
                git.set_remote_url(remote, &resolved.url)?;
                tracing::info!("Updated remote {} to {}", remote, redact(&resolved.url));
                Ok(RemoteAction::Refreshed)
            } else {
                tracing::info!("Using existing remote {} ({})", remote, redact(&existing));
                Ok(RemoteAction::Unchanged)
            }
        }
        None => {
            git.add_remote(remote, &resolved.url)?;
            tracing::info!("Added remote {} -> {}", remote, redact(&resolved.url));
            Ok(RemoteAction::Added)
        }
    }
}
