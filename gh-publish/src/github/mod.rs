//! Hosting backends.
//!
//! The authenticated `gh` CLI is preferred; without it the REST API is used with
//! a bearer token. The backend is chosen once per run by [`select_backend`].

mod cli;
mod rest;

pub use cli::GhCli;
pub use rest::{upload_asset, RestBackend};

use async_trait::async_trait;
use std::path::Path;

use crate::cli::PublishConfig;
use crate::error::{PublishError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Existing,
    Created,
}

/// Repository and release operations on the hosting platform
#[async_trait]
pub trait HostingBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create the remote repository unless it already exists
    async fn ensure_repository(&self, config: &PublishConfig) -> Result<RepoStatus>;

    /// Whether a release for `config.tag` is already published
    async fn release_exists(&self, config: &PublishConfig) -> Result<bool>;

    /// Create a release for `config.tag`, attaching `asset` if given
    async fn create_release(&self, config: &PublishConfig, asset: Option<&Path>) -> Result<()>;
}

/// Probe for a usable backend: authenticated `gh` first, then a token
pub async fn select_backend(config: &PublishConfig) -> Result<Box<dyn HostingBackend>> {
    if GhCli::is_authenticated(&config.dir).await {
        tracing::info!("Using gh CLI backend");
        return Ok(Box::new(GhCli::new(&config.dir)));
    }

    if let Some(token) = &config.github_token {
        tracing::info!("gh CLI unavailable, using REST API at {}", config.api_url);
        return Ok(Box::new(RestBackend::new(token.clone(), &config.api_url)?));
    }

    Err(PublishError::NoBackend)
}

/// Determine content type for an asset
pub fn get_content_type(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension {
        "gz" | "tgz" => "application/gzip",
        "zip" => "application/zip",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Strip the `{?name,label}` template suffix from a release `upload_url`
pub fn parse_upload_url(raw: &str) -> Result<String> {
    let base = raw.split('{').next().unwrap_or("").trim();
    if base.is_empty() || !(base.starts_with("https://") || base.starts_with("http://")) {
        return Err(PublishError::AssetUpload(format!(
            "could not extract upload URL from release response: {raw:?}"
        )));
    }
    Ok(base.to_string())
}
