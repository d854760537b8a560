use async_trait::async_trait;
use octocrab::models::Repository;
use octocrab::Octocrab;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::path::Path;

use super::{get_content_type, parse_upload_url, HostingBackend, RepoStatus};
use crate::cli::PublishConfig;
use crate::error::{PublishError, Result};

/// Backend speaking the REST API with a bearer token
pub struct RestBackend {
    octocrab: Octocrab,
    http_client: Client,
    token: String,
}

impl RestBackend {
    pub fn new(token: String, api_url: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.clone())
            .base_uri(api_url)?
            .build()?;

        let http_client = Client::builder().user_agent("gh-publish").build()?;

        Ok(Self {
            octocrab,
            http_client,
            token,
        })
    }
}

#[async_trait]
impl HostingBackend for RestBackend {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn ensure_repository(&self, config: &PublishConfig) -> Result<RepoStatus> {
        let full_name = config.full_name();

        match self.octocrab.repos(&config.owner, &config.name).get().await {
            Ok(repo) if repo.full_name.is_some() => {
                tracing::info!("Repository {} already exists", full_name);
                return Ok(RepoStatus::Existing);
            }
            Ok(_) => tracing::debug!("Lookup of {} returned no full_name", full_name),
            Err(e) => tracing::debug!("Lookup of {} failed: {}", full_name, e),
        }

        tracing::info!("Creating {} repository {}", config.visibility, full_name);
        let body = serde_json::json!({
            "name": config.name,
            "private": config.visibility.is_private(),
        });

        let created: Repository = self
            .octocrab
            .post("/user/repos", Some(&body))
            .await
            .map_err(|e| PublishError::RepoCreation(describe_api_error(&e)))?;

        match created.full_name {
            Some(name) => {
                tracing::info!("Created repository {}", name);
                Ok(RepoStatus::Created)
            }
            None => Err(PublishError::RepoCreation(format!(
                "response has no full_name: {created:?}"
            ))),
        }
    }

    async fn release_exists(&self, config: &PublishConfig) -> Result<bool> {
        match self
            .octocrab
            .repos(&config.owner, &config.name)
            .releases()
            .get_by_tag(&config.tag)
            .await
        {
            Ok(release) => {
                tracing::debug!("Found release {} at {}", release.tag_name, release.html_url);
                Ok(true)
            }
            Err(e) => {
                tracing::debug!("No release for {}: {}", config.tag, describe_api_error(&e));
                Ok(false)
            }
        }
    }

    async fn create_release(&self, config: &PublishConfig, asset: Option<&Path>) -> Result<()> {
        tracing::info!("Creating release {} via REST API", config.tag);

        let release = self
            .octocrab
            .repos(&config.owner, &config.name)
            .releases()
            .create(&config.tag)
            .name(&config.tag)
            .body(&config.message)
            .draft(false)
            .prerelease(false)
            .send()
            .await
            .map_err(|e| PublishError::ReleaseCreation(describe_api_error(&e)))?;

        let upload_url = parse_upload_url(&release.upload_url)?;

        if let Some(asset) = asset {
            upload_asset(&self.http_client, &self.token, &upload_url, asset).await?;
        }

        tracing::info!("Release URL: {}", release.html_url);
        Ok(())
    }
}

/// Error text that keeps the API's own message and `errors` array
fn describe_api_error(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => match &source.errors {
            Some(errors) if !errors.is_empty() => {
                let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                format!("{} [{}]", source.message, details.join(", "))
            }
            _ => source.message.clone(),
        },
        other => format!("{other:?}"),
    }
}

/// Upload a file to a release's upload endpoint
pub async fn upload_asset(
    http_client: &Client,
    token: &str,
    upload_url: &str,
    asset_path: &Path,
) -> Result<()> {
    let asset_name = asset_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PublishError::AssetUpload("Invalid asset path".to_string()))?;

    tracing::info!("Uploading asset: {}", asset_name);

    let file_content = tokio::fs::read(asset_path).await?;

    let response = http_client
        .post(upload_url)
        .query(&[("name", asset_name)])
        .bearer_auth(token)
        .header(ACCEPT, "application/vnd.github+json")
        .header(CONTENT_TYPE, get_content_type(asset_path))
        .body(file_content)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(PublishError::AssetUpload(format!(
            "Failed to upload asset: {status} - {error_text}"
        )));
    }

    tracing::info!("Successfully uploaded: {}", asset_name);
    Ok(())
}
