use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Cli, Visibility};
use crate::error::{PublishError, Result};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct DefaultConfig {
    pub branch: Option<String>,

    pub remote: Option<String>,

    pub visibility: Option<String>,

    #[serde(default)]
    pub zip: bool,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct RepositoryConfig {
    pub owner: Option<String>,
    pub name: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PublishError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Fill in whatever the command line left unset
    pub fn merge_with_cli(&self, cli: &mut Cli) -> Result<()> {
        if cli.branch.is_none() {
            cli.branch = self.default.branch.clone();
        }

        if cli.remote.is_none() {
            cli.remote = self.default.remote.clone();
        }

        if !cli.public && !cli.private {
            if let Some(visibility) = &self.default.visibility {
                match visibility.parse::<Visibility>()? {
                    Visibility::Public => cli.public = true,
                    Visibility::Private => cli.private = true,
                }
            }
        }

        if !cli.zip && self.default.zip {
            cli.zip = true;
        }

        // Apply repository configuration
        if cli.repo.is_none() {
            if cli.owner.is_none() {
                cli.owner = self.repository.owner.clone();
            }
            if cli.name.is_none() {
                cli.name = self.repository.name.clone();
            }
        }

        Ok(())
    }
}
