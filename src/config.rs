use anyhow::{anyhow, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for RepoVault
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory holding the transient mirror clones
    #[serde(default = "default_backup_directory")]
    pub backup_directory: String,

    /// Source-of-truth account whose repositories are backed up
    pub primary: AccountConfig,

    /// Backup destination account
    pub secondary: AccountConfig,

    /// Mirroring behavior settings
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// Credentials for one GitHub account
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccountConfig {
    /// GitHub username
    pub username: String,

    /// Inline access token. Intended for tests and automation; prefer
    /// `token_env` so tokens never land in the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable to read the access token from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

/// Mirroring configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MirrorConfig {
    /// Page size for repository listing
    #[serde(default = "default_page_size")]
    pub page_size: u8,

    /// Repository exclusion patterns
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

// Default value functions
fn default_backup_directory() -> String {
    "${HOME}/.cache/repovault/mirrors".to_string()
}
fn default_page_size() -> u8 {
    100
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl AccountConfig {
    /// Resolve the access token for this account: inline token first,
    /// then the configured environment variable.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = &self.token {
            if !token.is_empty() {
                return Ok(token.clone());
            }
        }

        if let Some(var) = &self.token_env {
            let token = std::env::var(var)
                .with_context(|| format!("Environment variable {} not set", var))?;
            if token.is_empty() {
                return Err(anyhow!("Environment variable {} is empty", var));
            }
            return Ok(token);
        }

        Err(anyhow!(
            "No access token configured for account '{}'. Either:\n\
             1. Set `token_env` in the config and export that variable\n\
             2. Set `token` directly in the config file",
            self.username
        ))
    }
}

impl Config {
    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repovault").join("config.yml"))
    }

    /// Starter configuration for `repovault init`. Tokens are referenced
    /// through environment variables, never stored inline.
    pub fn template(primary_username: &str, secondary_username: &str) -> Self {
        Self {
            backup_directory: default_backup_directory(),
            primary: AccountConfig {
                username: primary_username.to_string(),
                token: None,
                token_env: Some("REPOVAULT_PRIMARY_TOKEN".to_string()),
            },
            secondary: AccountConfig {
                username: secondary_username.to_string(),
                token: None,
                token_env: Some("REPOVAULT_SECONDARY_TOKEN".to_string()),
            },
            mirror: MirrorConfig::default(),
        }
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.backup_directory = shellexpand::full(&self.backup_directory)
            .context("Failed to expand backup_directory path")?
            .into_owned();

        Ok(())
    }
}
