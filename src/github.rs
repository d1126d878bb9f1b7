use anyhow::{Context, Result};
use octocrab::models::Repository;
use octocrab::Octocrab;
use tracing::{debug, info};

use crate::config::AccountConfig;

/// Minimal view of a hosted repository, decoupled from the API model.
/// Read-only: descriptors are only copied into creation requests.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub name: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub private: bool,
    pub clone_url: Option<String>,
}

impl From<&Repository> for RepoInfo {
    fn from(repo: &Repository) -> Self {
        Self {
            name: repo.name.clone(),
            owner: repo.owner.as_ref().map(|owner| owner.login.clone()),
            description: repo.description.clone(),
            private: repo.private.unwrap_or(false),
            clone_url: repo.clone_url.as_ref().map(|url| url.to_string()),
        }
    }
}

/// GitHub client bound to a single account token
pub struct GitHubClient {
    client: Octocrab,
    username: String,
    page_size: u8,
}

impl GitHubClient {
    /// Create a client for the given account
    pub fn new(account: &AccountConfig, page_size: u8) -> Result<Self> {
        let token = account.resolve_token()?;

        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self {
            client,
            username: account.username.clone(),
            page_size,
        })
    }

    /// Create a client talking to an alternate API root. Used by tests that
    /// stand in for the GitHub API with a local HTTP server.
    pub fn with_base_uri(account: &AccountConfig, page_size: u8, base_uri: &str) -> Result<Self> {
        let token = account.resolve_token()?;

        let client = Octocrab::builder()
            .personal_token(token)
            .base_uri(base_uri)
            .context("Invalid API base URI")?
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self {
            client,
            username: account.username.clone(),
            page_size,
        })
    }

    /// Get the account username this client is bound to
    pub fn username(&self) -> &str {
        &self.username
    }

    /// List all repositories owned by this account.
    ///
    /// Pages through the listing until an empty page comes back. A failure on
    /// any page discards the whole listing.
    pub async fn list_owned_repositories(&self) -> Result<Vec<RepoInfo>> {
        debug!("Fetching repositories owned by {}", self.username);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let batch: Vec<Repository> = self
                .client
                .get(
                    format!("/users/{}/repos", self.username),
                    Some(&serde_json::json!({
                        "type": "owner",
                        "per_page": self.page_size,
                        "page": page,
                    })),
                )
                .await
                .with_context(|| format!("Failed to fetch repositories page {}", page))?;

            if batch.is_empty() {
                break;
            }

            repositories.extend(batch.iter().map(RepoInfo::from));
            page += 1;
        }

        info!(
            "Found {} repositories for {}",
            repositories.len(),
            self.username
        );
        Ok(repositories)
    }

    /// Look up a repository under this account by name.
    ///
    /// Only an HTTP 404 counts as absence; every other failure propagates so a
    /// transient lookup error never triggers a creation attempt.
    pub async fn get_repository(&self, name: &str) -> Result<Option<RepoInfo>> {
        debug!("Looking up {}/{}", self.username, name);

        let route = format!("/repos/{}/{}", self.username, name);
        match self.client.get::<Repository, _, ()>(route, None).await {
            Ok(repo) => Ok(Some(RepoInfo::from(&repo))),
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code == 404 => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to look up {}/{}", self.username, name)),
        }
    }

    /// Create a repository under this account, copying name, description and
    /// visibility from the source descriptor.
    pub async fn create_repository(
        &self,
        name: &str,
        description: Option<&str>,
        private: bool,
    ) -> Result<RepoInfo> {
        info!("Creating repository {}/{}", self.username, name);

        let body = serde_json::json!({
            "name": name,
            "description": description.unwrap_or(""),
            "private": private,
        });

        let repo: Repository = self
            .client
            .post("/user/repos", Some(&body))
            .await
            .with_context(|| {
                format!("Failed to create repository {}/{}", self.username, name)
            })?;

        Ok(RepoInfo::from(&repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_info_from_api_model() {
        let json = serde_json::json!({
            "id": 42,
            "name": "alpha",
            "url": "https://api.github.com/repos/alice/alpha",
            "private": true,
            "description": "first repository",
            "clone_url": "https://github.com/alice/alpha.git",
        });
        let repo: Repository = serde_json::from_value(json).expect("Failed to parse repository");

        let info = RepoInfo::from(&repo);

        assert_eq!(info.name, "alpha");
        assert!(info.private);
        assert_eq!(info.description.as_deref(), Some("first repository"));
        assert_eq!(
            info.clone_url.as_deref(),
            Some("https://github.com/alice/alpha.git")
        );
        assert!(info.owner.is_none());
    }

    #[test]
    fn test_repo_info_defaults() {
        let json = serde_json::json!({
            "id": 7,
            "name": "bare-minimum",
            "url": "https://api.github.com/repos/alice/bare-minimum",
        });
        let repo: Repository = serde_json::from_value(json).expect("Failed to parse repository");

        let info = RepoInfo::from(&repo);

        assert_eq!(info.name, "bare-minimum");
        assert!(!info.private);
        assert!(info.description.is_none());
        assert!(info.clone_url.is_none());
    }
}
