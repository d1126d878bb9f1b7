//! Mirror engine: drives the per-repository backup cycle.
//!
//! Repositories are processed strictly sequentially in enumeration order.
//! A failure in any step aborts only the current repository's backup; the
//! run carries on with the next one.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::git::{self, GitClient};
use crate::github::{GitHubClient, RepoInfo};

/// Outcome of one repository's backup cycle
#[derive(Debug)]
pub enum MirrorOutcome {
    /// Mirrored into the secondary account and cleaned up locally
    Mirrored { name: String },
    /// Already present in the secondary account, nothing done
    Skipped { name: String, reason: String },
    /// Excluded by a configured pattern before any remote call
    Excluded { name: String },
    /// A step failed; later repositories are unaffected
    Failed { name: String, error: String },
}

impl MirrorOutcome {
    pub fn name(&self) -> &str {
        match self {
            MirrorOutcome::Mirrored { name }
            | MirrorOutcome::Skipped { name, .. }
            | MirrorOutcome::Excluded { name }
            | MirrorOutcome::Failed { name, .. } => name,
        }
    }
}

/// What `run` would do for one repository, reported by `plan`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    Mirror,
    Skip,
    Exclude,
}

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub name: String,
    pub action: PlanAction,
}

/// Results from a complete mirror run
#[derive(Debug)]
pub struct MirrorSummary {
    pub total: usize,
    pub mirrored: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration: Duration,
    pub outcomes: Vec<MirrorOutcome>,
}

/// The main engine that mirrors primary repositories into the secondary account
pub struct MirrorEngine {
    config: Config,
    primary: GitHubClient,
    secondary: GitHubClient,
    git: GitClient,
    primary_credentials: (String, String),
    secondary_credentials: (String, String),
}

impl MirrorEngine {
    /// Create an engine with clients built from the configuration
    pub fn new(config: Config) -> Result<Self> {
        let primary = GitHubClient::new(&config.primary, config.mirror.page_size)?;
        let secondary = GitHubClient::new(&config.secondary, config.mirror.page_size)?;
        Self::with_clients(config, primary, secondary)
    }

    /// Create an engine around pre-built clients. Tests use this to point
    /// both clients at a mock API server.
    pub fn with_clients(
        config: Config,
        primary: GitHubClient,
        secondary: GitHubClient,
    ) -> Result<Self> {
        let primary_credentials = (
            config.primary.username.clone(),
            config.primary.resolve_token()?,
        );
        let secondary_credentials = (
            config.secondary.username.clone(),
            config.secondary.resolve_token()?,
        );

        Ok(Self {
            config,
            primary,
            secondary,
            git: GitClient::new(),
            primary_credentials,
            secondary_credentials,
        })
    }

    /// Run a complete backup cycle over every primary repository.
    ///
    /// Fatal errors (backup root creation, repository enumeration) abort the
    /// whole run. Everything else is contained at the repository boundary.
    pub async fn run(&self) -> Result<MirrorSummary> {
        let start = Instant::now();

        let backup_root = self.ensure_backup_root()?;
        let repositories = self
            .primary
            .list_owned_repositories()
            .await
            .context("Failed to enumerate primary repositories")?;

        info!("Found {} repositories to back up", repositories.len());

        let mut outcomes = Vec::with_capacity(repositories.len());

        for repo in &repositories {
            if self.is_excluded(&repo.name) {
                debug!("Excluding repository by pattern: {}", repo.name);
                outcomes.push(MirrorOutcome::Excluded {
                    name: repo.name.clone(),
                });
                continue;
            }

            let outcome = match self.backup_repository(repo, &backup_root).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Failed to back up {}: {:#}", repo.name, e);
                    MirrorOutcome::Failed {
                        name: repo.name.clone(),
                        error: format!("{:#}", e),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let summary = compile_summary(outcomes, start.elapsed());

        info!(
            "Backup completed in {:.2}s: {} mirrored, {} skipped, {} failed",
            summary.duration.as_secs_f64(),
            summary.mirrored,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    /// Enumerate and classify without touching anything: which repositories
    /// would be mirrored, which are already present, which are excluded.
    pub async fn plan(&self) -> Result<Vec<PlanEntry>> {
        let repositories = self
            .primary
            .list_owned_repositories()
            .await
            .context("Failed to enumerate primary repositories")?;

        let mut entries = Vec::with_capacity(repositories.len());

        for repo in &repositories {
            let action = if self.is_excluded(&repo.name) {
                PlanAction::Exclude
            } else if self.secondary.get_repository(&repo.name).await?.is_some() {
                PlanAction::Skip
            } else {
                PlanAction::Mirror
            };

            entries.push(PlanEntry {
                name: repo.name.clone(),
                action,
            });
        }

        Ok(entries)
    }

    /// Back up one repository: existence check, create, mirror clone,
    /// retarget, mirror push, clean up.
    async fn backup_repository(
        &self,
        repo: &RepoInfo,
        backup_root: &Path,
    ) -> Result<MirrorOutcome> {
        info!("Processing repository: {}", repo.name);

        if let Some(_existing) = self.secondary.get_repository(&repo.name).await? {
            info!(
                "Repository {} already exists in the secondary account, skipping",
                repo.name
            );
            return Ok(MirrorOutcome::Skipped {
                name: repo.name.clone(),
                reason: "already present in secondary account".to_string(),
            });
        }

        let created = self
            .secondary
            .create_repository(&repo.name, repo.description.as_deref(), repo.private)
            .await?;

        let mirror_dir = backup_root.join(&repo.name);

        // Tolerate leftovers from a crashed earlier run
        self.remove_mirror_dir(&mirror_dir)
            .await
            .context("Failed to clean up stale mirror directory")?;

        let mirrored = self.mirror_repository(repo, &created, &mirror_dir).await;

        // The mirror directory never outlives one backup cycle, success or not
        let cleaned = self.remove_mirror_dir(&mirror_dir).await;

        match (mirrored, cleaned) {
            (Ok(()), Ok(())) => {
                info!("Successfully backed up {}", repo.name);
                Ok(MirrorOutcome::Mirrored {
                    name: repo.name.clone(),
                })
            }
            (Ok(()), Err(e)) => {
                // The push went through; the backup stands even though the
                // local directory could not be removed.
                warn!(
                    "Backup of {} pushed, but local cleanup failed: {:#}",
                    repo.name, e
                );
                Ok(MirrorOutcome::Failed {
                    name: repo.name.clone(),
                    error: format!("mirror pushed but local cleanup failed: {:#}", e),
                })
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!(
                    "Cleanup after failed backup of {} also failed: {:#}",
                    repo.name, cleanup
                );
                Err(e)
            }
        }
    }

    /// Clone the primary repository in mirror mode and push it to the
    /// secondary repository.
    async fn mirror_repository(
        &self,
        repo: &RepoInfo,
        created: &RepoInfo,
        mirror_dir: &Path,
    ) -> Result<()> {
        let clone_url = repo
            .clone_url
            .as_deref()
            .ok_or_else(|| anyhow!("No clone URL for repository {}", repo.name))?;
        let (primary_user, primary_token) = &self.primary_credentials;
        let clone_url = git::with_credentials(clone_url, primary_user, primary_token);

        self.git.clone_mirror(&clone_url, mirror_dir).await?;

        let push_url = self.push_url(repo, created);
        self.git.set_push_url(mirror_dir, &push_url).await?;
        self.git.push_mirror(mirror_dir).await?;

        Ok(())
    }

    /// Push target for the secondary repository: prefer the clone URL the
    /// creation call returned, fall back to the canonical GitHub URL.
    fn push_url(&self, repo: &RepoInfo, created: &RepoInfo) -> String {
        let (secondary_user, secondary_token) = &self.secondary_credentials;

        let url = match &created.clone_url {
            Some(url) => url.clone(),
            None => format!("https://github.com/{}/{}.git", secondary_user, repo.name),
        };

        git::with_credentials(&url, secondary_user, secondary_token)
    }

    /// Create the backup root directory; failure here is fatal to the run.
    fn ensure_backup_root(&self) -> Result<PathBuf> {
        let root = PathBuf::from(&self.config.backup_directory);

        std::fs::create_dir_all(&root).with_context(|| {
            format!("Failed to create backup directory: {}", root.display())
        })?;

        Ok(root)
    }

    async fn remove_mirror_dir(&self, mirror_dir: &Path) -> Result<()> {
        if !mirror_dir.exists() {
            return Ok(());
        }

        tokio::fs::remove_dir_all(mirror_dir)
            .await
            .with_context(|| format!("Failed to remove {}", mirror_dir.display()))
    }

    fn is_excluded(&self, name: &str) -> bool {
        matches_exclusion(name, &self.config.mirror.exclude_patterns)
    }

    /// Get configuration for external inspection
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Check if a repository name matches any exclusion pattern
fn matches_exclusion(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        // Simple glob pattern matching
        if pattern.contains('*') {
            let pattern_regex = pattern.replace('.', r"\.").replace('*', ".*");

            regex::Regex::new(&format!("^{}$", pattern_regex))
                .map(|re| re.is_match(name))
                .unwrap_or(false)
        } else {
            name == pattern
        }
    })
}

/// Compile a run summary from per-repository outcomes
fn compile_summary(outcomes: Vec<MirrorOutcome>, duration: Duration) -> MirrorSummary {
    let total = outcomes.len();
    let mut mirrored = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for outcome in &outcomes {
        match outcome {
            MirrorOutcome::Mirrored { .. } => mirrored += 1,
            MirrorOutcome::Skipped { .. } | MirrorOutcome::Excluded { .. } => skipped += 1,
            MirrorOutcome::Failed { .. } => failed += 1,
        }
    }

    MirrorSummary {
        total,
        mirrored,
        skipped,
        failed,
        duration,
        outcomes,
    }
}
