//! RepoVault - GitHub Account Mirroring Tool
//!
//! RepoVault backs up every repository owned by a primary GitHub account into a
//! secondary account: it enumerates the primary account, creates missing
//! repositories on the secondary side, mirror-clones each one locally and
//! mirror-pushes it to the backup, removing the local clone afterwards.
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`github`]: GitHub API access for both accounts
//! - [`git`]: Git subprocess invocation
//! - [`mirror`]: The sequential backup engine

pub mod config;
pub mod git;
pub mod github;
pub mod mirror;

pub use config::Config;
pub use git::GitClient;
pub use github::{GitHubClient, RepoInfo};
pub use mirror::{MirrorEngine, MirrorOutcome, MirrorSummary, PlanAction, PlanEntry};
