//! Shared helpers for RepoVault integration tests: local git fixtures and
//! canned GitHub API payloads served through wiremock.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use repovault::config::{AccountConfig, Config, MirrorConfig};

/// Run a git command in `dir` and assert it succeeded.
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git is not available");

    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a local repository with one commit and one tag, standing in for a
/// primary-account repository.
pub fn init_source_repo(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("Failed to create source repo dir");

    git(&dir, &["init", "-b", "main"]);
    git(&dir, &["config", "user.email", "tests@example.com"]);
    git(&dir, &["config", "user.name", "RepoVault Tests"]);

    std::fs::write(dir.join("README.md"), format!("# {}\n", name))
        .expect("Failed to write README");
    git(&dir, &["add", "."]);
    git(&dir, &["commit", "-m", "initial commit"]);
    git(&dir, &["tag", "v0.1.0"]);

    dir
}

/// Create a bare repository standing in for a freshly created
/// secondary-account repository.
pub fn init_bare_repo(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("Failed to create bare repo dir");

    git(&dir, &["init", "--bare"]);

    dir
}

/// Resolve a revision to its commit hash.
pub fn rev_parse(dir: &Path, rev: &str) -> String {
    let output = Command::new("git")
        .args(["rev-parse", rev])
        .current_dir(dir)
        .output()
        .expect("git is not available");

    assert!(
        output.status.success(),
        "git rev-parse {} failed in {}: {}",
        rev,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// file:// URL for a local path, usable as a clone or push URL.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Repository payload in the shape the GitHub API returns.
pub fn repo_json(
    id: u64,
    name: &str,
    private: bool,
    description: &str,
    clone_url: &str,
) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "url": format!("https://api.github.com/repos/{}", name),
        "private": private,
        "description": description,
        "clone_url": clone_url,
    })
}

/// Error payload in the shape the GitHub API returns.
pub fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest",
    })
}

/// Configuration with inline tokens, pointing at a temporary backup root.
pub fn test_config(backup_dir: &Path) -> Config {
    test_config_with_page_size(backup_dir, 100)
}

pub fn test_config_with_page_size(backup_dir: &Path, page_size: u8) -> Config {
    Config {
        backup_directory: backup_dir.display().to_string(),
        primary: AccountConfig {
            username: "alice".to_string(),
            token: Some("primary-token".to_string()),
            token_env: None,
        },
        secondary: AccountConfig {
            username: "alice-backup".to_string(),
            token: Some("secondary-token".to_string()),
            token_env: None,
        },
        mirror: MirrorConfig {
            page_size,
            exclude_patterns: Vec::new(),
        },
    }
}
