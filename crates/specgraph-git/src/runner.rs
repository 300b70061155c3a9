// ABOUTME: Async git subprocess runner: fixed invocation shape, captured streams, enforced timeout.
// ABOUTME: Non-zero exits carry stderr; timeouts are non-transient by contract.

use specgraph_core::{Result, SpecGraphError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Timeout for plumbing commands (diff, show, rev-parse, ...).
pub const PLUMBING_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for clone and fetch against remotes.
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone)]
pub struct GitRunner {
    repo: PathBuf,
    timeout: Duration,
}

impl GitRunner {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            timeout: PLUMBING_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Run `git -C <repo> <args...>`, capturing both streams. Non-zero exit
    /// yields an error carrying stderr (stdout as fallback).
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        run_git_in(Some(&self.repo), args, self.timeout).await
    }

    /// True when the configured directory is inside a git work tree.
    pub async fn is_work_tree(&self) -> bool {
        self.run(&["rev-parse", "--is-inside-work-tree"])
            .await
            .map(|out| out.trim() == "true")
            .unwrap_or(false)
    }

    pub async fn head_commit(&self) -> Result<String> {
        Ok(self.run(&["rev-parse", "HEAD"]).await?.trim().to_string())
    }

    /// Content of `<reference>:<path>`, used for before/after diffs.
    pub async fn show(&self, reference: &str, path: &str) -> Result<String> {
        self.run(&["show", &format!("{reference}:{path}")]).await
    }
}

/// Run a git command with explicit working directory (None for commands
/// like `clone` that create their own target).
pub async fn run_git_in(
    cwd: Option<&Path>,
    args: &[&str],
    timeout: Duration,
) -> Result<String> {
    let mut command = Command::new("git");
    if let Some(dir) = cwd {
        command.arg("-C").arg(dir);
    }
    command.args(args);
    command.kill_on_drop(true);
    debug!(?args, cwd = ?cwd, "running git");

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| SpecGraphError::GitTimeout(format!("git {}", args.join(" "))))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpecGraphError::Git("git executable not found".to_string())
            } else {
                SpecGraphError::Git(format!("failed to spawn git: {e}"))
            }
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let message = if !stderr.is_empty() { stderr } else { stdout };
        Err(SpecGraphError::Git(format!(
            "git {} failed: {message}",
            args.join(" ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn init_repo(dir: &TempDir) -> GitRunner {
        let runner = GitRunner::new(dir.path());
        run_git_in(Some(dir.path()), &["init", "-q"], PLUMBING_TIMEOUT)
            .await
            .unwrap();
        run_git_in(
            Some(dir.path()),
            &["config", "user.email", "dev@example.com"],
            PLUMBING_TIMEOUT,
        )
        .await
        .unwrap();
        run_git_in(
            Some(dir.path()),
            &["config", "user.name", "Dev"],
            PLUMBING_TIMEOUT,
        )
        .await
        .unwrap();
        runner
    }

    #[tokio::test]
    async fn detects_work_tree() {
        let dir = TempDir::new().unwrap();
        let runner = init_repo(&dir).await;
        assert!(runner.is_work_tree().await);
    }

    #[tokio::test]
    async fn non_repo_is_not_a_work_tree() {
        let dir = TempDir::new().unwrap();
        let runner = GitRunner::new(dir.path().join("missing"));
        assert!(!runner.is_work_tree().await);
    }

    #[tokio::test]
    async fn failed_command_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let runner = init_repo(&dir).await;
        let err = runner.run(&["show", "HEAD:missing.txt"]).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("failed"), "unexpected error: {message}");
    }
}
