// ABOUTME: Classifies changed files from working tree or ref-to-ref diffs.
// ABOUTME: Per-path merge priority is delete > create > modify; renames keep old_path.

use crate::runner::GitRunner;
use serde::{Deserialize, Serialize};
use specgraph_core::{ImpactKind, Result, SpecGraphError};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum DiffMode {
    /// Staged plus unstaged changes, optionally with untracked files.
    WorkingTree { include_untracked: bool },
    /// `base_ref` against `target_ref`, or against the working tree when
    /// the target is omitted.
    RefDiff {
        base_ref: String,
        target_ref: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileImpact {
    pub path: String,
    pub impact: ImpactKind,
    pub raw_statuses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeClassification {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<String>,
    pub create: Vec<String>,
    pub modify: Vec<String>,
    pub delete: Vec<String>,
    pub files: Vec<FileImpact>,
}

impl ChangeClassification {
    pub fn total_changed(&self) -> usize {
        self.files.len()
    }

    pub fn impact_of(&self, path: &str) -> Option<ImpactKind> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.impact)
    }
}

fn status_to_impact(status: &str) -> Option<ImpactKind> {
    match status.chars().next()? {
        'A' | 'C' => Some(ImpactKind::Create),
        'D' => Some(ImpactKind::Delete),
        'M' | 'T' | 'U' | 'R' => Some(ImpactKind::Modify),
        _ => None,
    }
}

#[derive(Default)]
struct Accumulator {
    entries: BTreeMap<String, FileImpact>,
}

impl Accumulator {
    fn record(&mut self, path: &str, status: &str, old_path: Option<&str>) {
        let Some(impact) = status_to_impact(status) else {
            return;
        };
        let entry = self
            .entries
            .entry(path.to_string())
            .or_insert_with(|| FileImpact {
                path: path.to_string(),
                impact,
                raw_statuses: Vec::new(),
                old_path: None,
            });
        entry.impact = entry.impact.merge(impact);
        entry.raw_statuses.push(status.to_string());
        if let Some(old) = old_path {
            entry.old_path = Some(old.to_string());
        }
    }

    fn record_name_status(&mut self, output: &str) {
        for line in output.lines() {
            let mut parts = line.split('\t');
            let Some(status) = parts.next().filter(|s| !s.is_empty()) else {
                continue;
            };
            match status.chars().next() {
                Some('R') | Some('C') => {
                    let (Some(old), Some(new)) = (parts.next(), parts.next()) else {
                        continue;
                    };
                    self.record(new, status, Some(old));
                }
                _ => {
                    let Some(path) = parts.next() else { continue };
                    self.record(path, status, None);
                }
            }
        }
    }
}

fn pathspec_args<'a>(subdirectory: Option<&'a str>, args: &mut Vec<&'a str>) {
    if let Some(dir) = subdirectory {
        if !dir.is_empty() && dir != "." {
            args.push("--");
            args.push(dir);
        }
    }
}

/// Classify changed files for a repository. Missing git, a missing repo, or
/// a failing subprocess all surface as errors; callers must not retry.
pub async fn classify_changes(
    runner: &GitRunner,
    mode: &DiffMode,
    subdirectory: Option<&str>,
) -> Result<ChangeClassification> {
    if !runner.is_work_tree().await {
        return Err(SpecGraphError::Git(format!(
            "Not a git repository: {}",
            runner.repo().display()
        )));
    }

    let mut acc = Accumulator::default();
    let (mode_name, base_ref, target_ref) = match mode {
        DiffMode::WorkingTree { include_untracked } => {
            let mut unstaged = vec!["diff", "--name-status", "-M"];
            pathspec_args(subdirectory, &mut unstaged);
            acc.record_name_status(&runner.run(&unstaged).await?);

            let mut staged = vec!["diff", "--name-status", "-M", "--cached"];
            pathspec_args(subdirectory, &mut staged);
            acc.record_name_status(&runner.run(&staged).await?);

            if *include_untracked {
                let mut untracked = vec!["ls-files", "--others", "--exclude-standard"];
                pathspec_args(subdirectory, &mut untracked);
                for path in runner.run(&untracked).await?.lines() {
                    if !path.trim().is_empty() {
                        acc.record(path.trim(), "A", None);
                    }
                }
            }
            ("working_tree", None, None)
        }
        DiffMode::RefDiff {
            base_ref,
            target_ref,
        } => {
            let range;
            let mut args = vec!["diff", "--name-status", "-M"];
            match target_ref {
                Some(target) => {
                    range = format!("{base_ref}..{target}");
                    args.push(&range);
                }
                None => args.push(base_ref),
            }
            pathspec_args(subdirectory, &mut args);
            acc.record_name_status(&runner.run(&args).await?);
            ("ref_diff", Some(base_ref.clone()), target_ref.clone())
        }
    };

    let files: Vec<FileImpact> = acc.entries.into_values().collect();
    let group = |impact: ImpactKind| -> Vec<String> {
        files
            .iter()
            .filter(|f| f.impact == impact)
            .map(|f| f.path.clone())
            .collect()
    };

    Ok(ChangeClassification {
        mode: mode_name.to_string(),
        base_ref,
        target_ref,
        create: group(ImpactKind::Create),
        modify: group(ImpactKind::Modify),
        delete: group(ImpactKind::Delete),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{run_git_in, PLUMBING_TIMEOUT};
    use std::fs;
    use tempfile::TempDir;

    async fn git(dir: &TempDir, args: &[&str]) {
        run_git_in(Some(dir.path()), args, PLUMBING_TIMEOUT)
            .await
            .unwrap();
    }

    async fn init_repo(dir: &TempDir) -> GitRunner {
        git(dir, &["init", "-q", "-b", "main"]).await;
        git(dir, &["config", "user.email", "dev@example.com"]).await;
        git(dir, &["config", "user.name", "Dev"]).await;
        GitRunner::new(dir.path())
    }

    #[tokio::test]
    async fn working_tree_classification_groups_files() {
        let dir = TempDir::new().unwrap();
        let runner = init_repo(&dir).await;
        fs::write(dir.path().join("kept.txt"), "one\n").unwrap();
        fs::write(dir.path().join("gone.txt"), "bye\n").unwrap();
        git(&dir, &["add", "."]).await;
        git(&dir, &["commit", "-q", "-m", "init"]).await;

        fs::write(dir.path().join("kept.txt"), "one\ntwo\n").unwrap();
        fs::remove_file(dir.path().join("gone.txt")).unwrap();
        fs::write(dir.path().join("fresh.txt"), "new\n").unwrap();

        let result = classify_changes(
            &runner,
            &DiffMode::WorkingTree {
                include_untracked: true,
            },
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.create, vec!["fresh.txt"]);
        assert_eq!(result.modify, vec!["kept.txt"]);
        assert_eq!(result.delete, vec!["gone.txt"]);
        assert_eq!(result.impact_of("gone.txt"), Some(ImpactKind::Delete));
    }

    #[tokio::test]
    async fn ref_diff_against_working_tree() {
        let dir = TempDir::new().unwrap();
        let runner = init_repo(&dir).await;
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        git(&dir, &["add", "."]).await;
        git(&dir, &["commit", "-q", "-m", "init"]).await;
        fs::write(dir.path().join("a.txt"), "a\nb\n").unwrap();

        let result = classify_changes(
            &runner,
            &DiffMode::RefDiff {
                base_ref: "HEAD".to_string(),
                target_ref: None,
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(result.mode, "ref_diff");
        assert_eq!(result.modify, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn staged_delete_beats_unstaged_modify() {
        // The same path appearing under multiple statuses merges with
        // delete > create > modify.
        let impact = ImpactKind::Modify
            .merge(ImpactKind::Delete)
            .merge(ImpactKind::Create);
        assert_eq!(impact, ImpactKind::Delete);
    }

    #[tokio::test]
    async fn renames_preserve_old_path() {
        let dir = TempDir::new().unwrap();
        let runner = init_repo(&dir).await;
        fs::write(dir.path().join("before.txt"), "same content here\n").unwrap();
        git(&dir, &["add", "."]).await;
        git(&dir, &["commit", "-q", "-m", "init"]).await;
        git(&dir, &["mv", "before.txt", "after.txt"]).await;

        let result = classify_changes(
            &runner,
            &DiffMode::WorkingTree {
                include_untracked: false,
            },
            None,
        )
        .await
        .unwrap();
        let entry = result.files.iter().find(|f| f.path == "after.txt").unwrap();
        assert_eq!(entry.old_path.as_deref(), Some("before.txt"));
        assert!(entry.raw_statuses[0].starts_with('R'));
    }

    #[tokio::test]
    async fn subdirectory_scopes_the_diff() {
        let dir = TempDir::new().unwrap();
        let runner = init_repo(&dir).await;
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("root.txt"), "r\n").unwrap();
        fs::write(dir.path().join("sub/inner.txt"), "i\n").unwrap();
        git(&dir, &["add", "."]).await;
        git(&dir, &["commit", "-q", "-m", "init"]).await;
        fs::write(dir.path().join("root.txt"), "r2\n").unwrap();
        fs::write(dir.path().join("sub/inner.txt"), "i2\n").unwrap();

        let result = classify_changes(
            &runner,
            &DiffMode::WorkingTree {
                include_untracked: false,
            },
            Some("sub"),
        )
        .await
        .unwrap();
        assert_eq!(result.modify, vec!["sub/inner.txt"]);
    }

    #[tokio::test]
    async fn missing_repo_is_an_error() {
        let dir = TempDir::new().unwrap();
        let runner = GitRunner::new(dir.path());
        let err = classify_changes(
            &runner,
            &DiffMode::WorkingTree {
                include_untracked: false,
            },
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Not a git repository"));
    }
}
