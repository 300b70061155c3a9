// ABOUTME: Commit-sequence generator: ordered conventional commits with file scopes.

use crate::naming::{commit_message, ChangeType};
use serde::{Deserialize, Serialize};
use specgraph_core::{hints, paths};
use specgraph_git::ChangeClassification;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_COMMITS: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedCommit {
    pub order: usize,
    pub message: String,
    pub files: Vec<String>,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSequence {
    pub commits: Vec<PlannedCommit>,
    pub commit_count: usize,
    pub truncated: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CommitPhase {
    Contracts,
    Source,
    Tests,
    Docs,
}

fn phase_of(path: &str) -> CommitPhase {
    let lower = path.to_lowercase();
    if specgraph_analysis::is_test_file(&lower) {
        return CommitPhase::Tests;
    }
    if hints::is_contract_hint_path(&lower) {
        return CommitPhase::Contracts;
    }
    if lower.ends_with(".md") || lower.starts_with("docs/") {
        return CommitPhase::Docs;
    }
    CommitPhase::Source
}

fn scope_of(path: &str) -> String {
    let segments = paths::segments(path);
    if segments.len() > 1 {
        segments[0].clone()
    } else {
        "root".to_string()
    }
}

/// Plan an ordered commit sequence over the change set: contract and
/// schema files first, then source grouped by top-level scope, then tests,
/// then docs. Deletions land in their scope's commit.
pub fn plan_commit_sequence(
    classification: &ChangeClassification,
    change_type: ChangeType,
    objective: &str,
    ticket: Option<&str>,
    max_commits: usize,
) -> CommitSequence {
    // (phase, scope) -> files
    let mut groups: BTreeMap<(CommitPhase, String), Vec<String>> = BTreeMap::new();
    for file in &classification.files {
        let phase = phase_of(&file.path);
        let scope = scope_of(&file.path);
        groups
            .entry((phase, scope))
            .or_default()
            .push(file.path.clone());
    }

    let mut commits = Vec::new();
    for ((phase, scope), mut files) in groups {
        files.sort();
        let (summary, rationale) = match phase {
            CommitPhase::Contracts => (
                format!("update {scope} contracts for {objective}"),
                "Contract and schema changes land first so consumers can review them in isolation"
                    .to_string(),
            ),
            CommitPhase::Source => (
                format!("{objective} in {scope}"),
                format!("Implementation changes scoped to {scope}"),
            ),
            CommitPhase::Tests => (
                format!("cover {objective} in {scope}"),
                "Tests follow the implementation they exercise".to_string(),
            ),
            CommitPhase::Docs => (
                format!("document {objective}"),
                "Documentation trails the code it describes".to_string(),
            ),
        };
        let change_type = match phase {
            CommitPhase::Tests => ChangeType::Chore,
            CommitPhase::Docs => ChangeType::Chore,
            _ => change_type,
        };
        commits.push(PlannedCommit {
            order: 0,
            message: commit_message(change_type, &scope, &summary, ticket),
            files,
            rationale,
        });
    }

    let truncated = commits.len() > max_commits;
    commits.truncate(max_commits.max(1));
    for (idx, commit) in commits.iter_mut().enumerate() {
        commit.order = idx + 1;
    }

    CommitSequence {
        commit_count: commits.len(),
        commits,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_core::ImpactKind;
    use specgraph_git::FileImpact;

    fn classification(paths: &[&str]) -> ChangeClassification {
        let files: Vec<FileImpact> = paths
            .iter()
            .map(|p| FileImpact {
                path: p.to_string(),
                impact: ImpactKind::Modify,
                raw_statuses: vec!["M".to_string()],
                old_path: None,
            })
            .collect();
        ChangeClassification {
            mode: "working_tree".to_string(),
            base_ref: None,
            target_ref: None,
            create: Vec::new(),
            modify: files.iter().map(|f| f.path.clone()).collect(),
            delete: Vec::new(),
            files,
        }
    }

    #[test]
    fn contracts_commit_first_tests_later() {
        let sequence = plan_commit_sequence(
            &classification(&[
                "src/services/billing.py",
                "api/openapi.yaml",
                "tests/test_billing.py",
            ]),
            ChangeType::Feature,
            "add invoice totals",
            Some("42"),
            DEFAULT_MAX_COMMITS,
        );
        assert_eq!(sequence.commit_count, 3);
        assert!(sequence.commits[0].files[0].contains("openapi"));
        assert!(sequence.commits[0].message.contains("[TICKET-42]"));
        assert!(sequence
            .commits
            .last()
            .unwrap()
            .files[0]
            .contains("tests/"));
        // Orders are 1-based and sequential.
        let orders: Vec<usize> = sequence.commits.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn source_commits_group_by_scope() {
        let sequence = plan_commit_sequence(
            &classification(&[
                "backend/billing.py",
                "backend/users.py",
                "frontend/app.tsx",
            ]),
            ChangeType::Feature,
            "sync invoices",
            None,
            DEFAULT_MAX_COMMITS,
        );
        assert_eq!(sequence.commit_count, 2);
        let scopes: Vec<&str> = sequence
            .commits
            .iter()
            .map(|c| c.files[0].split('/').next().unwrap())
            .collect();
        assert_eq!(scopes, vec!["backend", "frontend"]);
    }

    #[test]
    fn max_commits_truncates() {
        let paths: Vec<String> = (0..8).map(|i| format!("area{i}/f.py")).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let sequence = plan_commit_sequence(
            &classification(&refs),
            ChangeType::Refactor,
            "restructure modules",
            None,
            3,
        );
        assert_eq!(sequence.commit_count, 3);
        assert!(sequence.truncated);
    }

    #[test]
    fn messages_follow_conventional_commits() {
        let sequence = plan_commit_sequence(
            &classification(&["core/engine.py"]),
            ChangeType::Fix,
            "guard nil pointer",
            Some("OPS-7"),
            DEFAULT_MAX_COMMITS,
        );
        let message = &sequence.commits[0].message;
        assert!(message.starts_with("fix(core): "), "got {message}");
        assert!(message.ends_with("[OPS-7]"));
    }
}
