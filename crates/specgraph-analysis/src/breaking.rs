// ABOUTME: Breaking-change detector: diffs contract surfaces across revisions.
// ABOUTME: Path-hint detection is purely lexical; no language semantics involved.

use crate::findings::{count_by_severity, dedup_and_rank, Finding};
use crate::kernel::{
    extract_contract_surface, language_for_path, load_revision_pair, ContractSurface,
};
use serde::{Deserialize, Serialize};
use specgraph_core::{hints, Result, RiskLevel, Severity};
use specgraph_git::{ChangeClassification, GitRunner};
use tracing::debug;

pub const DEFAULT_MAX_FINDINGS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingChangeReport {
    pub base_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<String>,
    pub findings: Vec<Finding>,
    pub finding_count: usize,
    pub truncated: bool,
    pub risk_level: RiskLevel,
    pub analyzed_file_count: usize,
}

fn removal_finding(path: &str, key: &str, surface: &ContractSurface) -> Finding {
    let entry = &surface[key];
    let severity = if entry.kind.is_high_value() {
        Severity::High
    } else {
        Severity::Medium
    };
    Finding {
        category: "api_contract_removal".to_string(),
        severity,
        file_path: path.to_string(),
        change_type: "symbol_removed".to_string(),
        symbol: Some(entry.name.clone()),
        old_signature: entry.signature.clone(),
        new_signature: None,
        description: format!("{} `{}` was removed from {}", entry.kind, entry.name, path),
    }
}

fn diff_surfaces(path: &str, before: &ContractSurface, after: &ContractSurface) -> Vec<Finding> {
    let mut findings = Vec::new();

    for key in before.keys() {
        if !after.contains_key(key) {
            findings.push(removal_finding(path, key, before));
        }
    }

    for (key, old_entry) in before {
        let Some(new_entry) = after.get(key) else {
            continue;
        };
        if old_entry.signature != new_entry.signature {
            findings.push(Finding {
                category: "api_contract_signature_change".to_string(),
                severity: Severity::Medium,
                file_path: path.to_string(),
                change_type: "signature_changed".to_string(),
                symbol: Some(old_entry.name.clone()),
                old_signature: old_entry.signature.clone(),
                new_signature: new_entry.signature.clone(),
                description: format!(
                    "{} `{}` changed signature in {}",
                    old_entry.kind, old_entry.name, path
                ),
            });
        }
    }
    findings
}

fn fold_risk_level(findings: &[Finding]) -> RiskLevel {
    let critical = count_by_severity(findings, Severity::Critical);
    let high = count_by_severity(findings, Severity::High);
    let medium = count_by_severity(findings, Severity::Medium);
    if critical > 0 || high >= 5 {
        RiskLevel::Critical
    } else if high > 0 {
        RiskLevel::High
    } else if medium > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Detect breaking contract changes for every modified or deleted file in
/// the classification. Old content loads via `git show {base_ref}:{path}`;
/// new content from the working tree or `target_ref`.
pub async fn detect_breaking_changes(
    runner: &GitRunner,
    classification: &ChangeClassification,
    base_ref: &str,
    target_ref: Option<&str>,
    max_findings: usize,
) -> Result<BreakingChangeReport> {
    let mut findings = Vec::new();
    let mut analyzed = 0usize;

    for file in &classification.files {
        let path = file.path.as_str();
        let language = language_for_path(path);
        match file.impact {
            specgraph_core::ImpactKind::Modify => {
                analyzed += 1;
                let pair = load_revision_pair(
                    runner,
                    base_ref,
                    target_ref,
                    path,
                    file.old_path.as_deref(),
                )
                .await;
                let before =
                    extract_contract_surface(pair.before.as_deref().unwrap_or(""), language);
                let after =
                    extract_contract_surface(pair.after.as_deref().unwrap_or(""), language);
                findings.extend(diff_surfaces(path, &before, &after));

                if file.old_path.is_some()
                    && hints::is_contract_hint_path(path)
                {
                    findings.push(Finding {
                        category: "api_contract_path_change".to_string(),
                        severity: Severity::Medium,
                        file_path: path.to_string(),
                        change_type: "path_change".to_string(),
                        symbol: None,
                        old_signature: file.old_path.clone(),
                        new_signature: Some(path.to_string()),
                        description: format!(
                            "Contract file moved from {} to {}",
                            file.old_path.as_deref().unwrap_or("?"),
                            path
                        ),
                    });
                }
            }
            specgraph_core::ImpactKind::Delete => {
                if !hints::is_contract_hint_path(path) {
                    continue;
                }
                analyzed += 1;
                let pair = load_revision_pair(
                    runner,
                    base_ref,
                    target_ref,
                    path,
                    file.old_path.as_deref(),
                )
                .await;
                let before =
                    extract_contract_surface(pair.before.as_deref().unwrap_or(""), language);
                if before.is_empty() {
                    findings.push(Finding {
                        category: "deleted_api_contract_file".to_string(),
                        severity: Severity::High,
                        file_path: path.to_string(),
                        change_type: "file_deleted".to_string(),
                        symbol: None,
                        old_signature: None,
                        new_signature: None,
                        description: format!(
                            "Contract-hint file {path} was deleted with no parseable surface"
                        ),
                    });
                } else {
                    for entry in before.values() {
                        findings.push(Finding {
                            category: "api_contract_removal".to_string(),
                            severity: Severity::High,
                            file_path: path.to_string(),
                            change_type: "symbol_removed".to_string(),
                            symbol: Some(entry.name.clone()),
                            old_signature: entry.signature.clone(),
                            new_signature: None,
                            description: format!(
                                "{} `{}` was lost when {} was deleted",
                                entry.kind, entry.name, path
                            ),
                        });
                    }
                }
            }
            specgraph_core::ImpactKind::Create => {}
        }
    }

    let mut ranked = dedup_and_rank(findings);
    let truncated = ranked.len() > max_findings;
    ranked.truncate(max_findings);
    debug!(
        analyzed,
        findings = ranked.len(),
        truncated,
        "breaking-change analysis complete"
    );

    Ok(BreakingChangeReport {
        base_ref: base_ref.to_string(),
        target_ref: target_ref.map(|s| s.to_string()),
        finding_count: ranked.len(),
        risk_level: fold_risk_level(&ranked),
        findings: ranked,
        truncated,
        analyzed_file_count: analyzed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::extract_contract_surface;
    use specgraph_core::Language;

    #[test]
    fn signature_change_is_a_medium_finding() {
        let before = extract_contract_surface(
            "export function getUser(id: string): User { }\n",
            Language::TypeScript,
        );
        let after = extract_contract_surface(
            "export function getUser(id: string, tenant: string): User { }\n",
            Language::TypeScript,
        );
        let findings = diff_surfaces("src/users.ts", &before, &after);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.category, "api_contract_signature_change");
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.old_signature.as_deref(), Some("(id: string)"));
        assert_eq!(
            finding.new_signature.as_deref(),
            Some("(id: string, tenant: string)")
        );
    }

    #[test]
    fn removal_severity_tracks_contract_kind() {
        let before = extract_contract_surface(
            "export function helper(): void {}\nexport interface User { id: string }\n",
            Language::TypeScript,
        );
        let after = ContractSurface::new();
        let findings = diff_surfaces("src/api.ts", &before, &after);
        let by_symbol = |name: &str| {
            findings
                .iter()
                .find(|f| f.symbol.as_deref() == Some(name))
                .unwrap()
        };
        assert_eq!(by_symbol("helper").severity, Severity::Medium);
        assert_eq!(by_symbol("User").severity, Severity::High);
    }

    #[test]
    fn removal_symbols_exist_only_in_before() {
        let before = extract_contract_surface(
            "export function gone(): void {}\nexport function kept(): void {}\n",
            Language::TypeScript,
        );
        let after =
            extract_contract_surface("export function kept(): void {}\n", Language::TypeScript);
        let findings = diff_surfaces("a.ts", &before, &after);
        for finding in findings
            .iter()
            .filter(|f| f.category == "api_contract_removal")
        {
            let symbol = finding.symbol.as_deref().unwrap();
            assert!(before.values().any(|e| e.name == symbol));
            assert!(!after.values().any(|e| e.name == symbol));
        }
    }

    #[test]
    fn risk_level_folds_counts() {
        let high = Finding {
            category: "api_contract_removal".into(),
            severity: Severity::High,
            file_path: "a.ts".into(),
            change_type: "symbol_removed".into(),
            symbol: Some("x".into()),
            old_signature: None,
            new_signature: None,
            description: String::new(),
        };
        assert_eq!(fold_risk_level(&[high.clone()]), RiskLevel::High);
        let five_high: Vec<Finding> = (0..5)
            .map(|i| {
                let mut f = high.clone();
                f.symbol = Some(format!("s{i}"));
                f
            })
            .collect();
        assert_eq!(fold_risk_level(&five_high), RiskLevel::Critical);
        assert_eq!(fold_risk_level(&[]), RiskLevel::Low);
    }
}
