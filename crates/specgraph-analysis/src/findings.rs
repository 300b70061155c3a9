use serde::{Deserialize, Serialize};
use specgraph_core::Severity;
use std::collections::HashSet;

/// One breaking-change or type-safety finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    pub severity: Severity,
    pub file_path: String,
    pub change_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_signature: Option<String>,
    pub description: String,
}

/// Deduplicate by `(file_path, category, change_type, symbol)` and order
/// most severe first, then by file and symbol for stable output.
pub fn dedup_and_rank(mut findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen: HashSet<(String, String, String, Option<String>)> = HashSet::new();
    findings.retain(|f| {
        seen.insert((
            f.file_path.clone(),
            f.category.clone(),
            f.change_type.clone(),
            f.symbol.clone(),
        ))
    });
    findings.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    findings
}

pub fn count_by_severity(findings: &[Finding], severity: Severity) -> usize {
    findings.iter().filter(|f| f.severity == severity).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(file: &str, category: &str, severity: Severity, symbol: &str) -> Finding {
        Finding {
            category: category.to_string(),
            severity,
            file_path: file.to_string(),
            change_type: "removed".to_string(),
            symbol: Some(symbol.to_string()),
            old_signature: None,
            new_signature: None,
            description: String::new(),
        }
    }

    #[test]
    fn duplicates_collapse() {
        let findings = vec![
            finding("a.ts", "api_contract_removal", Severity::High, "getUser"),
            finding("a.ts", "api_contract_removal", Severity::High, "getUser"),
        ];
        assert_eq!(dedup_and_rank(findings).len(), 1);
    }

    #[test]
    fn ranked_most_severe_first() {
        let findings = vec![
            finding("z.ts", "x", Severity::Low, "a"),
            finding("a.ts", "x", Severity::Critical, "b"),
            finding("m.ts", "x", Severity::Medium, "c"),
        ];
        let ranked = dedup_and_rank(findings);
        assert_eq!(ranked[0].severity, Severity::Critical);
        assert_eq!(ranked[2].severity, Severity::Low);
    }
}
