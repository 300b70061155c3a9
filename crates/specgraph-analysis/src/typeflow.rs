// ABOUTME: Type-system change analyzer: diffs typed symbols and signatures across revisions.

use crate::findings::{dedup_and_rank, Finding};
use crate::kernel::{language_for_path, load_revision_pair};
use serde::{Deserialize, Serialize};
use specgraph_core::{ImpactKind, Result, Severity};
use specgraph_git::{ChangeClassification, GitRunner};
use specgraph_parser::{analyze_types, TypeAnalysis};
use std::collections::BTreeMap;

/// Explicit-type ratio drop beyond this is a regression finding.
const RATIO_DROP_THRESHOLD: f64 = 0.15;
/// Cast-count increase beyond this is a finding.
const CAST_INCREASE_THRESHOLD: usize = 2;
/// Unsafe-usage delta at or above this escalates to high severity.
const UNSAFE_DELTA_HIGH: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSafetyReport {
    pub base_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<String>,
    pub findings: Vec<Finding>,
    pub finding_count: usize,
    pub analyzed_file_count: usize,
}

fn finding(
    path: &str,
    category_change: (&str, &str),
    severity: Severity,
    symbol: Option<String>,
    old_signature: Option<String>,
    new_signature: Option<String>,
    description: String,
) -> Finding {
    Finding {
        category: category_change.0.to_string(),
        severity,
        file_path: path.to_string(),
        change_type: category_change.1.to_string(),
        symbol,
        old_signature,
        new_signature,
        description,
    }
}

fn compare_analyses(path: &str, before: &TypeAnalysis, after: &TypeAnalysis) -> Vec<Finding> {
    let mut findings = Vec::new();

    let after_defs: BTreeMap<&str, &str> = after
        .type_definitions
        .iter()
        .map(|d| (d.name.as_str(), d.kind.as_str()))
        .collect();
    for def in &before.type_definitions {
        if !after_defs.contains_key(def.name.as_str()) {
            findings.push(finding(
                path,
                ("type_safety", "type_definition_removed"),
                Severity::High,
                Some(def.name.clone()),
                Some(def.kind.clone()),
                None,
                format!("Type definition `{}` ({}) removed from {path}", def.name, def.kind),
            ));
        }
    }

    let before_sigs: BTreeMap<&str, String> = before
        .function_signatures
        .iter()
        .map(|s| (s.name.as_str(), s.render()))
        .collect();
    let after_sigs: BTreeMap<&str, String> = after
        .function_signatures
        .iter()
        .map(|s| (s.name.as_str(), s.render()))
        .collect();
    for (name, old_sig) in &before_sigs {
        match after_sigs.get(name) {
            None => findings.push(finding(
                path,
                ("type_safety", "typed_function_removed"),
                Severity::High,
                Some((*name).to_string()),
                Some(old_sig.clone()),
                None,
                format!("Typed function `{name}` removed from {path}"),
            )),
            Some(new_sig) if new_sig != old_sig => findings.push(finding(
                path,
                ("type_safety", "typed_function_signature_changed"),
                Severity::High,
                Some((*name).to_string()),
                Some(old_sig.clone()),
                Some(new_sig.clone()),
                format!("Typed function `{name}` changed signature in {path}"),
            )),
            _ => {}
        }
    }

    let before_symbols: BTreeMap<&str, &str> = before
        .typed_symbols
        .iter()
        .map(|s| (s.name.as_str(), s.symbol_type.as_str()))
        .collect();
    let after_symbols: BTreeMap<&str, &str> = after
        .typed_symbols
        .iter()
        .map(|s| (s.name.as_str(), s.symbol_type.as_str()))
        .collect();
    for (name, old_type) in &before_symbols {
        match after_symbols.get(name) {
            None => findings.push(finding(
                path,
                ("type_safety", "typed_symbol_removed"),
                Severity::Medium,
                Some((*name).to_string()),
                Some((*old_type).to_string()),
                None,
                format!("Typed symbol `{name}` removed from {path}"),
            )),
            Some(new_type) if new_type != old_type => findings.push(finding(
                path,
                ("type_safety", "typed_symbol_type_changed"),
                Severity::Medium,
                Some((*name).to_string()),
                Some((*old_type).to_string()),
                Some((*new_type).to_string()),
                format!("Typed symbol `{name}` changed type in {path}"),
            )),
            _ => {}
        }
    }

    let ratio_drop = before.summary.explicit_type_ratio - after.summary.explicit_type_ratio;
    if ratio_drop > RATIO_DROP_THRESHOLD {
        findings.push(finding(
            path,
            ("type_safety", "explicit_typing_regression"),
            Severity::Medium,
            None,
            Some(format!("{:.2}", before.summary.explicit_type_ratio)),
            Some(format!("{:.2}", after.summary.explicit_type_ratio)),
            format!("Explicit-type ratio dropped by {ratio_drop:.2} in {path}"),
        ));
    }

    if after.cast_count > before.cast_count + CAST_INCREASE_THRESHOLD {
        findings.push(finding(
            path,
            ("type_safety", "cast_usage_increase"),
            Severity::Medium,
            None,
            Some(before.cast_count.to_string()),
            Some(after.cast_count.to_string()),
            format!(
                "Cast usage rose from {} to {} in {path}",
                before.cast_count, after.cast_count
            ),
        ));
    }

    let unsafe_before = before.summary.unsafe_type_usage_count;
    let unsafe_after = after.summary.unsafe_type_usage_count;
    if unsafe_after > unsafe_before {
        let delta = unsafe_after - unsafe_before;
        let severity = if delta >= UNSAFE_DELTA_HIGH {
            Severity::High
        } else {
            Severity::Medium
        };
        findings.push(finding(
            path,
            ("type_safety", "unsafe_type_usage_increase"),
            severity,
            None,
            Some(unsafe_before.to_string()),
            Some(unsafe_after.to_string()),
            format!("Unsafe type usage rose from {unsafe_before} to {unsafe_after} in {path}"),
        ));
    }

    findings
}

/// Diff typed structure for every modified statically-typed file.
pub async fn analyze_type_changes(
    runner: &GitRunner,
    classification: &ChangeClassification,
    base_ref: &str,
    target_ref: Option<&str>,
) -> Result<TypeSafetyReport> {
    let mut findings = Vec::new();
    let mut analyzed = 0usize;

    for file in &classification.files {
        if file.impact != ImpactKind::Modify {
            continue;
        }
        let language = language_for_path(&file.path);
        if !language.is_statically_typed() {
            continue;
        }
        let pair = load_revision_pair(
            runner,
            base_ref,
            target_ref,
            &file.path,
            file.old_path.as_deref(),
        )
        .await;
        let (Some(before_content), Some(after_content)) = (pair.before, pair.after) else {
            continue;
        };
        let (Ok(before), Ok(after)) = (
            analyze_types(&before_content, language),
            analyze_types(&after_content, language),
        ) else {
            continue;
        };
        analyzed += 1;
        findings.extend(compare_analyses(&file.path, &before, &after));
    }

    let ranked = dedup_and_rank(findings);
    Ok(TypeSafetyReport {
        base_ref: base_ref.to_string(),
        target_ref: target_ref.map(|s| s.to_string()),
        finding_count: ranked.len(),
        findings: ranked,
        analyzed_file_count: analyzed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_core::Language;

    fn analyses(before: &str, after: &str) -> (TypeAnalysis, TypeAnalysis) {
        (
            analyze_types(before, Language::TypeScript).unwrap(),
            analyze_types(after, Language::TypeScript).unwrap(),
        )
    }

    #[test]
    fn removed_interface_is_high() {
        let (before, after) = analyses("export interface User { id: string }\n", "\n");
        let findings = compare_analyses("a.ts", &before, &after);
        assert!(findings
            .iter()
            .any(|f| f.change_type == "type_definition_removed" && f.severity == Severity::High));
    }

    #[test]
    fn changed_signature_is_high() {
        let (before, after) = analyses(
            "export function f(a: string): number { return 1 }\n",
            "export function f(a: string, b: string): number { return 1 }\n",
        );
        let findings = compare_analyses("a.ts", &before, &after);
        let sig_change = findings
            .iter()
            .find(|f| f.change_type == "typed_function_signature_changed")
            .unwrap();
        assert_eq!(sig_change.severity, Severity::High);
        assert!(sig_change.old_signature.as_deref().unwrap().contains("a: string"));
    }

    #[test]
    fn ratio_drop_triggers_regression() {
        let before = concat!(
            "const a: number = 1;\n",
            "const b: number = 2;\n",
            "const c: number = 3;\n",
        );
        let after = concat!(
            "const a = 1;\n",
            "const b = 2;\n",
            "const c: number = 3;\n",
        );
        let (before, after) = analyses(before, after);
        let findings = compare_analyses("a.ts", &before, &after);
        assert!(findings
            .iter()
            .any(|f| f.change_type == "explicit_typing_regression"));
    }

    #[test]
    fn unsafe_delta_escalates_to_high() {
        let (before, after) = analyses(
            "const a: string = 's';\n",
            "const a: any = 's';\nconst b: any = 1;\n",
        );
        let findings = compare_analyses("a.ts", &before, &after);
        let unsafe_finding = findings
            .iter()
            .find(|f| f.change_type == "unsafe_type_usage_increase")
            .unwrap();
        assert_eq!(unsafe_finding.severity, Severity::High);
    }

    #[test]
    fn cast_increase_needs_margin() {
        let (before, after) = analyses(
            "const a = x as string;\n",
            "const a = x as string;\nconst b = y as string;\nconst c = z as string;\n",
        );
        // Delta of 2 does not exceed the threshold of "more than 2".
        let findings = compare_analyses("a.ts", &before, &after);
        assert!(!findings.iter().any(|f| f.change_type == "cast_usage_increase"));
    }
}
