// ABOUTME: Weighted additive risk aggregation over change, breaking, type, and test signals.
// ABOUTME: Sub-signal failure never fails the aggregate; it adds a conservative contribution.

use crate::breaking::BreakingChangeReport;
use crate::findings::count_by_severity;
use crate::test_impact::{RegressionScope, TestImpactReport};
use crate::typeflow::TypeSafetyReport;
use serde::{Deserialize, Serialize};
use specgraph_core::envelope::SignalStatus;
use specgraph_core::{RiskLevel, Severity};
use specgraph_git::ChangeClassification;

/// Score thresholds for the aggregate level.
const CRITICAL_THRESHOLD: u32 = 24;
const HIGH_THRESHOLD: u32 = 15;
const MEDIUM_THRESHOLD: u32 = 8;

/// Conservative contribution when a sub-signal failed outright.
const FAILED_SIGNAL_SCORE: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub weight: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub confidence: Confidence,
    pub risk_factors: Vec<RiskFactor>,
    pub warnings: Vec<String>,
}

/// Signals feeding the aggregate. `None` marks a failed sub-signal.
#[derive(Default)]
pub struct RiskInputs<'a> {
    pub classification: Option<&'a ChangeClassification>,
    pub breaking: Option<&'a BreakingChangeReport>,
    pub type_safety: Option<&'a TypeSafetyReport>,
    pub test_impact: Option<&'a TestImpactReport>,
    pub cycle_count: Option<usize>,
}

pub fn level_for_score(score: u32) -> RiskLevel {
    if score >= CRITICAL_THRESHOLD {
        RiskLevel::Critical
    } else if score >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Combine sub-signal outputs into a weighted score, level, confidence,
/// and factor list. Never fails: missing signals add a conservative score
/// and a warning.
pub fn aggregate_risk(inputs: &RiskInputs<'_>, signal_status: &SignalStatus) -> RiskReport {
    let mut score = 0u32;
    let mut factors: Vec<RiskFactor> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let mut push = |factors: &mut Vec<RiskFactor>,
                    score: &mut u32,
                    name: &str,
                    weight: u32,
                    severity: Option<Severity>,
                    detail: String| {
        *score += weight;
        factors.push(RiskFactor {
            name: name.to_string(),
            weight,
            severity,
            detail,
        });
    };

    match inputs.classification {
        Some(classification) => {
            let total = classification.total_changed();
            if total >= 25 {
                push(
                    &mut factors,
                    &mut score,
                    "large_change_set",
                    10,
                    Some(Severity::High),
                    format!("{total} files changed"),
                );
            } else if total >= 10 {
                push(
                    &mut factors,
                    &mut score,
                    "moderate_change_set",
                    5,
                    Some(Severity::Medium),
                    format!("{total} files changed"),
                );
            } else if total > 0 {
                push(
                    &mut factors,
                    &mut score,
                    "small_change_set",
                    2,
                    Some(Severity::Low),
                    format!("{total} files changed"),
                );
            }
            if !classification.delete.is_empty() {
                push(
                    &mut factors,
                    &mut score,
                    "file_deletions_present",
                    3,
                    Some(Severity::Medium),
                    format!("{} files deleted", classification.delete.len()),
                );
            }
        }
        None => {
            score += FAILED_SIGNAL_SCORE;
            warnings.push("change classification unavailable; assuming moderate risk".to_string());
        }
    }

    match inputs.breaking {
        Some(breaking) => {
            let high = count_by_severity(&breaking.findings, Severity::High)
                + count_by_severity(&breaking.findings, Severity::Critical);
            let medium = count_by_severity(&breaking.findings, Severity::Medium);
            if high > 0 {
                push(
                    &mut factors,
                    &mut score,
                    "breaking_change_risk",
                    6,
                    Some(Severity::High),
                    format!("{high} high-severity contract findings"),
                );
            } else if medium > 0 {
                push(
                    &mut factors,
                    &mut score,
                    "breaking_change_risk",
                    3,
                    Some(Severity::Medium),
                    format!("{medium} medium-severity contract findings"),
                );
            }
        }
        None => {
            score += FAILED_SIGNAL_SCORE;
            warnings.push("breaking-change signal unavailable; assuming moderate risk".to_string());
        }
    }

    match inputs.type_safety {
        Some(report) => {
            let high = count_by_severity(&report.findings, Severity::High);
            let medium = count_by_severity(&report.findings, Severity::Medium);
            if high > 0 {
                push(
                    &mut factors,
                    &mut score,
                    "type_safety_regressions",
                    4,
                    Some(Severity::High),
                    format!("{high} high-severity type findings"),
                );
            } else if medium > 0 {
                push(
                    &mut factors,
                    &mut score,
                    "type_safety_regressions",
                    2,
                    Some(Severity::Medium),
                    format!("{medium} medium-severity type findings"),
                );
            }
        }
        None => {
            score += FAILED_SIGNAL_SCORE;
            warnings.push("type-safety signal unavailable; assuming moderate risk".to_string());
        }
    }

    match inputs.test_impact {
        Some(report) => {
            let (weight, severity) = match report.regression_scope {
                RegressionScope::FullSuite => (6, Severity::High),
                RegressionScope::BroadRegression => (4, Severity::Medium),
                RegressionScope::TargetedRegression => (2, Severity::Low),
                RegressionScope::Smoke => (0, Severity::Low),
            };
            if weight > 0 {
                push(
                    &mut factors,
                    &mut score,
                    "regression_scope_size",
                    weight,
                    Some(severity),
                    format!("regression scope {}", report.regression_scope.as_str()),
                );
            }
            let gaps = report.coverage_gaps.len();
            if gaps >= 5 {
                push(
                    &mut factors,
                    &mut score,
                    "test_coverage_gaps",
                    4,
                    Some(Severity::High),
                    format!("{gaps} changed files with no related tests"),
                );
            } else if gaps > 0 {
                push(
                    &mut factors,
                    &mut score,
                    "test_coverage_gaps",
                    2,
                    Some(Severity::Medium),
                    format!("{gaps} changed files with no related tests"),
                );
            }
        }
        None => {
            score += FAILED_SIGNAL_SCORE;
            warnings.push("test-impact signal unavailable; assuming moderate risk".to_string());
        }
    }

    if let Some(cycles) = inputs.cycle_count {
        if cycles > 0 {
            push(
                &mut factors,
                &mut score,
                "cyclic_dependency_hotspot",
                3,
                Some(Severity::Medium),
                format!("{cycles} import cycles in scope"),
            );
        }
    }

    let confidence = match signal_status.success_count() {
        4.. => Confidence::High,
        2 | 3 => Confidence::Medium,
        _ => Confidence::Low,
    };

    RiskReport {
        risk_score: score,
        risk_level: level_for_score(score),
        confidence,
        risk_factors: factors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_core::ImpactKind;
    use specgraph_git::FileImpact;

    fn classification(modified: usize, deleted: usize) -> ChangeClassification {
        let mut files = Vec::new();
        let mut modify = Vec::new();
        let mut delete = Vec::new();
        for i in 0..modified {
            let path = format!("src/m{i}.py");
            files.push(FileImpact {
                path: path.clone(),
                impact: ImpactKind::Modify,
                raw_statuses: vec!["M".to_string()],
                old_path: None,
            });
            modify.push(path);
        }
        for i in 0..deleted {
            let path = format!("src/d{i}.py");
            files.push(FileImpact {
                path: path.clone(),
                impact: ImpactKind::Delete,
                raw_statuses: vec!["D".to_string()],
                old_path: None,
            });
            delete.push(path);
        }
        ChangeClassification {
            mode: "working_tree".to_string(),
            base_ref: None,
            target_ref: None,
            create: Vec::new(),
            modify,
            delete,
            files,
        }
    }

    fn all_signals_ok() -> SignalStatus {
        let mut status = SignalStatus::new();
        status.record_success("change_classification");
        status.record_success("breaking_changes");
        status.record_success("type_safety");
        status.record_success("test_impact");
        status
    }

    #[test]
    fn seeded_change_set_scores_medium() {
        // 12 modified + 1 deleted, no breaking or type findings, targeted
        // regression with one coverage gap.
        let classification = classification(12, 1);
        let breaking = BreakingChangeReport {
            base_ref: "HEAD".into(),
            target_ref: None,
            findings: Vec::new(),
            finding_count: 0,
            truncated: false,
            risk_level: RiskLevel::Low,
            analyzed_file_count: 13,
        };
        let type_safety = TypeSafetyReport {
            base_ref: "HEAD".into(),
            target_ref: None,
            findings: Vec::new(),
            finding_count: 0,
            analyzed_file_count: 0,
        };
        let test_impact = TestImpactReport {
            test_file_count: 4,
            directly_changed_tests: Vec::new(),
            downstream_impacted_tests: Vec::new(),
            related_tests: Default::default(),
            impacted_tests: vec!["tests/test_m1.py".to_string()],
            coverage_gaps: vec!["src/m2.py".to_string()],
            regression_scope: RegressionScope::TargetedRegression,
        };

        let report = aggregate_risk(
            &RiskInputs {
                classification: Some(&classification),
                breaking: Some(&breaking),
                type_safety: Some(&type_safety),
                test_impact: Some(&test_impact),
                cycle_count: Some(0),
            },
            &all_signals_ok(),
        );

        assert!(
            (8..=14).contains(&report.risk_score),
            "score {} out of seeded range",
            report.risk_score
        );
        assert_eq!(report.risk_level, RiskLevel::Medium);
        assert_eq!(report.confidence, Confidence::High);
        let names: Vec<&str> = report.risk_factors.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"moderate_change_set"));
        assert!(names.contains(&"file_deletions_present"));
        assert!(names.contains(&"regression_scope_size"));
        assert!(names.contains(&"test_coverage_gaps"));
    }

    #[test]
    fn level_is_monotone_in_score() {
        // RiskLevel orders most severe first, so a rising score must never
        // produce a less severe (Ord-greater) level.
        let mut previous = level_for_score(0);
        for score in 1..40 {
            let level = level_for_score(score);
            assert!(level <= previous, "level regressed at score {score}");
            previous = level;
        }
        assert_eq!(level_for_score(7), RiskLevel::Low);
        assert_eq!(level_for_score(8), RiskLevel::Medium);
        assert_eq!(level_for_score(15), RiskLevel::High);
        assert_eq!(level_for_score(24), RiskLevel::Critical);
    }

    #[test]
    fn failed_signals_degrade_confidence_not_success() {
        let mut status = SignalStatus::new();
        status.record_success("change_classification");
        status.record_error("breaking_changes", "git show failed");
        status.record_error("type_safety", "git show failed");
        status.record_error("test_impact", "scan failed");

        let classification = classification(2, 0);
        let report = aggregate_risk(
            &RiskInputs {
                classification: Some(&classification),
                ..Default::default()
            },
            &status,
        );
        assert_eq!(report.confidence, Confidence::Low);
        assert_eq!(report.warnings.len(), 3);
        // Conservative contributions from the three failed signals.
        assert!(report.risk_score >= 9);
    }

    #[test]
    fn cycles_add_a_hotspot_factor() {
        let classification = classification(1, 0);
        let report = aggregate_risk(
            &RiskInputs {
                classification: Some(&classification),
                cycle_count: Some(1),
                ..Default::default()
            },
            &all_signals_ok(),
        );
        assert!(report
            .risk_factors
            .iter()
            .any(|f| f.name == "cyclic_dependency_hotspot"));
    }
}
